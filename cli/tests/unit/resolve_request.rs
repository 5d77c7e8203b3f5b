//! Tests for turning `workload delete` flags into a teardown request.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use skiff_cli::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use skiff_cli::commands::workload::{DeleteArgs, resolve_request};
use skiff_cli::domain::{TargetError, TeardownScope};
use skiff_cli::infra::config::YamlConfigStore;
use skiff_common::WorkloadKind;

use crate::helpers::{CallLog, MemoryStore, catalog, service};

fn context(config_yaml: Option<&str>) -> (tempfile::TempDir, AppContext) {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("config.yaml");
    if let Some(yaml) = config_yaml {
        std::fs::write(&path, yaml).expect("write config");
    }
    let flags = AppFlags {
        output: OutputFlags {
            no_color: true,
            quiet: true,
            json: false,
        },
        behaviour: BehaviourFlags { yes: true },
    };
    let app = AppContext::with_config_store(&flags, &YamlConfigStore::with_path(path))
        .expect("context");
    (dir, app)
}

fn args() -> DeleteArgs {
    DeleteArgs {
        name: None,
        env: None,
        app: None,
        default_cluster: false,
        yes: true,
    }
}

fn store() -> MemoryStore {
    MemoryStore::new(
        &CallLog::default(),
        catalog(&["test"], vec![service("backend", &["test"])]),
    )
}

#[tokio::test]
async fn default_flag_targets_default_cluster_task() {
    let (_dir, app) = context(None);
    let args = DeleteArgs {
        name: Some("hide-snacks".into()),
        default_cluster: true,
        ..args()
    };

    let req = resolve_request(&app, &store(), &args).await.expect("resolve");

    assert_eq!(req.scope, TeardownScope::DefaultCluster);
    assert_eq!(req.kind, WorkloadKind::OneOffTask);
    assert!(req.app.is_none());
}

#[tokio::test]
async fn default_flag_requires_a_name() {
    let (_dir, app) = context(None);
    let args = DeleteArgs {
        default_cluster: true,
        ..args()
    };

    let err = resolve_request(&app, &store(), &args).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TargetError>(),
        Some(TargetError::MissingWorkload)
    ));
}

#[tokio::test]
async fn tracked_service_keeps_its_kind_and_targets_all_deployments() {
    let (_dir, app) = context(None);
    let args = DeleteArgs {
        name: Some("backend".into()),
        app: Some("app".into()),
        ..args()
    };

    let req = resolve_request(&app, &store(), &args).await.expect("resolve");

    assert_eq!(req.kind, WorkloadKind::Service);
    assert_eq!(req.scope, TeardownScope::AllDeployed);
    assert_eq!(req.app.as_deref(), Some("app"));
}

#[tokio::test]
async fn untracked_workload_is_a_one_off_task_in_named_environment() {
    let (_dir, app) = context(None);
    let args = DeleteArgs {
        name: Some("hide-snacks".into()),
        app: Some("app".into()),
        env: Some("test".into()),
        ..args()
    };

    let req = resolve_request(&app, &store(), &args).await.expect("resolve");

    assert_eq!(req.kind, WorkloadKind::OneOffTask);
    assert_eq!(req.scope, TeardownScope::Environment("test".into()));
}

#[tokio::test]
async fn config_default_app_fills_missing_flag() {
    let (_dir, app) = context(Some("default_app: app\n"));
    let args = DeleteArgs {
        name: Some("backend".into()),
        ..args()
    };

    let req = resolve_request(&app, &store(), &args).await.expect("resolve");
    assert_eq!(req.app.as_deref(), Some("app"));
}

#[tokio::test]
async fn missing_application_without_prompt_is_an_error() {
    let (_dir, app) = context(None);
    let args = DeleteArgs {
        name: Some("backend".into()),
        ..args()
    };

    let err = resolve_request(&app, &store(), &args).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TargetError>(),
        Some(TargetError::MissingApplication)
    ));
}

#[tokio::test]
async fn application_without_workloads_cannot_pick_one() {
    let (_dir, app) = context(None);
    let empty = MemoryStore::new(&CallLog::default(), catalog(&["test"], vec![]));
    let args = DeleteArgs {
        app: Some("app".into()),
        ..args()
    };

    let err = resolve_request(&app, &empty, &args).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TargetError>(),
        Some(TargetError::NoWorkloads(a)) if a == "app"
    ));
}

//! Tests for the workload listing service.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use skiff_cli::application::services::workload_list::list_workloads;
use skiff_cli::domain::CatalogError;
use skiff_common::Application;

use crate::helpers::{CallLog, MemoryStore, catalog, service};

fn store() -> MemoryStore {
    let mut file = catalog(
        &["test"],
        vec![service("web", &["test"]), service("api", &[])],
    );
    file.applications.push(Application {
        name: "billing".into(),
        ..Application::default()
    });
    let mut ledger = service("ledger", &[]);
    ledger.app = "billing".into();
    file.workloads.push(ledger);
    MemoryStore::new(&CallLog::default(), file)
}

#[tokio::test]
async fn lists_every_application_ordered_by_app_then_name() {
    let workloads = list_workloads(&store(), None).await.expect("list");
    let names: Vec<_> = workloads
        .iter()
        .map(|w| format!("{}/{}", w.app, w.name))
        .collect();
    assert_eq!(names, ["app/api", "app/web", "billing/ledger"]);
}

#[tokio::test]
async fn filters_by_application() {
    let workloads = list_workloads(&store(), Some("billing")).await.expect("list");
    assert_eq!(workloads.len(), 1);
    assert_eq!(workloads[0].name, "ledger");
}

#[tokio::test]
async fn unknown_application_is_an_error() {
    let err = list_workloads(&store(), Some("nope")).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CatalogError>(),
        Some(CatalogError::ApplicationNotFound(_))
    ));
}

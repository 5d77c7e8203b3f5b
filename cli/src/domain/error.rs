//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use skiff_common::WorkloadKind;
use thiserror::Error;

// ── Catalog errors ────────────────────────────────────────────────────────────

/// Errors raised by the metadata catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Application '{0}' not found. Run 'skiff workload list' to see known applications.")]
    ApplicationNotFound(String),

    #[error("Environment '{env}' not found in application '{app}'.")]
    EnvironmentNotFound { app: String, env: String },
}

// ── Target errors ─────────────────────────────────────────────────────────────

/// Errors raised while resolving which workload to tear down.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("No application specified. Pass --app, set SKIFF_APP, or set default_app in config.")]
    MissingApplication,

    #[error("No workload specified. Pass --name.")]
    MissingWorkload,

    #[error("No workloads found in application '{0}'.")]
    NoWorkloads(String),

    #[error("Services cannot target the default cluster; '{0}' is a service.")]
    DefaultClusterService(String),

    #[error("Confirmation required. Re-run with --yes to delete '{0}' non-interactively.")]
    ConfirmationRequired(String),
}

// ── Teardown errors ───────────────────────────────────────────────────────────

/// A teardown step failed. Each variant names the step; `environment` is the
/// environment being processed (`None` for the default cluster).
#[derive(Debug, Error)]
pub enum TeardownError {
    #[error("resolve environments for {workload}: {cause:#}")]
    Scope {
        workload: String,
        cause: anyhow::Error,
    },

    #[error("get session: {cause:#}")]
    Session {
        environment: Option<String>,
        cause: anyhow::Error,
    },

    #[error("stop running tasks in family {workload}: {cause:#}")]
    StopTasks {
        environment: Option<String>,
        workload: String,
        cause: anyhow::Error,
    },

    #[error("empty ECR repository for {workload}: {cause:#}")]
    ClearRepository {
        environment: Option<String>,
        workload: String,
        cause: anyhow::Error,
    },

    #[error("{cause:#}")]
    LookupStack {
        environment: Option<String>,
        cause: anyhow::Error,
    },

    #[error("empty S3 bucket for {workload}: {cause:#}")]
    EmptyBucket {
        environment: Option<String>,
        workload: String,
        cause: anyhow::Error,
    },

    #[error("delete stack for {} {workload}: {cause:#}", .kind.noun())]
    DeleteStack {
        environment: Option<String>,
        kind: WorkloadKind,
        workload: String,
        cause: anyhow::Error,
    },

    #[error("update catalog for {workload}: {cause:#}")]
    Catalog {
        environment: Option<String>,
        workload: String,
        cause: anyhow::Error,
    },
}

impl TeardownError {
    /// Name of the step that failed.
    #[must_use]
    pub fn step(&self) -> &'static str {
        match self {
            Self::Scope { .. } => "resolve-scope",
            Self::Session { .. } => "get-session",
            Self::StopTasks { .. } => "stop-tasks",
            Self::ClearRepository { .. } => "clear-repository",
            Self::LookupStack { .. } => "lookup-stack",
            Self::EmptyBucket { .. } => "empty-bucket",
            Self::DeleteStack { .. } => "delete-stack",
            Self::Catalog { .. } => "update-catalog",
        }
    }

    /// Environment that was being processed when the step failed.
    #[must_use]
    pub fn environment(&self) -> Option<&str> {
        match self {
            Self::Scope { .. } => None,
            Self::Session { environment, .. }
            | Self::StopTasks { environment, .. }
            | Self::ClearRepository { environment, .. }
            | Self::LookupStack { environment, .. }
            | Self::EmptyBucket { environment, .. }
            | Self::DeleteStack { environment, .. }
            | Self::Catalog { environment, .. } => environment.as_deref(),
        }
    }
}

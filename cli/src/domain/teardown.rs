//! Teardown domain types and resource naming rules.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! All functions take data in and return data out.

use serde::Serialize;
use skiff_common::{Environment, WorkloadKind};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Cluster used by one-off tasks that are not scoped to any environment.
pub const DEFAULT_CLUSTER: &str = "default";

/// Prefix for task families and repositories owned by one-off tasks.
pub const TASK_PREFIX: &str = "skiff";

/// Prefix for infrastructure stacks owned by one-off tasks.
pub const TASK_STACK_PREFIX: &str = "task";

// ── Request ───────────────────────────────────────────────────────────────────

/// Which deployment instances a teardown should remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownScope {
    /// A single named environment.
    Environment(String),
    /// Every environment the workload is currently deployed to.
    AllDeployed,
    /// The environment-less default cluster (one-off tasks only).
    DefaultCluster,
}

/// A fully resolved teardown request handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct TeardownRequest {
    /// Owning application. `None` only for [`TeardownScope::DefaultCluster`].
    pub app: Option<String>,
    /// Workload name.
    pub workload: String,
    /// Service or one-off task.
    pub kind: WorkloadKind,
    /// Environments to tear down.
    pub scope: TeardownScope,
}

// ── Deployment instance ───────────────────────────────────────────────────────

/// Cluster that runs a deployment instance's compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterRef {
    Environment { app: String, env: String },
    Default,
}

impl ClusterRef {
    /// Cluster name on the container platform.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Environment { app, env } => format!("{app}-{env}"),
            Self::Default => DEFAULT_CLUSTER.to_string(),
        }
    }
}

/// One (workload, environment) pair being torn down.
#[derive(Debug, Clone, Copy)]
pub struct InstanceRef<'a> {
    pub workload: &'a str,
    pub kind: WorkloadKind,
    /// `None` means the default cluster.
    pub environment: Option<&'a Environment>,
}

impl InstanceRef<'_> {
    /// Environment name, or `None` for the default cluster.
    #[must_use]
    pub fn env_name(&self) -> Option<&str> {
        self.environment.map(|e| e.name.as_str())
    }

    /// Human label for the location, e.g. `test` or `default cluster`.
    #[must_use]
    pub fn location(&self) -> String {
        self.env_name()
            .map_or_else(|| "default cluster".to_string(), |e| format!("environment {e}"))
    }

    #[must_use]
    pub fn cluster(&self) -> ClusterRef {
        match self.environment {
            Some(env) => ClusterRef::Environment {
                app: env.app.clone(),
                env: env.name.clone(),
            },
            None => ClusterRef::Default,
        }
    }

    /// Task definition family whose running tasks belong to this instance.
    #[must_use]
    pub fn task_family(&self) -> String {
        match (self.kind, self.environment) {
            (WorkloadKind::Service, Some(env)) => {
                format!("{}-{}-{}", env.app, env.name, self.workload)
            }
            _ => format!("{TASK_PREFIX}-{}", self.workload),
        }
    }

    /// Image repository holding this workload's images.
    #[must_use]
    pub fn repository(&self) -> String {
        match (self.kind, self.environment) {
            (WorkloadKind::Service, Some(env)) => format!("{}/{}", env.app, self.workload),
            _ => format!("{TASK_PREFIX}-{}", self.workload),
        }
    }

    /// Infrastructure stack name for this instance.
    #[must_use]
    pub fn stack_name(&self) -> String {
        match (self.kind, self.environment) {
            (WorkloadKind::Service, Some(env)) => {
                format!("{}-{}-{}", env.app, env.name, self.workload)
            }
            _ => format!("{TASK_STACK_PREFIX}-{}", self.workload),
        }
    }
}

// ── Stack lookup ──────────────────────────────────────────────────────────────

/// Metadata describing a deployed infrastructure stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackInfo {
    pub app: Option<String>,
    pub env: Option<String>,
    /// Role the infrastructure engine assumes to delete the stack.
    pub role_arn: Option<String>,
    pub stack_name: String,
    /// Artifact bucket owned by the stack (one-off tasks only).
    pub bucket_name: Option<String>,
}

/// Result of looking up a stack: absence is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackLookup {
    Found(StackInfo),
    NotFound,
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Summary of a successful teardown run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TeardownReport {
    pub workload: String,
    pub kind: WorkloadKind,
    /// Locations whose stack was found and deleted.
    pub removed: Vec<String>,
    /// Locations where the stack was already gone.
    pub already_absent: Vec<String>,
    /// Whether the workload was deregistered and its catalog record deleted.
    pub deregistered: bool,
}

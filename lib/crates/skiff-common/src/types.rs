use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether a workload is a long-running service or a one-off task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadKind {
    #[default]
    Service,
    OneOffTask,
}

impl WorkloadKind {
    /// Short noun used in operator-facing messages (`service` / `task`).
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::OneOffTask => "task",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => f.write_str("service"),
            Self::OneOffTask => f.write_str("one-off-task"),
        }
    }
}

/// Error returned when parsing an unknown workload kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown workload kind '{0}' (expected 'service' or 'one-off-task')")]
pub struct ParseKindError(pub String);

impl FromStr for WorkloadKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service" => Ok(Self::Service),
            "one-off-task" | "task" => Ok(Self::OneOffTask),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

/// An application: the ownership root for environments and workloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Application {
    pub name: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Services registered as members of this application.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub workloads: BTreeSet<String>,
}

/// A deployment target belonging to exactly one application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Environment {
    pub app: String,
    pub name: String,
    #[serde(default)]
    pub account_id: String,
    pub region: String,
    /// Role assumed to obtain a credentialed session in this environment.
    pub manager_role_arn: String,
}

/// A deployable unit owned by an application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workload {
    pub app: String,
    pub name: String,
    #[serde(default)]
    pub kind: WorkloadKind,
    /// Declared type, e.g. `Backend Service` or `Scheduled Job`.
    #[serde(default, rename = "type")]
    pub workload_type: String,
    /// Environments currently holding a deployment instance of this workload.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub deployed_to: BTreeSet<String>,
}

impl Workload {
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        !self.deployed_to.is_empty()
    }
}

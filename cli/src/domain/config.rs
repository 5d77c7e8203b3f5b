//! Domain types for Skiff configuration.
//!
//! Pure types only — no I/O, no async, no filesystem access.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

/// Default AWS CLI executable.
pub const DEFAULT_AWS_CLI: &str = "aws";

/// Default timeout in seconds for a single AWS CLI call. Stack deletion waits
/// can take several minutes.
pub const DEFAULT_AWS_TIMEOUT_SECS: u64 = 900;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.skiff/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SkiffConfig {
    /// Application used when `--app` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_app: Option<String>,
    /// Catalog file location. Defaults to `~/.skiff/catalog.yaml`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    /// AWS CLI settings.
    pub aws: AwsConfig,
}

/// Settings for the AWS CLI adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Named profile used for default (environment-less) sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Region used for default sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// AWS CLI executable.
    pub cli: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            profile: None,
            region: None,
            cli: DEFAULT_AWS_CLI.to_string(),
            timeout_secs: DEFAULT_AWS_TIMEOUT_SECS,
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────

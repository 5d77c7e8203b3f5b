//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use skiff_common::{Application, Environment, Workload};

use crate::domain::{ClusterRef, Session, SkiffConfig, StackInfo, StackLookup};

// ── Metadata Store Port ───────────────────────────────────────────────────────

/// The catalog of applications, environments and workloads: the source of
/// truth for what is deployed where.
///
/// Removal operations treat a missing record as already removed.
#[allow(async_fn_in_trait)]
pub trait MetadataStore {
    /// Fetch an application record.
    async fn get_application(&self, app: &str) -> Result<Application>;
    /// List every application, sorted by name.
    async fn list_applications(&self) -> Result<Vec<Application>>;
    /// Fetch one environment of an application.
    async fn get_environment(&self, app: &str, env: &str) -> Result<Environment>;
    /// List an application's environments, sorted by name.
    async fn list_environments(&self, app: &str) -> Result<Vec<Environment>>;
    /// Fetch a workload record, or `None` if the catalog does not track it.
    async fn get_workload(&self, app: &str, name: &str) -> Result<Option<Workload>>;
    /// List an application's workloads, sorted by name.
    async fn list_workloads(&self, app: &str) -> Result<Vec<Workload>>;
    /// Drop `env` from the environments the workload is deployed to.
    async fn remove_deployment(&self, app: &str, workload: &str, env: &str) -> Result<()>;
    /// Deregister the workload from the application's resource set.
    async fn remove_workload_from_app(&self, app: &str, workload: &str) -> Result<()>;
    /// Delete the workload record.
    async fn delete_workload(&self, app: &str, workload: &str) -> Result<()>;
}

// ── Session Port ──────────────────────────────────────────────────────────────

/// Produces credentialed sessions. Implementations must not cache sessions
/// across environments.
#[allow(async_fn_in_trait)]
pub trait SessionResolver {
    /// Assume `role_arn` in `region`.
    async fn from_role(&self, role_arn: &str, region: &str) -> Result<Session>;
    /// Session for resources that are not scoped to any environment, using
    /// the configured profile and region.
    async fn default_session(&self) -> Result<Session>;

    /// Assume the environment's management role in its region.
    async fn for_environment(&self, env: &Environment) -> Result<Session> {
        self.from_role(&env.manager_role_arn, &env.region).await
    }
}

// ── Resource Remover Ports ────────────────────────────────────────────────────
//
// Each remover treats "not found" and "already empty" as success.

/// Halts running task instances.
#[allow(async_fn_in_trait)]
pub trait TaskStopper {
    /// Stop every running task of `family` in `cluster` and wait until stopped.
    async fn stop_tasks(&self, session: &Session, cluster: &ClusterRef, family: &str)
    -> Result<()>;
}

/// Purges container images.
#[allow(async_fn_in_trait)]
pub trait RepositoryCleaner {
    /// Delete every image in `repository`.
    async fn clear_repository(&self, session: &Session, repository: &str) -> Result<()>;
}

/// Purges deployment artifacts.
#[allow(async_fn_in_trait)]
pub trait BucketEmptier {
    /// Delete every object in `bucket`.
    async fn empty_bucket(&self, session: &Session, bucket: &str) -> Result<()>;
}

/// Looks up and deletes infrastructure stacks.
#[allow(async_fn_in_trait)]
pub trait StackManager {
    /// Describe `stack_name`. A missing stack is [`StackLookup::NotFound`].
    async fn lookup_stack(&self, session: &Session, stack_name: &str) -> Result<StackLookup>;
    /// Delete the stack and wait for completion. A stack that disappears
    /// concurrently counts as deleted.
    async fn delete_stack(&self, session: &Session, stack: &StackInfo) -> Result<()>;
}

/// Composite trait — any type implementing all four removers is a `CloudBackend`.
pub trait CloudBackend: TaskStopper + RepositoryCleaner + BucketEmptier + StackManager {}

/// Blanket implementation: any type implementing all four removers is a `CloudBackend`.
impl<T> CloudBackend for T where T: TaskStopper + RepositoryCleaner + BucketEmptier + StackManager {}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program with extra environment variables using the default timeout.
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
    ) -> Result<Output>;
    /// Run a program with extra environment variables and a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// A named step has started.
    fn step(&self, message: &str);
    /// The current step finished successfully.
    fn success(&self, message: &str);
    /// The current step failed.
    fn fail(&self, message: &str);
    /// Non-fatal notice.
    fn warn(&self, message: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts loading the user configuration file.
pub trait ConfigStore {
    /// Load the config, returning defaults when no file exists.
    fn load(&self) -> Result<SkiffConfig>;
    /// Location of the config file.
    fn path(&self) -> Result<std::path::PathBuf>;
}

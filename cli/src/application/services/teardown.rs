//! Application service — workload teardown use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.
//!
//! Per environment the steps run strictly in sequence:
//! session → stop tasks → clear repository → look up stack →
//! empty bucket → delete stack → catalog bookkeeping (services only).
//! The first failing step aborts the run; finished environments are not
//! rolled back, so re-running the same request is the recovery path.

use std::future::Future;

use anyhow::Result;
use skiff_common::{Environment, WorkloadKind};
use tracing::{debug, info, warn};

use crate::application::ports::{CloudBackend, MetadataStore, ProgressReporter, SessionResolver};
use crate::domain::{
    InstanceRef, Session, StackLookup, TargetError, TeardownError, TeardownReport,
    TeardownRequest, TeardownScope,
};

/// Outcome of tearing down a single deployment instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceOutcome {
    /// The stack existed and was deleted.
    Removed,
    /// The stack was already gone; nothing after the lookup ran.
    AlreadyAbsent,
}

/// Sequences session resolution, resource removal and catalog cleanup for
/// every environment in a [`TeardownRequest`].
pub struct TeardownOrchestrator<'a, S, C, M, R> {
    sessions: &'a S,
    cloud: &'a C,
    store: &'a M,
    reporter: &'a R,
}

impl<'a, S, C, M, R> TeardownOrchestrator<'a, S, C, M, R>
where
    S: SessionResolver,
    C: CloudBackend,
    M: MetadataStore,
    R: ProgressReporter,
{
    pub fn new(sessions: &'a S, cloud: &'a C, store: &'a M, reporter: &'a R) -> Self {
        Self {
            sessions,
            cloud,
            store,
            reporter,
        }
    }

    /// Tear down every deployment instance named by `req`.
    ///
    /// Environments are processed one at a time in alphabetical order.
    ///
    /// # Errors
    ///
    /// Returns the first failing step, tagged with the environment it failed in.
    #[tracing::instrument(skip_all, fields(workload = %req.workload, kind = %req.kind))]
    pub async fn teardown(&self, req: &TeardownRequest) -> Result<TeardownReport, TeardownError> {
        let targets = self.resolve_targets(req).await?;
        let mut report = TeardownReport {
            workload: req.workload.clone(),
            kind: req.kind,
            ..TeardownReport::default()
        };

        if targets.is_empty() {
            info!("workload has no deployments in scope");
        }

        for env in &targets {
            let instance = InstanceRef {
                workload: &req.workload,
                kind: req.kind,
                environment: env.as_ref(),
            };
            let label = instance.env_name().unwrap_or("default").to_string();
            info!(location = %label, "tearing down deployment instance");

            match self.teardown_instance(instance).await? {
                InstanceOutcome::Removed => report.removed.push(label),
                InstanceOutcome::AlreadyAbsent => report.already_absent.push(label),
            }

            if let (WorkloadKind::Service, Some(env)) = (req.kind, env) {
                if self.release_environment(&req.workload, env).await? {
                    report.deregistered = true;
                }
            }
        }

        // A service with nothing left deployed still owns its catalog entry.
        if targets.is_empty() && req.kind == WorkloadKind::Service {
            if let Some(app) = req.app.as_deref() {
                self.deregister(app, &req.workload, None).await?;
                report.deregistered = true;
            }
        }

        Ok(report)
    }

    /// Resolve the request's scope into concrete environments. `None` stands
    /// for the default cluster.
    async fn resolve_targets(
        &self,
        req: &TeardownRequest,
    ) -> Result<Vec<Option<Environment>>, TeardownError> {
        let scope_err = |cause: anyhow::Error| TeardownError::Scope {
            workload: req.workload.clone(),
            cause,
        };

        let app = match (&req.scope, req.app.as_deref()) {
            (TeardownScope::DefaultCluster, _) => {
                if req.kind == WorkloadKind::Service {
                    return Err(scope_err(
                        TargetError::DefaultClusterService(req.workload.clone()).into(),
                    ));
                }
                return Ok(vec![None]);
            }
            (_, Some(app)) => app,
            (_, None) => return Err(scope_err(TargetError::MissingApplication.into())),
        };

        let mut envs = match (&req.scope, req.kind) {
            (TeardownScope::Environment(name), _) => {
                vec![self.store.get_environment(app, name).await.map_err(scope_err)?]
            }
            (_, WorkloadKind::OneOffTask) => {
                self.store.list_environments(app).await.map_err(scope_err)?
            }
            (_, WorkloadKind::Service) => {
                let deployed = self
                    .store
                    .get_workload(app, &req.workload)
                    .await
                    .map_err(scope_err)?
                    .map(|w| w.deployed_to)
                    .unwrap_or_default();
                let mut envs = Vec::with_capacity(deployed.len());
                for name in &deployed {
                    envs.push(self.store.get_environment(app, name).await.map_err(scope_err)?);
                }
                envs
            }
        };
        envs.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = envs.len(), "resolved environments");
        Ok(envs.into_iter().map(Some).collect())
    }

    /// Remove one deployment instance's compute, images, artifacts and stack.
    ///
    /// # Errors
    ///
    /// Returns the failing step; later steps are not attempted.
    pub async fn teardown_instance(
        &self,
        instance: InstanceRef<'_>,
    ) -> Result<InstanceOutcome, TeardownError> {
        let env = instance.env_name().map(str::to_owned);
        let name = instance.workload;
        let location = instance.location();

        let session = self
            .reported(&format!("Resolving session for {location}"), async {
                match instance.environment {
                    Some(e) => self.sessions.for_environment(e).await,
                    None => self.sessions.default_session().await,
                }
            })
            .await
            .map_err(|cause| TeardownError::Session {
                environment: env.clone(),
                cause,
            })?;

        self.stop_tasks(&session, instance)
            .await
            .map_err(|cause| TeardownError::StopTasks {
                environment: env.clone(),
                workload: name.to_owned(),
                cause,
            })?;

        let repository = instance.repository();
        self.reported(
            &format!("Emptying image repository {repository} in {location}"),
            self.cloud.clear_repository(&session, &repository),
        )
        .await
        .map_err(|cause| TeardownError::ClearRepository {
            environment: env.clone(),
            workload: name.to_owned(),
            cause,
        })?;

        let stack_name = instance.stack_name();
        let lookup = self
            .cloud
            .lookup_stack(&session, &stack_name)
            .await
            .map_err(|cause| TeardownError::LookupStack {
                environment: env.clone(),
                cause,
            })?;
        let stack = match lookup {
            StackLookup::Found(stack) => stack,
            StackLookup::NotFound => {
                warn!(stack = %stack_name, "stack not found, treating as already deleted");
                self.reporter
                    .warn(&format!("Stack {stack_name} already deleted in {location}"));
                return Ok(InstanceOutcome::AlreadyAbsent);
            }
        };

        if let Some(bucket) = stack.bucket_name.as_deref().filter(|b| !b.is_empty()) {
            self.reported(
                &format!("Emptying artifact bucket {bucket}"),
                self.cloud.empty_bucket(&session, bucket),
            )
            .await
            .map_err(|cause| TeardownError::EmptyBucket {
                environment: env.clone(),
                workload: name.to_owned(),
                cause,
            })?;
        }

        self.reported(
            &format!("Deleting {} {name} from {location}", instance.kind.noun()),
            self.cloud.delete_stack(&session, &stack),
        )
        .await
        .map_err(|cause| TeardownError::DeleteStack {
            environment: env,
            kind: instance.kind,
            workload: name.to_owned(),
            cause,
        })?;

        Ok(InstanceOutcome::Removed)
    }

    async fn stop_tasks(&self, session: &Session, instance: InstanceRef<'_>) -> Result<()> {
        let family = instance.task_family();
        let cluster = instance.cluster();
        self.reported(
            &format!("Stopping running tasks of {} in {}", instance.workload, instance.location()),
            self.cloud.stop_tasks(session, &cluster, &family),
        )
        .await
    }

    /// Drop the environment from the workload's deployments and, when it was
    /// the last one, deregister the workload. Returns whether it deregistered.
    async fn release_environment(
        &self,
        workload: &str,
        env: &Environment,
    ) -> Result<bool, TeardownError> {
        let catalog_err = |cause: anyhow::Error| TeardownError::Catalog {
            environment: Some(env.name.clone()),
            workload: workload.to_owned(),
            cause,
        };
        let app = env.app.as_str();

        self.store
            .remove_deployment(app, workload, &env.name)
            .await
            .map_err(catalog_err)?;

        let remaining = self
            .store
            .get_workload(app, workload)
            .await
            .map_err(catalog_err)?
            .map(|w| w.deployed_to.len())
            .unwrap_or_default();
        if remaining > 0 {
            debug!(remaining, "workload still deployed elsewhere, keeping catalog entry");
            return Ok(false);
        }

        self.deregister(app, workload, Some(&env.name)).await?;
        Ok(true)
    }

    async fn deregister(
        &self,
        app: &str,
        workload: &str,
        env: Option<&str>,
    ) -> Result<(), TeardownError> {
        self.reported(&format!("Removing {workload} from application {app}"), async {
            self.store.remove_workload_from_app(app, workload).await?;
            self.store.delete_workload(app, workload).await
        })
        .await
        .map_err(|cause| TeardownError::Catalog {
            environment: env.map(str::to_owned),
            workload: workload.to_owned(),
            cause,
        })?;
        info!(app, "workload deregistered and catalog entry deleted");
        Ok(())
    }

    /// Await `fut`, emitting step / success / fail notifications around it.
    async fn reported<T>(&self, message: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        self.reporter.step(message);
        match fut.await {
            Ok(value) => {
                self.reporter.success(message);
                Ok(value)
            }
            Err(err) => {
                debug!(error = %format!("{err:#}"), "step failed");
                self.reporter.fail(message);
                Err(err)
            }
        }
    }
}

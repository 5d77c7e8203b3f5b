//! Shared fakes for orchestrator tests.
//!
//! Every fake appends to one [`CallLog`] so tests can assert on the relative
//! order of session, remover, stack and catalog calls.

#![allow(dead_code, clippy::expect_used)]

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use skiff_cli::application::ports::{
    BucketEmptier, MetadataStore, ProgressReporter, RepositoryCleaner, SessionResolver,
    StackManager, TaskStopper,
};
use skiff_cli::application::services::teardown::TeardownOrchestrator;
use skiff_cli::domain::{
    CatalogError, ClusterRef, Session, StackInfo, StackLookup, TeardownError, TeardownReport,
    TeardownRequest, TeardownScope,
};
use skiff_cli::infra::catalog::CatalogFile;
use skiff_common::{Application, Environment, Workload, WorkloadKind};

pub const APP: &str = "app";

// ── Call log ──────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().expect("lock").push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("lock").clone()
    }

    /// Entries starting with `prefix`.
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.matching(prefix).len()
    }

    /// Index of the first entry equal to `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn clear(&self) {
        self.0.lock().expect("lock").clear();
    }
}

/// Failure table keyed by a log entry or its operation prefix
/// (`"delete"` matches every `delete:*` entry).
#[derive(Default)]
struct Failures(Mutex<HashMap<String, String>>);

impl Failures {
    fn set(&self, key: &str, message: &str) {
        self.0
            .lock()
            .expect("lock")
            .insert(key.to_string(), message.to_string());
    }

    fn remove(&self, key: &str) {
        self.0.lock().expect("lock").remove(key);
    }

    fn check(&self, entry: &str) -> Result<()> {
        let failures = self.0.lock().expect("lock");
        for (key, message) in failures.iter() {
            if entry == key || entry.starts_with(&format!("{key}:")) {
                bail!("{message}");
            }
        }
        Ok(())
    }
}

// ── Session resolver ──────────────────────────────────────────────────────────

pub struct FakeSessions {
    log: CallLog,
    failures: Failures,
}

impl FakeSessions {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            failures: Failures::default(),
        }
    }

    /// Fail role assumption for `role_arn`.
    pub fn fail_role(&self, role_arn: &str, message: &str) {
        self.failures.set(&format!("session:{role_arn}"), message);
    }
}

impl SessionResolver for FakeSessions {
    async fn from_role(&self, role_arn: &str, region: &str) -> Result<Session> {
        let entry = format!("session:{role_arn}");
        self.log.push(&entry);
        self.failures.check(&entry)?;
        Ok(Session {
            region: Some(region.to_string()),
            role_arn: Some(role_arn.to_string()),
            ..Session::default()
        })
    }

    async fn default_session(&self) -> Result<Session> {
        self.log.push("session:default");
        self.failures.check("session:default")?;
        Ok(Session::default())
    }
}

// ── Cloud backend ─────────────────────────────────────────────────────────────

/// Records remover and stack calls. Stacks live in a map so a deleted stack
/// is `NotFound` on the next lookup.
pub struct FakeCloud {
    log: CallLog,
    failures: Failures,
    stacks: Mutex<HashMap<String, StackInfo>>,
}

impl FakeCloud {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            failures: Failures::default(),
            stacks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_stack(self, stack_name: &str, bucket: Option<&str>) -> Self {
        self.stacks.lock().expect("lock").insert(
            stack_name.to_string(),
            StackInfo {
                stack_name: stack_name.to_string(),
                bucket_name: bucket.map(str::to_string),
                ..StackInfo::default()
            },
        );
        self
    }

    /// Make calls whose log entry matches `key` fail with `message`.
    pub fn fail(&self, key: &str, message: &str) {
        self.failures.set(key, message);
    }

    pub fn recover(&self, key: &str) {
        self.failures.remove(key);
    }

    pub fn has_stack(&self, stack_name: &str) -> bool {
        self.stacks.lock().expect("lock").contains_key(stack_name)
    }

    fn record(&self, entry: String) -> Result<()> {
        self.log.push(&entry);
        self.failures.check(&entry)
    }
}

impl TaskStopper for FakeCloud {
    async fn stop_tasks(&self, _: &Session, cluster: &ClusterRef, family: &str) -> Result<()> {
        self.record(format!("stop:{}:{family}", cluster.name()))
    }
}

impl RepositoryCleaner for FakeCloud {
    async fn clear_repository(&self, _: &Session, repository: &str) -> Result<()> {
        self.record(format!("clear:{repository}"))
    }
}

impl BucketEmptier for FakeCloud {
    async fn empty_bucket(&self, _: &Session, bucket: &str) -> Result<()> {
        self.record(format!("empty:{bucket}"))
    }
}

impl StackManager for FakeCloud {
    async fn lookup_stack(&self, _: &Session, stack_name: &str) -> Result<StackLookup> {
        self.record(format!("lookup:{stack_name}"))?;
        Ok(self
            .stacks
            .lock()
            .expect("lock")
            .get(stack_name)
            .cloned()
            .map_or(StackLookup::NotFound, StackLookup::Found))
    }

    async fn delete_stack(&self, _: &Session, stack: &StackInfo) -> Result<()> {
        self.record(format!("delete:{}", stack.stack_name))?;
        self.stacks.lock().expect("lock").remove(&stack.stack_name);
        Ok(())
    }
}

// ── Metadata store ────────────────────────────────────────────────────────────

pub struct MemoryStore {
    log: CallLog,
    catalog: Mutex<CatalogFile>,
}

impl MemoryStore {
    pub fn new(log: &CallLog, catalog: CatalogFile) -> Self {
        Self {
            log: log.clone(),
            catalog: Mutex::new(catalog),
        }
    }

    pub fn snapshot(&self) -> CatalogFile {
        self.catalog.lock().expect("lock").clone()
    }

    pub fn workload(&self, name: &str) -> Option<Workload> {
        self.snapshot()
            .workloads
            .into_iter()
            .find(|w| w.name == name)
    }

    pub fn app_members(&self) -> BTreeSet<String> {
        self.snapshot()
            .applications
            .into_iter()
            .find(|a| a.name == APP)
            .map(|a| a.workloads)
            .unwrap_or_default()
    }

    fn check_app(catalog: &CatalogFile, app: &str) -> Result<()> {
        if catalog.applications.iter().any(|a| a.name == app) {
            Ok(())
        } else {
            Err(CatalogError::ApplicationNotFound(app.to_string()).into())
        }
    }
}

impl MetadataStore for MemoryStore {
    async fn get_application(&self, app: &str) -> Result<Application> {
        let catalog = self.catalog.lock().expect("lock");
        catalog
            .applications
            .iter()
            .find(|a| a.name == app)
            .cloned()
            .ok_or_else(|| CatalogError::ApplicationNotFound(app.to_string()).into())
    }

    async fn list_applications(&self) -> Result<Vec<Application>> {
        Ok(self.snapshot().applications)
    }

    async fn get_environment(&self, app: &str, env: &str) -> Result<Environment> {
        let catalog = self.catalog.lock().expect("lock");
        Self::check_app(&catalog, app)?;
        catalog
            .environments
            .iter()
            .find(|e| e.app == app && e.name == env)
            .cloned()
            .ok_or_else(|| {
                CatalogError::EnvironmentNotFound {
                    app: app.to_string(),
                    env: env.to_string(),
                }
                .into()
            })
    }

    async fn list_environments(&self, app: &str) -> Result<Vec<Environment>> {
        let catalog = self.catalog.lock().expect("lock");
        Self::check_app(&catalog, app)?;
        // Deliberately unsorted: the orchestrator owns the ordering.
        Ok(catalog
            .environments
            .iter()
            .filter(|e| e.app == app)
            .cloned()
            .collect())
    }

    async fn get_workload(&self, app: &str, name: &str) -> Result<Option<Workload>> {
        let catalog = self.catalog.lock().expect("lock");
        Self::check_app(&catalog, app)?;
        Ok(catalog
            .workloads
            .iter()
            .find(|w| w.app == app && w.name == name)
            .cloned())
    }

    async fn list_workloads(&self, app: &str) -> Result<Vec<Workload>> {
        let catalog = self.catalog.lock().expect("lock");
        Self::check_app(&catalog, app)?;
        Ok(catalog
            .workloads
            .iter()
            .filter(|w| w.app == app)
            .cloned()
            .collect())
    }

    async fn remove_deployment(&self, app: &str, workload: &str, env: &str) -> Result<()> {
        self.log
            .push(format!("catalog:remove-deployment:{workload}:{env}"));
        let mut catalog = self.catalog.lock().expect("lock");
        if let Some(w) = catalog
            .workloads
            .iter_mut()
            .find(|w| w.app == app && w.name == workload)
        {
            w.deployed_to.remove(env);
        }
        Ok(())
    }

    async fn remove_workload_from_app(&self, app: &str, workload: &str) -> Result<()> {
        self.log.push(format!("catalog:remove-from-app:{workload}"));
        let mut catalog = self.catalog.lock().expect("lock");
        if let Some(a) = catalog.applications.iter_mut().find(|a| a.name == app) {
            a.workloads.remove(workload);
        }
        Ok(())
    }

    async fn delete_workload(&self, app: &str, workload: &str) -> Result<()> {
        self.log.push(format!("catalog:delete:{workload}"));
        self.catalog
            .lock()
            .expect("lock")
            .workloads
            .retain(|w| !(w.app == app && w.name == workload));
        Ok(())
    }
}

// ── Progress reporter ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("lock").clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("step:{message}"));
    }
    fn success(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("success:{message}"));
    }
    fn fail(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("fail:{message}"));
    }
    fn warn(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("warn:{message}"));
    }
}

// ── Fixtures ──────────────────────────────────────────────────────────────────

pub fn role_arn(env: &str) -> String {
    format!("arn:aws:iam::123456789012:role/{APP}-{env}-EnvManagerRole")
}

pub fn environment(name: &str) -> Environment {
    Environment {
        app: APP.to_string(),
        name: name.to_string(),
        account_id: "123456789012".to_string(),
        region: "us-west-2".to_string(),
        manager_role_arn: role_arn(name),
    }
}

pub fn service(name: &str, deployed_to: &[&str]) -> Workload {
    Workload {
        app: APP.to_string(),
        name: name.to_string(),
        kind: WorkloadKind::Service,
        workload_type: "Backend Service".to_string(),
        deployed_to: deployed_to.iter().map(|e| (*e).to_string()).collect(),
    }
}

/// Catalog with application `app`, the given environments and services.
/// Services are registered as application members.
pub fn catalog(envs: &[&str], services: Vec<Workload>) -> CatalogFile {
    CatalogFile {
        applications: vec![Application {
            name: APP.to_string(),
            account_id: "123456789012".to_string(),
            region: "us-west-2".to_string(),
            workloads: services.iter().map(|w| w.name.clone()).collect(),
            ..Application::default()
        }],
        environments: envs.iter().map(|e| environment(e)).collect(),
        workloads: services,
    }
}

pub fn request(workload: &str, kind: WorkloadKind, scope: TeardownScope) -> TeardownRequest {
    let app = match scope {
        TeardownScope::DefaultCluster => None,
        _ => Some(APP.to_string()),
    };
    TeardownRequest {
        app,
        workload: workload.to_string(),
        kind,
        scope,
    }
}

pub fn in_env(env: &str) -> TeardownScope {
    TeardownScope::Environment(env.to_string())
}

// ── Harness ───────────────────────────────────────────────────────────────────

/// Wires the fakes to one shared call log.
pub struct Harness {
    pub log: CallLog,
    pub sessions: FakeSessions,
    pub cloud: FakeCloud,
    pub store: MemoryStore,
    pub reporter: RecordingReporter,
}

impl Harness {
    pub fn new(catalog: CatalogFile) -> Self {
        let log = CallLog::default();
        Self {
            sessions: FakeSessions::new(&log),
            cloud: FakeCloud::new(&log),
            store: MemoryStore::new(&log, catalog),
            reporter: RecordingReporter::default(),
            log,
        }
    }

    pub fn with_stack(mut self, stack_name: &str, bucket: Option<&str>) -> Self {
        self.cloud = self.cloud.with_stack(stack_name, bucket);
        self
    }

    pub async fn teardown(&self, req: &TeardownRequest) -> Result<TeardownReport, TeardownError> {
        TeardownOrchestrator::new(&self.sessions, &self.cloud, &self.store, &self.reporter)
            .teardown(req)
            .await
    }
}

//! Infrastructure implementation of the `MetadataStore` port.
//!
//! `YamlCatalog` keeps applications, environments and workloads in a single
//! YAML file. Reads and writes run on `tokio::task::spawn_blocking` and writes
//! are atomic (temp file + rename) so a crash never leaves a torn catalog.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use skiff_common::{Application, Environment, Workload};

use crate::application::ports::MetadataStore;
use crate::domain::{CatalogError, SkiffConfig};
use crate::infra::config::skiff_dir;

/// On-disk catalog layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogFile {
    pub applications: Vec<Application>,
    pub environments: Vec<Environment>,
    pub workloads: Vec<Workload>,
}

impl CatalogFile {
    fn application(&self, app: &str) -> Result<&Application> {
        self.applications
            .iter()
            .find(|a| a.name == app)
            .ok_or_else(|| CatalogError::ApplicationNotFound(app.to_string()).into())
    }
}

/// YAML file catalog — implements `MetadataStore` for the infra layer.
pub struct YamlCatalog {
    path: PathBuf,
}

impl YamlCatalog {
    /// Create a catalog backed by `path`. The file need not exist yet.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&CatalogFile) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || f(&load_sync(&path)?))
            .await
            .context("catalog read task panicked")?
    }

    /// Apply `f` and persist the catalog if `f` reports a change.
    async fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut CatalogFile) -> bool + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut catalog = load_sync(&path)?;
            if f(&mut catalog) {
                save_sync(&path, &catalog)?;
            }
            Ok(())
        })
        .await
        .context("catalog write task panicked")?
    }
}

/// Catalog location: `$SKIFF_CATALOG`, then the `catalog` config key, then
/// `~/.skiff/catalog.yaml`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn catalog_path(config: &SkiffConfig) -> Result<PathBuf> {
    if let Some(path) = std::env::var_os("SKIFF_CATALOG") {
        return Ok(PathBuf::from(path));
    }
    match &config.catalog {
        Some(path) => Ok(path.clone()),
        None => Ok(skiff_dir()?.join("catalog.yaml")),
    }
}

fn load_sync(path: &Path) -> Result<CatalogFile> {
    if !path.exists() {
        return Ok(CatalogFile::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(CatalogFile::default());
    }
    serde_yaml::from_str(&content).with_context(|| format!("parsing catalog {}", path.display()))
}

fn save_sync(path: &Path, catalog: &CatalogFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let content = serde_yaml::to_string(catalog).context("serializing catalog")?;

    let temp_path = path.with_extension("yaml.tmp");
    std::fs::write(&temp_path, &content)
        .with_context(|| format!("writing temp file {}", temp_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
    }

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("finalizing catalog {}", path.display()))
}

impl MetadataStore for YamlCatalog {
    async fn get_application(&self, app: &str) -> Result<Application> {
        let app = app.to_owned();
        self.read(move |c| c.application(&app).cloned()).await
    }

    async fn list_applications(&self) -> Result<Vec<Application>> {
        self.read(|c| {
            let mut apps = c.applications.clone();
            apps.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(apps)
        })
        .await
    }

    async fn get_environment(&self, app: &str, env: &str) -> Result<Environment> {
        let (app, env) = (app.to_owned(), env.to_owned());
        self.read(move |c| {
            c.application(&app)?;
            c.environments
                .iter()
                .find(|e| e.app == app && e.name == env)
                .cloned()
                .ok_or_else(|| CatalogError::EnvironmentNotFound { app, env }.into())
        })
        .await
    }

    async fn list_environments(&self, app: &str) -> Result<Vec<Environment>> {
        let app = app.to_owned();
        self.read(move |c| {
            c.application(&app)?;
            let mut envs: Vec<_> = c.environments.iter().filter(|e| e.app == app).cloned().collect();
            envs.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(envs)
        })
        .await
    }

    async fn get_workload(&self, app: &str, name: &str) -> Result<Option<Workload>> {
        let (app, name) = (app.to_owned(), name.to_owned());
        self.read(move |c| {
            c.application(&app)?;
            Ok(c.workloads
                .iter()
                .find(|w| w.app == app && w.name == name)
                .cloned())
        })
        .await
    }

    async fn list_workloads(&self, app: &str) -> Result<Vec<Workload>> {
        let app = app.to_owned();
        self.read(move |c| {
            c.application(&app)?;
            let mut workloads: Vec<_> =
                c.workloads.iter().filter(|w| w.app == app).cloned().collect();
            workloads.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(workloads)
        })
        .await
    }

    async fn remove_deployment(&self, app: &str, workload: &str, env: &str) -> Result<()> {
        let (app, workload, env) = (app.to_owned(), workload.to_owned(), env.to_owned());
        self.update(move |c| {
            c.workloads
                .iter_mut()
                .find(|w| w.app == app && w.name == workload)
                .is_some_and(|w| w.deployed_to.remove(&env))
        })
        .await
    }

    async fn remove_workload_from_app(&self, app: &str, workload: &str) -> Result<()> {
        let (app, workload) = (app.to_owned(), workload.to_owned());
        self.update(move |c| {
            c.applications
                .iter_mut()
                .find(|a| a.name == app)
                .is_some_and(|a| a.workloads.remove(&workload))
        })
        .await
    }

    async fn delete_workload(&self, app: &str, workload: &str) -> Result<()> {
        let (app, workload) = (app.to_owned(), workload.to_owned());
        self.update(move |c| {
            let before = c.workloads.len();
            c.workloads.retain(|w| !(w.app == app && w.name == workload));
            c.workloads.len() != before
        })
        .await
    }
}

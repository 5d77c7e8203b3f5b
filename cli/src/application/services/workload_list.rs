//! Application service — list catalog workloads.

use anyhow::Result;
use skiff_common::Workload;

use crate::application::ports::MetadataStore;

/// List workloads of `app`, or of every application when `app` is `None`.
///
/// Results are ordered by application, then workload name.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read or `app` does not exist.
pub async fn list_workloads(store: &impl MetadataStore, app: Option<&str>) -> Result<Vec<Workload>> {
    let apps = match app {
        Some(name) => vec![store.get_application(name).await?.name],
        None => store
            .list_applications()
            .await?
            .into_iter()
            .map(|a| a.name)
            .collect(),
    };

    let mut workloads = Vec::new();
    for app in &apps {
        workloads.extend(store.list_workloads(app).await?);
    }
    workloads.sort_by(|a, b| (&a.app, &a.name).cmp(&(&b.app, &b.name)));
    Ok(workloads)
}

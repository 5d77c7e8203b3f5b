//! `skiff workload` — delete and list workloads.

use anyhow::Result;
use clap::{Args, Subcommand};
use owo_colors::OwoColorize as _;
use skiff_common::{Workload, WorkloadKind};

use crate::app::AppContext;
use crate::application::ports::MetadataStore;
use crate::application::services::teardown::TeardownOrchestrator;
use crate::application::services::workload_list::list_workloads;
use crate::domain::{TargetError, TeardownReport, TeardownRequest, TeardownScope};
use crate::infra::aws::AwsCli;
use crate::infra::catalog::{self, YamlCatalog};
use crate::infra::session::StsSessionResolver;
use crate::output::{OutputContext, TerminalReporter, json};

/// Workload subcommands.
#[derive(Subcommand)]
pub enum WorkloadCommand {
    /// Delete a workload from one or all of its environments
    Delete(DeleteArgs),
    /// List workloads in the catalog
    List(ListArgs),
}

/// Arguments for `skiff workload delete`.
#[derive(Args)]
pub struct DeleteArgs {
    /// Name of the service or one-off task
    #[arg(short, long)]
    pub name: Option<String>,

    /// Only delete from this environment
    #[arg(short, long)]
    pub env: Option<String>,

    /// Application the workload belongs to [default: $SKIFF_APP]
    #[arg(short, long)]
    pub app: Option<String>,

    /// Delete a one-off task that runs in the default cluster
    #[arg(long = "default", conflicts_with_all = ["app", "env"])]
    pub default_cluster: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `skiff workload list`.
#[derive(Args)]
pub struct ListArgs {
    /// Only list workloads of this application [default: $SKIFF_APP]
    #[arg(short, long)]
    pub app: Option<String>,
}

/// Run a `skiff workload` subcommand.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read or the command fails.
pub async fn run(app: &AppContext, cmd: WorkloadCommand) -> Result<()> {
    let store = YamlCatalog::with_path(catalog::catalog_path(&app.config)?);
    match cmd {
        WorkloadCommand::Delete(args) => delete(app, &store, &args).await,
        WorkloadCommand::List(args) => list(app, &store, args.app.as_deref()).await,
    }
}

async fn delete(app: &AppContext, store: &YamlCatalog, args: &DeleteArgs) -> Result<()> {
    let request = resolve_request(app, store, args).await?;

    let subject = format!("{} {}", request.kind.noun(), request.workload);
    let prompt = format!(
        "Delete {subject} from {}? Its stack, images and artifacts will be removed.",
        describe_scope(&request)
    );
    if !app.confirm(&prompt, &request.workload)? {
        println!("Cancelled.");
        return Ok(());
    }

    let sessions = StsSessionResolver::from_config(&app.config.aws);
    let cloud = AwsCli::from_config(&app.config.aws);
    let reporter = TerminalReporter::new(&app.output);
    let orchestrator = TeardownOrchestrator::new(&sessions, &cloud, store, &reporter);

    let report = orchestrator.teardown(&request).await?;
    drop(reporter);

    if app.is_json() {
        json::print(&report)
    } else {
        render_report(&app.output, &report);
        Ok(())
    }
}

/// Turn flags, environment and config into a [`TeardownRequest`], prompting
/// for whatever is still missing.
///
/// # Errors
///
/// Returns a [`TargetError`] when a required value is missing and prompting
/// is not possible, or a catalog error.
pub async fn resolve_request(
    app: &AppContext,
    store: &impl MetadataStore,
    args: &DeleteArgs,
) -> Result<TeardownRequest> {
    if args.default_cluster {
        let workload = args.name.clone().ok_or(TargetError::MissingWorkload)?;
        return Ok(TeardownRequest {
            app: None,
            workload,
            kind: WorkloadKind::OneOffTask,
            scope: TeardownScope::DefaultCluster,
        });
    }

    let app_name = match args.app.clone().or_else(|| app.config.default_app.clone()) {
        Some(name) => name,
        None => {
            let names: Vec<String> = store
                .list_applications()
                .await?
                .into_iter()
                .map(|a| a.name)
                .collect();
            if names.is_empty() {
                return Err(TargetError::MissingApplication.into());
            }
            app.select("Which application?", &names, TargetError::MissingApplication)?
        }
    };

    let workload = match args.name.clone() {
        Some(name) => name,
        None => {
            let names: Vec<String> = store
                .list_workloads(&app_name)
                .await?
                .into_iter()
                .map(|w| w.name)
                .collect();
            if names.is_empty() {
                return Err(TargetError::NoWorkloads(app_name).into());
            }
            app.select("Which workload?", &names, TargetError::MissingWorkload)?
        }
    };

    // Tasks are not tracked as application members.
    let kind = store
        .get_workload(&app_name, &workload)
        .await?
        .map_or(WorkloadKind::OneOffTask, |w| w.kind);

    let scope = args
        .env
        .clone()
        .map_or(TeardownScope::AllDeployed, TeardownScope::Environment);

    tracing::debug!(app = %app_name, %workload, %kind, ?scope, "resolved teardown target");
    Ok(TeardownRequest {
        app: Some(app_name),
        workload,
        kind,
        scope,
    })
}

fn describe_scope(request: &TeardownRequest) -> String {
    match &request.scope {
        TeardownScope::Environment(env) => format!("environment {env}"),
        TeardownScope::DefaultCluster => "the default cluster".to_string(),
        TeardownScope::AllDeployed => match request.kind {
            WorkloadKind::Service => "every environment it is deployed to".to_string(),
            WorkloadKind::OneOffTask => "every environment".to_string(),
        },
    }
}

fn render_report(ctx: &OutputContext, report: &TeardownReport) {
    let subject = format!("{} {}", report.kind.noun(), report.workload);
    if report.removed.is_empty() && report.already_absent.is_empty() {
        ctx.info(&format!("Nothing deployed for {subject}."));
    } else {
        ctx.success(&format!("Deleted {subject}."));
    }
    if !report.removed.is_empty() {
        ctx.kv("removed", &report.removed.join(", "));
    }
    if !report.already_absent.is_empty() {
        ctx.kv("already gone", &report.already_absent.join(", "));
    }
    if report.deregistered {
        ctx.kv("catalog", "workload record deleted");
    }
}

async fn list(app: &AppContext, store: &YamlCatalog, app_name: Option<&str>) -> Result<()> {
    let app_name = app_name.or(app.config.default_app.as_deref());
    let workloads = list_workloads(store, app_name).await?;

    if app.is_json() {
        return json::print(&workloads);
    }
    if workloads.is_empty() {
        println!("No workloads found.");
        return Ok(());
    }
    print_table(&app.output, &workloads);
    Ok(())
}

fn print_table(ctx: &OutputContext, workloads: &[Workload]) {
    let name_width = workloads
        .iter()
        .map(|w| w.app.len() + w.name.len() + 1)
        .max()
        .unwrap_or(0)
        .max("NAME".len());
    println!(
        "{}",
        format!("{:<name_width$}  {:<12}  {:<26}  DEPLOYED", "NAME", "KIND", "TYPE")
            .style(ctx.styles.header)
    );
    for w in workloads {
        let deployed = if w.deployed_to.is_empty() {
            "-".to_string()
        } else {
            w.deployed_to.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        println!(
            "{:<name_width$}  {:<12}  {:<26}  {deployed}",
            format!("{}/{}", w.app, w.name),
            w.kind.to_string(),
            w.workload_type,
        );
    }
}

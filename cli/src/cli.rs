//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags, OutputMode};
use crate::commands;

/// Tear down application workloads and keep the catalog honest
#[derive(Parser)]
#[command(
    name = "skiff",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also disabled when NO_COLOR is set)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log debug events to stderr (overridden by SKIFF_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage workloads
    #[command(subcommand)]
    Workload(commands::workload::WorkloadCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            command,
            ..
        } = self;
        let yes = matches!(
            &command,
            Command::Workload(commands::workload::WorkloadCommand::Delete(args)) if args.yes
        );
        let flags = AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        };

        match command {
            Command::Version => commands::version::run(if json {
                OutputMode::Json
            } else {
                OutputMode::Human
            }),
            Command::Workload(cmd) => {
                let app = AppContext::new(&flags)?;
                commands::workload::run(&app, cmd).await
            }
        }
    }
}

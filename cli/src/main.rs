//! Skiff CLI - tear down application workloads

use clap::Parser;
use skiff_cli::cli::Cli;
use skiff_cli::domain::TeardownError;
use skiff_cli::output::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let as_json = cli.json;
    if let Err(e) = cli.run().await {
        if as_json {
            let code = e
                .downcast_ref::<TeardownError>()
                .map_or("error", TeardownError::step);
            match json::format_error(&format!("{e:#}"), code) {
                Ok(text) => println!("{text}"),
                Err(_) => eprintln!("Error: {e:#}"),
            }
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}

/// Log to stderr. `SKIFF_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_env("SKIFF_LOG").unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

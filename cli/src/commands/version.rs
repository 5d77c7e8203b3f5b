//! Version command

use anyhow::Result;

use crate::app::OutputMode;
use crate::output::json;

/// Run the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(mode: OutputMode) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    match mode {
        OutputMode::Json => json::print(&serde_json::json!({ "version": version })),
        OutputMode::Human => {
            println!("skiff {version}");
            Ok(())
        }
    }
}

//! Application context — unified state passed to every command handler.
//!
//! Adding a new cross-cutting concern requires only one field change here;
//! command signatures stay the same.

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::{SkiffConfig, TargetError};
use crate::infra::config::YamlConfigStore;
use crate::output::OutputContext;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `SKIFF_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Loaded user configuration. `SKIFF_APP` overrides `default_app`.
    pub config: SkiffConfig,
    /// When `true`, never prompt and treat destructive actions as confirmed.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `SKIFF_YES`
    /// environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be parsed.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        Self::with_config_store(flags, &YamlConfigStore::new())
    }

    /// Construct an `AppContext` reading configuration from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn with_config_store(flags: &AppFlags, store: &impl ConfigStore) -> Result<Self> {
        let ci_env = std::env::var_os("CI").is_some() || std::env::var_os("SKIFF_YES").is_some();
        let non_interactive = flags.behaviour.yes || ci_env;
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // JSON mode keeps stdout machine-readable.
        let quiet = flags.output.quiet || flags.output.json;

        let mut config = store.load().context("loading configuration")?;
        if let Some(app) = std::env::var("SKIFF_APP").ok().filter(|v| !v.is_empty()) {
            config.default_app = Some(app);
        }

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, quiet),
            mode,
            config,
            non_interactive,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Ask the operator to confirm deleting `subject`. Defaults to "no".
    ///
    /// Returns `true` immediately when `--yes`, `CI` or `SKIFF_YES` is set.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::ConfirmationRequired`] when there is no terminal
    /// to prompt on, or an error if the prompt itself fails.
    pub fn confirm(&self, prompt: &str, subject: &str) -> Result<bool> {
        if self.non_interactive {
            return Ok(true);
        }
        if !console::Term::stderr().is_term() {
            return Err(TargetError::ConfirmationRequired(subject.to_string()).into());
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("confirmation prompt")
    }

    /// Prompt the operator to pick one of `items`.
    ///
    /// # Errors
    ///
    /// Returns `missing` when prompting is disabled, or an error if the
    /// terminal prompt fails.
    pub fn select(&self, prompt: &str, items: &[String], missing: TargetError) -> Result<String> {
        if self.non_interactive || !console::Term::stderr().is_term() {
            return Err(missing.into());
        }
        let idx = dialoguer::Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()
            .context("selection prompt")?;
        items
            .get(idx)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("selection out of range"))
    }
}

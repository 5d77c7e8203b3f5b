//! Infrastructure implementation of the `SessionResolver` port.
//!
//! Environment sessions assume the environment's manager role through
//! `aws sts assume-role`; default sessions use the configured profile.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::ports::{CommandRunner, SessionResolver};
use crate::domain::{AwsConfig, Credentials, Session};
use crate::infra::aws::check_output;
use crate::infra::command_runner::TokioCommandRunner;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleOutput {
    credentials: AssumedCredentials,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumedCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
}

/// Resolves sessions by shelling out to the AWS CLI.
pub struct StsSessionResolver<R: CommandRunner> {
    runner: R,
    cli: String,
    profile: Option<String>,
    region: Option<String>,
}

impl<R: CommandRunner> StsSessionResolver<R> {
    pub fn new(runner: R, config: &AwsConfig) -> Self {
        Self {
            runner,
            cli: config.cli.clone(),
            profile: config.profile.clone(),
            region: config.region.clone(),
        }
    }

    fn base_session(&self) -> Session {
        Session {
            region: self.region.clone(),
            profile: self.profile.clone(),
            credentials: None,
            role_arn: None,
        }
    }
}

impl StsSessionResolver<TokioCommandRunner> {
    /// Production resolver using the configured CLI, profile and region.
    #[must_use]
    pub fn from_config(config: &AwsConfig) -> Self {
        Self::new(TokioCommandRunner::from_config(config), config)
    }
}

impl<R: CommandRunner> SessionResolver for StsSessionResolver<R> {
    async fn from_role(&self, role_arn: &str, region: &str) -> Result<Session> {
        let session_name = format!("skiff-{}", chrono::Utc::now().timestamp());
        let caller = Session {
            region: Some(region.to_string()),
            ..self.base_session()
        };
        tracing::debug!(role_arn, region, "assuming role");
        let output = self
            .runner
            .run_with_env(
                &self.cli,
                &[
                    "sts",
                    "assume-role",
                    "--role-arn",
                    role_arn,
                    "--role-session-name",
                    &session_name,
                    "--output",
                    "json",
                ],
                &caller.env_vars(),
            )
            .await
            .context("aws sts assume-role")?;
        let stdout = check_output(&output)
            .map_err(|e| e.context(format!("assume role {role_arn}")))?;
        let parsed: AssumeRoleOutput =
            serde_json::from_slice(stdout).context("parsing assume-role response")?;

        Ok(Session {
            region: Some(region.to_string()),
            profile: None,
            credentials: Some(Credentials {
                access_key_id: parsed.credentials.access_key_id,
                secret_access_key: parsed.credentials.secret_access_key,
                session_token: parsed.credentials.session_token,
            }),
            role_arn: Some(role_arn.to_string()),
        })
    }

    async fn default_session(&self) -> Result<Session> {
        Ok(self.base_session())
    }
}

//! AWS CLI adapters for the resource remover and stack manager ports.
//!
//! `AwsCli<R>` routes every call through a `CommandRunner`, passing the
//! session as environment variables. Each adapter treats the service's
//! "not found" error as success so teardown stays re-entrant.

use std::process::Output;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::application::ports::{
    BucketEmptier, CommandRunner, RepositoryCleaner, StackManager, TaskStopper,
};
use crate::domain::{AwsConfig, ClusterRef, Session, StackInfo, StackLookup};
use crate::infra::command_runner::TokioCommandRunner;

/// Stack tag naming the owning application.
pub const APP_TAG: &str = "skiff-application";
/// Stack tag naming the owning environment.
pub const ENV_TAG: &str = "skiff-environment";
/// Stack output carrying the artifact bucket name.
pub const BUCKET_OUTPUT: &str = "ArtifactBucket";

/// `ecs wait tasks-stopped` and `ecr batch-delete-image` accept at most 100 ids.
const ECS_ECR_BATCH: usize = 100;
/// `s3api delete-objects` accepts at most 1000 keys.
const S3_BATCH: usize = 1000;

/// Return stdout of a successful call, or an error carrying its stderr.
///
/// # Errors
///
/// Returns an error if the process exited non-zero.
pub fn check_output(output: &Output) -> Result<&[u8]> {
    if output.status.success() {
        return Ok(&output.stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("{}", stderr.trim())
}

fn stderr_contains(output: &Output, marker: &str) -> bool {
    !output.status.success() && String::from_utf8_lossy(&output.stderr).contains(marker)
}

/// Infrastructure adapter that drives ECS, ECR, S3 and CloudFormation
/// through the AWS CLI.
pub struct AwsCli<R: CommandRunner> {
    runner: R,
    cli: String,
}

impl<R: CommandRunner> AwsCli<R> {
    pub fn new(runner: R, cli: impl Into<String>) -> Self {
        Self {
            runner,
            cli: cli.into(),
        }
    }

    async fn call(&self, session: &Session, args: &[&str]) -> Result<Output> {
        let what = args.iter().take(2).copied().collect::<Vec<_>>().join(" ");
        debug!(call = %what, "aws");
        self.runner
            .run_with_env(&self.cli, args, &session.env_vars())
            .await
            .with_context(|| format!("aws {what}"))
    }
}

impl AwsCli<TokioCommandRunner> {
    /// Production adapter using the configured CLI and per-call timeout.
    #[must_use]
    pub fn from_config(config: &AwsConfig) -> Self {
        Self::new(TokioCommandRunner::from_config(config), config.cli.clone())
    }
}

// ── ECS ───────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksOutput {
    #[serde(default)]
    task_arns: Vec<String>,
}

impl<R: CommandRunner> TaskStopper for AwsCli<R> {
    async fn stop_tasks(
        &self,
        session: &Session,
        cluster: &ClusterRef,
        family: &str,
    ) -> Result<()> {
        let cluster = cluster.name();
        let output = self
            .call(
                session,
                &[
                    "ecs",
                    "list-tasks",
                    "--cluster",
                    &cluster,
                    "--family",
                    family,
                    "--desired-status",
                    "RUNNING",
                    "--output",
                    "json",
                ],
            )
            .await?;
        if stderr_contains(&output, "ClusterNotFoundException") {
            debug!(%cluster, "cluster not found, no tasks to stop");
            return Ok(());
        }
        let listed: ListTasksOutput = serde_json::from_slice(check_output(&output)?)
            .context("parsing list-tasks response")?;
        if listed.task_arns.is_empty() {
            return Ok(());
        }

        for arn in &listed.task_arns {
            let output = self
                .call(
                    session,
                    &[
                        "ecs",
                        "stop-task",
                        "--cluster",
                        &cluster,
                        "--task",
                        arn,
                        "--reason",
                        "Task stopped because the workload is being deleted",
                        "--output",
                        "json",
                    ],
                )
                .await?;
            check_output(&output).with_context(|| format!("stop task {arn}"))?;
        }

        for chunk in listed.task_arns.chunks(ECS_ECR_BATCH) {
            let mut args = vec!["ecs", "wait", "tasks-stopped", "--cluster", cluster.as_str(), "--tasks"];
            args.extend(chunk.iter().map(String::as_str));
            let output = self.call(session, &args).await?;
            check_output(&output).context("waiting for tasks to stop")?;
        }
        Ok(())
    }
}

// ── ECR ───────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListImagesOutput {
    #[serde(default)]
    image_ids: Vec<ImageId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageId {
    image_digest: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchDeleteOutput {
    #[serde(default)]
    failures: Vec<ImageFailure>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageFailure {
    failure_code: String,
    #[serde(default)]
    failure_reason: String,
}

impl<R: CommandRunner> RepositoryCleaner for AwsCli<R> {
    async fn clear_repository(&self, session: &Session, repository: &str) -> Result<()> {
        let output = self
            .call(
                session,
                &[
                    "ecr",
                    "list-images",
                    "--repository-name",
                    repository,
                    "--output",
                    "json",
                ],
            )
            .await?;
        if stderr_contains(&output, "RepositoryNotFoundException") {
            debug!(repository, "repository not found, nothing to clear");
            return Ok(());
        }
        let listed: ListImagesOutput = serde_json::from_slice(check_output(&output)?)
            .context("parsing list-images response")?;

        // Tagged images appear once per tag; delete each digest once.
        let mut digests: Vec<String> = listed
            .image_ids
            .into_iter()
            .filter_map(|id| id.image_digest)
            .collect();
        digests.sort();
        digests.dedup();

        for chunk in digests.chunks(ECS_ECR_BATCH) {
            let ids: Vec<String> = chunk.iter().map(|d| format!("imageDigest={d}")).collect();
            let mut args = vec![
                "ecr",
                "batch-delete-image",
                "--repository-name",
                repository,
                "--output",
                "json",
                "--image-ids",
            ];
            args.extend(ids.iter().map(String::as_str));
            let output = self.call(session, &args).await?;
            if stderr_contains(&output, "RepositoryNotFoundException") {
                return Ok(());
            }
            let deleted: BatchDeleteOutput = serde_json::from_slice(check_output(&output)?)
                .context("parsing batch-delete-image response")?;
            if let Some(failure) = deleted
                .failures
                .iter()
                .find(|f| f.failure_code != "ImageNotFound")
            {
                anyhow::bail!(
                    "delete images from {repository}: {} {}",
                    failure.failure_code,
                    failure.failure_reason
                );
            }
        }
        Ok(())
    }
}

// ── S3 ────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListVersionsOutput {
    #[serde(default)]
    versions: Vec<ObjectVersion>,
    #[serde(default)]
    delete_markers: Vec<ObjectVersion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ObjectVersion {
    key: String,
    version_id: Option<String>,
}

impl<R: CommandRunner> BucketEmptier for AwsCli<R> {
    async fn empty_bucket(&self, session: &Session, bucket: &str) -> Result<()> {
        let output = self
            .call(
                session,
                &[
                    "s3api",
                    "list-object-versions",
                    "--bucket",
                    bucket,
                    "--output",
                    "json",
                ],
            )
            .await?;
        if stderr_contains(&output, "NoSuchBucket") {
            debug!(bucket, "bucket not found, nothing to empty");
            return Ok(());
        }
        let stdout = check_output(&output)?;
        // An empty bucket prints nothing at all.
        if stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        let listed: ListVersionsOutput =
            serde_json::from_slice(stdout).context("parsing list-object-versions response")?;

        let objects: Vec<_> = listed
            .versions
            .iter()
            .chain(&listed.delete_markers)
            .map(|v| match &v.version_id {
                Some(id) => json!({ "Key": v.key, "VersionId": id }),
                None => json!({ "Key": v.key }),
            })
            .collect();

        for chunk in objects.chunks(S3_BATCH) {
            let payload = json!({ "Objects": chunk, "Quiet": true }).to_string();
            let output = self
                .call(
                    session,
                    &[
                        "s3api",
                        "delete-objects",
                        "--bucket",
                        bucket,
                        "--delete",
                        &payload,
                        "--output",
                        "json",
                    ],
                )
                .await?;
            if stderr_contains(&output, "NoSuchBucket") {
                return Ok(());
            }
            check_output(&output).with_context(|| format!("delete objects from {bucket}"))?;
        }
        Ok(())
    }
}

// ── CloudFormation ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacksOutput {
    #[serde(default)]
    stacks: Vec<StackDescription>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackDescription {
    stack_name: String,
    #[serde(default)]
    stack_status: String,
    #[serde(rename = "RoleARN")]
    role_arn: Option<String>,
    #[serde(default)]
    tags: Vec<StackTag>,
    #[serde(default)]
    outputs: Vec<StackOutput>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackTag {
    key: String,
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackOutput {
    output_key: String,
    output_value: String,
}

impl StackDescription {
    fn tag(&self, key: &str) -> Option<String> {
        self.tags.iter().find(|t| t.key == key).map(|t| t.value.clone())
    }

    fn into_info(self) -> StackInfo {
        let bucket_name = self
            .outputs
            .iter()
            .find(|o| o.output_key == BUCKET_OUTPUT)
            .map(|o| o.output_value.clone());
        StackInfo {
            app: self.tag(APP_TAG),
            env: self.tag(ENV_TAG),
            role_arn: self.role_arn,
            stack_name: self.stack_name,
            bucket_name,
        }
    }
}

fn stack_missing(output: &Output) -> bool {
    stderr_contains(output, "does not exist")
}

impl<R: CommandRunner> StackManager for AwsCli<R> {
    async fn lookup_stack(&self, session: &Session, stack_name: &str) -> Result<StackLookup> {
        let output = self
            .call(
                session,
                &[
                    "cloudformation",
                    "describe-stacks",
                    "--stack-name",
                    stack_name,
                    "--output",
                    "json",
                ],
            )
            .await?;
        if stack_missing(&output) {
            return Ok(StackLookup::NotFound);
        }
        let described: DescribeStacksOutput = serde_json::from_slice(check_output(&output)?)
            .context("parsing describe-stacks response")?;
        match described.stacks.into_iter().next() {
            Some(stack) if stack.stack_status != "DELETE_COMPLETE" => {
                Ok(StackLookup::Found(stack.into_info()))
            }
            _ => Ok(StackLookup::NotFound),
        }
    }

    async fn delete_stack(&self, session: &Session, stack: &StackInfo) -> Result<()> {
        let name = stack.stack_name.as_str();
        let mut args = vec!["cloudformation", "delete-stack", "--stack-name", name];
        if let Some(role) = stack.role_arn.as_deref() {
            args.extend(["--role-arn", role]);
        }
        let output = self.call(session, &args).await?;
        if stack_missing(&output) {
            debug!(stack = name, "stack already deleted");
            return Ok(());
        }
        check_output(&output)?;

        let output = self
            .call(
                session,
                &["cloudformation", "wait", "stack-delete-complete", "--stack-name", name],
            )
            .await?;
        if stack_missing(&output) {
            return Ok(());
        }
        check_output(&output).context("waiting for stack deletion")?;
        Ok(())
    }
}

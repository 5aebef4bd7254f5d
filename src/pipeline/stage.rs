// ABOUTME: StageExecutor: runs exactly one stage and always yields a StageResult.
// ABOUTME: Failures are captured at this boundary, never raised past it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{PipelineConfig, StageKind};
use crate::exec::CommandRunner;
use crate::runtime::{BuildContext, RuntimeClient};
use crate::types::{ProjectIdentity, VerifiedEvent};

use super::error::StageError;
use super::locks::LockTable;
use super::run::{Outcome, StageResult};
use super::swap::DeploySwapCoordinator;

/// Executes individual pipeline stages against the container engine.
pub struct StageExecutor {
    runtime: Arc<dyn RuntimeClient>,
    locks: Arc<LockTable>,
    swap: DeploySwapCoordinator,
    commands: Arc<dyn CommandRunner>,
    projects_dir: PathBuf,
}

impl StageExecutor {
    pub fn new(
        runtime: Arc<dyn RuntimeClient>,
        locks: Arc<LockTable>,
        commands: Arc<dyn CommandRunner>,
        projects_dir: PathBuf,
    ) -> Self {
        let swap = DeploySwapCoordinator::new(runtime.clone(), locks.clone());
        Self {
            runtime,
            locks,
            swap,
            commands,
            projects_dir,
        }
    }

    /// Run one stage. Never returns an error: any failure is folded into
    /// a Failure [`StageResult`] with its detail.
    pub async fn execute(
        &self,
        stage: StageKind,
        event: &VerifiedEvent,
        identity: &ProjectIdentity,
        config: &PipelineConfig,
    ) -> StageResult {
        tracing::info!("Running {} stage for {}", stage, identity);
        let started = Instant::now();
        let mut output = String::new();
        let mut warnings = Vec::new();

        let verdict = match stage {
            StageKind::Test => {
                self.run_test(event, identity, &mut output, &mut warnings)
                    .await
            }
            StageKind::Build => self.run_build(event, identity, &mut output).await,
            StageKind::Deploy => self.run_deploy(identity, config, &mut output).await,
            StageKind::ComposeBuildDeploy => {
                self.run_compose(event, config, &mut output).await
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        match verdict {
            Ok(()) => {
                tracing::info!("{} stage for {} succeeded in {}ms", stage, identity, duration_ms);
                StageResult {
                    stage,
                    output,
                    duration_ms,
                    outcome: Outcome::Success,
                    error_detail: None,
                    warnings,
                }
            }
            Err(e) => {
                tracing::warn!("{} stage for {} failed: {}", stage, identity, e);
                StageResult {
                    stage,
                    output,
                    duration_ms,
                    outcome: Outcome::Failure,
                    error_detail: Some(e.to_string()),
                    warnings,
                }
            }
        }
    }

    fn project_dir(&self, event: &VerifiedEvent) -> Result<PathBuf, StageError> {
        let dir = self.projects_dir.join(event.full_name.to_lowercase());
        if !dir.is_dir() {
            return Err(StageError::ConfigInvalid(format!(
                "project directory {} does not exist",
                dir.display()
            )));
        }
        Ok(dir)
    }

    /// Test stage: build a throwaway image, run it to completion, keep
    /// the logs, then clean up regardless of the exit code. Cleanup
    /// failures become warnings; they never overturn the verdict taken
    /// from the wait step.
    ///
    /// Takes no identity lock: everything here works on the `-test` tag
    /// and its container, never the deployable image a swap touches.
    async fn run_test(
        &self,
        event: &VerifiedEvent,
        identity: &ProjectIdentity,
        output: &mut String,
        warnings: &mut Vec<String>,
    ) -> Result<(), StageError> {
        let dir = self.project_dir(event)?;
        let tag = identity.test_tag();

        let (image, build_log) = self
            .runtime
            .build_image(&tag, &BuildContext::test(&dir))
            .await?;
        output.push_str("Test image created\n");
        output.push_str(&build_log);

        let container = self
            .runtime
            .create_container(&tag, &tag)
            .await?;
        output.push_str("Test container created\n");

        self.runtime.start_container(&container).await?;
        output.push_str("Test container started\n");

        let exit_code = self.runtime.wait_for_exit(&container).await?;

        match self.runtime.fetch_logs(&container).await {
            Ok(logs) => {
                output.push_str("\nTest logs:\n");
                output.push_str(&logs);
            }
            Err(e) => warnings.push(format!("could not fetch test logs: {}", e)),
        }

        // Cleanup is best-effort from here; the verdict is already fixed.
        if let Err(e) = self.runtime.remove_container(&container).await {
            warnings.push(format!("could not remove test container: {}", e));
        }
        if let Err(e) = self.runtime.remove_image(&tag).await {
            warnings.push(format!("could not remove test image: {}", e));
        }
        for warning in warnings.iter() {
            tracing::warn!("Test stage cleanup for {}: {}", identity, warning);
        }

        if exit_code != 0 {
            return Err(StageError::CommandFailed(format!(
                "test container exited with code {}",
                exit_code
            )));
        }
        output.push_str("\nTest container exited cleanly\n");
        Ok(())
    }

    /// Build stage: drop any stale image with the project's tag, then
    /// build the fresh one. Holds the identity lock so a rebuild cannot
    /// race a deploy swap of the same project.
    async fn run_build(
        &self,
        event: &VerifiedEvent,
        identity: &ProjectIdentity,
        output: &mut String,
    ) -> Result<(), StageError> {
        let dir = self.project_dir(event)?;

        let _guard = self.locks.acquire(identity).await;

        self.runtime.remove_image(identity.as_str()).await?;
        let (_image, build_log) = self
            .runtime
            .build_image(identity.as_str(), &BuildContext::project(&dir))
            .await?;

        output.push_str("Project image created\n");
        output.push_str(&build_log);
        Ok(())
    }

    async fn run_deploy(
        &self,
        identity: &ProjectIdentity,
        config: &PipelineConfig,
        output: &mut String,
    ) -> Result<(), StageError> {
        let swap_output = self.swap.swap(identity, config.stop_timeout).await?;
        output.push_str(&swap_output);
        Ok(())
    }

    /// Compose stage: shell out to the compose tool in the project
    /// directory. Only the text output and exit status matter here.
    async fn run_compose(
        &self,
        event: &VerifiedEvent,
        config: &PipelineConfig,
        output: &mut String,
    ) -> Result<(), StageError> {
        let dir = self.project_dir(event)?;

        let mut args = Vec::new();
        if let Some(ref file) = config.compose_file {
            args.push("-f".to_string());
            args.push(file.clone());
        }
        args.extend(
            ["up", "-d", "--build"]
                .into_iter()
                .map(String::from),
        );

        let result = self
            .commands
            .run(&dir, "docker-compose", &args)
            .await
            .map_err(|e| StageError::CommandFailed(e.to_string()))?;

        output.push_str(&result.combined());

        if !result.success() {
            return Err(StageError::CommandFailed(format!(
                "docker-compose exited with code {}",
                result
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            )));
        }
        Ok(())
    }
}

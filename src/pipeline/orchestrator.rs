// ABOUTME: PipelineOrchestrator: sequences configured stages for one event.
// ABOUTME: Strictly ordered, stops at first failure, yields a sealed PipelineRun.

use std::time::Instant;

use crate::config::PipelineConfig;
use crate::types::{IdentityError, ProjectIdentity, VerifiedEvent};

use super::run::PipelineRun;
use super::stage::StageExecutor;

/// Drives one pipeline run end to end.
///
/// `run` is a plain async call designed to execute on its own task; the
/// gateway spawns one task per verified event and acknowledges
/// immediately. Runs for different identities share nothing but the lock
/// table and the engine client.
pub struct PipelineOrchestrator {
    executor: StageExecutor,
}

impl PipelineOrchestrator {
    pub fn new(executor: StageExecutor) -> Self {
        Self { executor }
    }

    /// Execute every configured stage in order, stopping at the first
    /// failure. The returned run is sealed; later stages after a failure
    /// were neither executed nor recorded.
    ///
    /// The only error is an event whose owner/repo cannot form a valid
    /// identity, which the gateway already rejects at dispatch.
    pub async fn run(
        &self,
        event: VerifiedEvent,
        config: PipelineConfig,
    ) -> Result<PipelineRun, IdentityError> {
        let identity = ProjectIdentity::from_event(&event)?;

        tracing::info!(
            "Pipeline run for {} at {} ({} stage(s))",
            identity,
            event.short_commit(),
            config.stages.len()
        );

        let started = Instant::now();
        let configured = config.stages.len();
        let mut results = Vec::with_capacity(configured);

        for stage in config.stages.iter() {
            let result = self
                .executor
                .execute(*stage, &event, &identity, &config)
                .await;
            let failed = !result.is_success();
            results.push(result);
            if failed {
                tracing::warn!(
                    "Pipeline run for {} stopped at {} stage, skipping the rest",
                    identity,
                    stage
                );
                break;
            }
        }

        Ok(PipelineRun::seal(
            event,
            identity,
            results,
            configured,
            started.elapsed().as_millis() as u64,
        ))
    }
}

// ABOUTME: DeploySwapCoordinator: replaces a project's running container safely.
// ABOUTME: Teardown-then-recreate, serialized per identity, never two containers.

use std::sync::Arc;
use std::time::Duration;

use crate::runtime::RuntimeClient;
use crate::types::ProjectIdentity;

use super::error::StageError;
use super::locks::LockTable;

/// Replaces a possibly-running container for an identity with a freshly
/// built one.
///
/// The whole sequence holds the identity's lock, so concurrent deploys
/// of the same project cannot interleave. The invariant: at no point do
/// two containers of the same identity run, and a teardown left in an
/// unknown state blocks creation of the replacement.
pub struct DeploySwapCoordinator {
    runtime: Arc<dyn RuntimeClient>,
    locks: Arc<LockTable>,
}

impl DeploySwapCoordinator {
    pub fn new(runtime: Arc<dyn RuntimeClient>, locks: Arc<LockTable>) -> Self {
        Self { runtime, locks }
    }

    /// Execute the swap, returning the combined step output text.
    ///
    /// Failure modes:
    /// - teardown of an existing container fails and the container is
    ///   still present: [`StageError::SwapConflict`], no replacement is
    ///   created;
    /// - create or start of the replacement fails: the project is left
    ///   with no running container, surfaced in the error detail.
    pub async fn swap(
        &self,
        identity: &ProjectIdentity,
        stop_timeout: Duration,
    ) -> Result<String, StageError> {
        let _guard = self.locks.acquire(identity).await;
        let mut output = String::new();

        self.teardown_old(identity, stop_timeout, &mut output)
            .await?;
        self.create_new(identity, &mut output).await?;

        Ok(output)
    }

    /// Phase 1: stop, wait out, and remove the previous container.
    /// Absence of a previous container is a no-op, not an error.
    async fn teardown_old(
        &self,
        identity: &ProjectIdentity,
        stop_timeout: Duration,
        output: &mut String,
    ) -> Result<(), StageError> {
        let existing = match self.runtime.inspect(identity.as_str()).await {
            Ok(existing) => existing,
            Err(e) => return Err(e.into()),
        };

        let Some(descriptor) = existing else {
            tracing::debug!("No previous container for {}, teardown skipped", identity);
            output.push_str("No previous container found\n");
            return Ok(());
        };

        tracing::info!("Tearing down previous container for {}", identity);

        self.runtime
            .stop_container(&descriptor.handle, stop_timeout)
            .await
            .map_err(|e| StageError::SwapConflict(format!("stopping old container: {}", e)))?;
        output.push_str("Old container stopping\n");

        if let Err(e) = self.runtime.wait_for_exit(&descriptor.handle).await {
            // The container may have been removed out from under us
            // (operator intervention). If it is genuinely gone the goal
            // of teardown is met; anything else is an unknown state.
            match self.runtime.inspect(identity.as_str()).await {
                Ok(None) => {
                    tracing::warn!(
                        "Old container for {} vanished during teardown: {}",
                        identity,
                        e
                    );
                    output.push_str("Old container already gone\n");
                    return Ok(());
                }
                _ => {
                    return Err(StageError::SwapConflict(format!(
                        "waiting for old container to exit: {}",
                        e
                    )));
                }
            }
        }
        output.push_str("Old container exited\n");

        self.runtime
            .remove_container(&descriptor.handle)
            .await
            .map_err(|e| StageError::SwapConflict(format!("removing old container: {}", e)))?;
        output.push_str("Old container removed\n");

        Ok(())
    }

    /// Phase 2: create and start the replacement, image and name both
    /// being the identity.
    async fn create_new(
        &self,
        identity: &ProjectIdentity,
        output: &mut String,
    ) -> Result<(), StageError> {
        let handle = self
            .runtime
            .create_container(identity.as_str(), identity.as_str())
            .await
            .map_err(|e| degraded(e, identity))?;
        output.push_str("New container created\n");

        self.runtime
            .start_container(&handle)
            .await
            .map_err(|e| degraded(e, identity))?;
        output.push_str("New container started\n");

        tracing::info!("Deploy swap for {} complete", identity);
        Ok(())
    }
}

/// Mark an error from the create/start phase: the old container is gone
/// and the new one did not come up, which the operator must know.
fn degraded(err: crate::runtime::RuntimeError, identity: &ProjectIdentity) -> StageError {
    use crate::runtime::RuntimeError;
    match err {
        RuntimeError::Unavailable(msg) => StageError::RuntimeUnavailable(format!(
            "{} ({} is left with no running container)",
            msg, identity
        )),
        RuntimeError::OperationFailed(msg) => StageError::RuntimeOperationFailed(format!(
            "{} ({} is left with no running container)",
            msg, identity
        )),
    }
}

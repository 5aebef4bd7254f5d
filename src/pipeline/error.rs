// ABOUTME: Error taxonomy for pipeline stages.
// ABOUTME: Every variant is captured into a Failure StageResult, never raised past it.

use thiserror::Error;

use crate::runtime::RuntimeError;

/// Failures a stage can hit.
///
/// None of these escape [`super::StageExecutor`]: they become the
/// `error_detail` of a Failure [`super::StageResult`]. The hosting
/// process is never terminated on their account.
#[derive(Debug, Error)]
pub enum StageError {
    /// The engine could not be reached.
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// The engine rejected an operation.
    #[error("runtime operation failed: {0}")]
    RuntimeOperationFailed(String),

    /// The resolved pipeline configuration cannot drive this stage.
    #[error("invalid pipeline configuration: {0}")]
    ConfigInvalid(String),

    /// Teardown of the previous container left it in an indeterminate
    /// state; the swap was aborted before creating a replacement.
    #[error("deploy swap conflict: {0}")]
    SwapConflict(String),

    /// The external compose command failed or could not be spawned.
    #[error("external command failed: {0}")]
    CommandFailed(String),
}

impl From<RuntimeError> for StageError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Unavailable(msg) => StageError::RuntimeUnavailable(msg),
            RuntimeError::OperationFailed(msg) => StageError::RuntimeOperationFailed(msg),
        }
    }
}

// ABOUTME: Error taxonomy for container engine operations.
// ABOUTME: Distinguishes transport failures from engine rejections.

use thiserror::Error;

/// Errors from the container engine adapter.
///
/// Neither variant is retried at this layer; retries, if any, belong to
/// a higher policy.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The engine could not be reached over its socket.
    #[error("container runtime unavailable: {0}")]
    Unavailable(String),

    /// The engine was reached but rejected the operation.
    #[error("runtime operation failed: {0}")]
    OperationFailed(String),
}

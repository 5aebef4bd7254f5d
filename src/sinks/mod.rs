// ABOUTME: Outbound collaborators: report persistence and notifications.
// ABOUTME: Traits kept narrow so the core is testable with in-memory fakes.

mod file_log;
mod slack;

use async_trait::async_trait;
use thiserror::Error;

pub use file_log::FileLogSink;
pub use slack::SlackNotifier;

use crate::types::ProjectIdentity;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to persist report: {0}")]
    Persist(String),

    #[error("failed to deliver notification: {0}")]
    Notify(String),
}

/// Durable storage for run reports. Errors are surfaced to the caller
/// but must never crash the run.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn persist(
        &self,
        identity: &ProjectIdentity,
        commit_id: &str,
        report: &str,
    ) -> Result<(), SinkError>;
}

/// Best-effort notification delivery. Failures are logged, never fatal.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, report: &str) -> Result<(), SinkError>;
}

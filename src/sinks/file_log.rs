// ABOUTME: Filesystem LogSink writing one report file per commit.
// ABOUTME: Layout: <logs_dir>/<identity>/<commit_id>.log

use async_trait::async_trait;
use std::path::PathBuf;

use crate::types::ProjectIdentity;

use super::{LogSink, SinkError};

/// Persists run reports under a per-project directory.
pub struct FileLogSink {
    logs_dir: PathBuf,
}

impl FileLogSink {
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
        }
    }

    fn report_path(&self, identity: &ProjectIdentity, commit_id: &str) -> PathBuf {
        self.logs_dir
            .join(identity.as_str())
            .join(format!("{}.log", commit_id))
    }
}

#[async_trait]
impl LogSink for FileLogSink {
    async fn persist(
        &self,
        identity: &ProjectIdentity,
        commit_id: &str,
        report: &str,
    ) -> Result<(), SinkError> {
        let path = self.report_path(identity, commit_id);
        let dir = self.logs_dir.join(identity.as_str());

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| SinkError::Persist(format!("{}: {}", dir.display(), e)))?;
        tokio::fs::write(&path, report)
            .await
            .map_err(|e| SinkError::Persist(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Report persisted to {}", path.display());
        Ok(())
    }
}

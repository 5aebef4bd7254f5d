// ABOUTME: RuntimeClient trait: the engine operations the pipeline core needs.
// ABOUTME: Build, create, start, wait, logs, stop, remove, inspect.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::{ContainerHandle, ImageHandle};

use super::RuntimeError;

/// A directory to be tarred and streamed to the engine as an image build
/// context, plus the Dockerfile to use within it.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub dir: PathBuf,
    pub dockerfile: String,
}

impl BuildContext {
    /// Context for the deployable project image.
    pub fn project(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            dockerfile: "Dockerfile".to_string(),
        }
    }

    /// Context for the throwaway test image.
    pub fn test(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            dockerfile: "Dockerfile.test".to_string(),
        }
    }
}

/// Lifecycle state reported by `inspect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

/// What `inspect` reports about an existing container.
#[derive(Debug, Clone)]
pub struct ContainerDescriptor {
    pub handle: ContainerHandle,
    pub name: String,
    pub state: ContainerState,
}

/// Engine operations used by the pipeline core.
///
/// Implementations must be safe for concurrent use by multiple runs; the
/// adapter is the only process-wide shared engine state. All operations
/// fail with [`RuntimeError`] and are not retried here.
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Build an image from the given context, returning the handle and
    /// the collected build log text.
    async fn build_image(
        &self,
        tag: &str,
        context: &BuildContext,
    ) -> Result<(ImageHandle, String), RuntimeError>;

    /// Remove an image by tag. Absence of the image is not an error.
    async fn remove_image(&self, tag: &str) -> Result<(), RuntimeError>;

    /// Create a container from an image reference, with the given name.
    async fn create_container(
        &self,
        image_ref: &str,
        name: &str,
    ) -> Result<ContainerHandle, RuntimeError>;

    /// Start a created container.
    async fn start_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError>;

    /// Block until the container terminates, returning its exit code.
    /// No internal timeout; cancellation is the caller's policy.
    async fn wait_for_exit(&self, handle: &ContainerHandle) -> Result<i64, RuntimeError>;

    /// Collected stdout+stderr of a container.
    async fn fetch_logs(&self, handle: &ContainerHandle) -> Result<String, RuntimeError>;

    /// Stop a running container. Already-stopped or absent is not an error.
    async fn stop_container(
        &self,
        handle: &ContainerHandle,
        timeout: Duration,
    ) -> Result<(), RuntimeError>;

    /// Remove a container. Absence is not an error.
    async fn remove_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError>;

    /// Look up a container by name. `None` when the engine knows no such
    /// container.
    async fn inspect(&self, name: &str) -> Result<Option<ContainerDescriptor>, RuntimeError>;
}

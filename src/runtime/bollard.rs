// ABOUTME: Bollard-based RuntimeClient implementation.
// ABOUTME: Talks to Docker or Podman over a local Unix socket.

use async_trait::async_trait;
use bollard::Docker;
use bollard::models::ContainerCreateBody;
use bollard::query_parameters::{
    BuildImageOptions, CreateContainerOptions, InspectContainerOptions, LogsOptions,
    RemoveContainerOptions, RemoveImageOptions, StopContainerOptions,
};
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{Either, Full};
use std::time::Duration;

use crate::types::{ContainerHandle, ImageHandle};

use super::client::{BuildContext, ContainerDescriptor, ContainerState, RuntimeClient};
use super::error::RuntimeError;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

/// Engine rejections arrive as HTTP status errors; everything else is a
/// transport problem.
fn map_engine_error(e: bollard::errors::Error) -> RuntimeError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => RuntimeError::OperationFailed(format!("{} ({})", message, status_code)),
        _ => RuntimeError::Unavailable(e.to_string()),
    }
}

fn is_not_found(e: &bollard::errors::Error) -> bool {
    matches!(
        e,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

/// Stopping an already-stopped container reports 304; treat it like the
/// absent case so teardown stays idempotent.
fn is_not_modified(e: &bollard::errors::Error) -> bool {
    matches!(
        e,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 304,
            ..
        }
    )
}

// =============================================================================
// BollardClient
// =============================================================================

/// Container engine adapter using bollard.
///
/// Works against both Docker and Podman via the Docker-compatible API.
/// A single client is shared by all concurrently executing runs.
pub struct BollardClient {
    client: Docker,
}

impl BollardClient {
    /// Connect to the engine socket at the given path.
    pub fn connect(socket_path: &str) -> Result<Self, RuntimeError> {
        let client = Docker::connect_with_unix(socket_path, 120, bollard::API_DEFAULT_VERSION)
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;
        Ok(Self { client })
    }

    /// Verify the engine answers before accepting work.
    pub async fn ping(&self) -> Result<(), RuntimeError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;
        Ok(())
    }

    /// Create a tar archive of the build context directory.
    fn create_build_context(context: &BuildContext) -> Result<Vec<u8>, RuntimeError> {
        let mut ar = tar::Builder::new(Vec::new());
        ar.append_dir_all(".", &context.dir).map_err(|e| {
            RuntimeError::OperationFailed(format!(
                "failed to tar build context {}: {}",
                context.dir.display(),
                e
            ))
        })?;
        ar.into_inner().map_err(|e| {
            RuntimeError::OperationFailed(format!("failed to finish build context tar: {}", e))
        })
    }
}

#[async_trait]
impl RuntimeClient for BollardClient {
    async fn build_image(
        &self,
        tag: &str,
        context: &BuildContext,
    ) -> Result<(ImageHandle, String), RuntimeError> {
        let tar_data = Self::create_build_context(context)?;

        let options = BuildImageOptions {
            dockerfile: context.dockerfile.clone(),
            t: Some(tag.to_string()),
            ..Default::default()
        };

        let body = Either::Left(Full::new(Bytes::from(tar_data)));
        let mut build_stream = self.client.build_image(options, None, Some(body));

        let mut log = String::new();
        while let Some(result) = build_stream.next().await {
            let info = result.map_err(map_engine_error)?;
            if let Some(line) = info.stream {
                log.push_str(&line);
            }
            if let Some(detail) = info.error_detail {
                return Err(RuntimeError::OperationFailed(format!(
                    "build of {} failed: {}",
                    tag,
                    detail.message.unwrap_or_default()
                )));
            }
        }

        Ok((ImageHandle::new(tag), log))
    }

    async fn remove_image(&self, tag: &str) -> Result<(), RuntimeError> {
        let result = self
            .client
            .remove_image(tag, Some(RemoveImageOptions::default()), None)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(map_engine_error(e)),
        }
    }

    async fn create_container(
        &self,
        image_ref: &str,
        name: &str,
    ) -> Result<ContainerHandle, RuntimeError> {
        let opts = CreateContainerOptions {
            name: Some(name.to_string()),
            ..Default::default()
        };

        let body = ContainerCreateBody {
            image: Some(image_ref.to_string()),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), body)
            .await
            .map_err(map_engine_error)?;

        Ok(ContainerHandle::new(response.id))
    }

    async fn start_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError> {
        self.client
            .start_container(
                handle.as_str(),
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
            .map_err(map_engine_error)
    }

    async fn wait_for_exit(&self, handle: &ContainerHandle) -> Result<i64, RuntimeError> {
        let mut stream = self.client.wait_container(
            handle.as_str(),
            None::<bollard::query_parameters::WaitContainerOptions>,
        );

        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            Some(Err(e)) => Err(map_engine_error(e)),
            None => Err(RuntimeError::OperationFailed(format!(
                "wait on {} ended without a status",
                handle
            ))),
        }
    }

    async fn fetch_logs(&self, handle: &ContainerHandle) -> Result<String, RuntimeError> {
        let opts = LogsOptions {
            stdout: true,
            stderr: true,
            follow: false,
            tail: "all".to_string(),
            ..Default::default()
        };

        let mut stream = self.client.logs(handle.as_str(), Some(opts));

        let mut text = String::new();
        while let Some(result) = stream.next().await {
            let output = result.map_err(map_engine_error)?;
            text.push_str(&String::from_utf8_lossy(&output.into_bytes()));
        }

        Ok(text)
    }

    async fn stop_container(
        &self,
        handle: &ContainerHandle,
        timeout: Duration,
    ) -> Result<(), RuntimeError> {
        let opts = StopContainerOptions {
            t: Some(timeout.as_secs() as i32),
            signal: None,
        };

        let result = self.client.stop_container(handle.as_str(), Some(opts)).await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) || is_not_modified(&e) => Ok(()),
            Err(e) => Err(map_engine_error(e)),
        }
    }

    async fn remove_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError> {
        let result = self
            .client
            .remove_container(handle.as_str(), Some(RemoveContainerOptions::default()))
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(map_engine_error(e)),
        }
    }

    async fn inspect(&self, name: &str) -> Result<Option<ContainerDescriptor>, RuntimeError> {
        let result = self
            .client
            .inspect_container(name, None::<InspectContainerOptions>)
            .await;

        let details = match result {
            Ok(details) => details,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(map_engine_error(e)),
        };

        let state = details
            .state
            .as_ref()
            .and_then(|s| s.status)
            .map(|s| match s {
                bollard::models::ContainerStateStatusEnum::CREATED => ContainerState::Created,
                bollard::models::ContainerStateStatusEnum::RUNNING => ContainerState::Running,
                bollard::models::ContainerStateStatusEnum::PAUSED => ContainerState::Paused,
                bollard::models::ContainerStateStatusEnum::RESTARTING => ContainerState::Restarting,
                bollard::models::ContainerStateStatusEnum::REMOVING => ContainerState::Removing,
                bollard::models::ContainerStateStatusEnum::EXITED => ContainerState::Exited,
                bollard::models::ContainerStateStatusEnum::DEAD => ContainerState::Dead,
                _ => ContainerState::Exited,
            })
            .unwrap_or(ContainerState::Exited);

        Ok(Some(ContainerDescriptor {
            handle: ContainerHandle::new(details.id.unwrap_or_else(|| name.to_string())),
            name: details
                .name
                .unwrap_or_else(|| name.to_string())
                .trim_start_matches('/')
                .to_string(),
            state,
        }))
    }
}

// ABOUTME: Container engine adapter layer.
// ABOUTME: Exposes the RuntimeClient trait and the bollard-backed implementation.

mod bollard;
mod client;
mod error;

pub use bollard::BollardClient;
pub use client::{BuildContext, ContainerDescriptor, ContainerState, RuntimeClient};
pub use error::RuntimeError;

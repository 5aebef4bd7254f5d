// ABOUTME: Validated domain types shared across the pipeline core.
// ABOUTME: Uses phantom types to prevent handle confusion at compile time.

mod event;
mod handle;
mod identity;

pub use event::{EventError, VerifiedEvent};
pub use handle::{ContainerHandle, ImageHandle};
pub use identity::{IdentityError, ProjectIdentity};

// ABOUTME: Per-identity serialization locks for deploy swaps and image rebuilds.
// ABOUTME: Lazily created, retained for process lifetime.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

use crate::types::ProjectIdentity;

/// Process-wide table of per-identity locks.
///
/// Deploy swaps and the Build stage's remove+rebuild both hold the
/// identity's lock, so an image is never rebuilt while a container from
/// it is mid-swap. Different identities never contend. Entries are
/// created on first use and kept for the life of the process.
#[derive(Default)]
pub struct LockTable {
    inner: Mutex<HashMap<ProjectIdentity, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, identity: &ProjectIdentity) -> Arc<tokio::sync::Mutex<()>> {
        self.inner
            .lock()
            .entry(identity.clone())
            .or_default()
            .clone()
    }

    /// Wait for and hold the identity's lock. The guard releases on drop.
    pub async fn acquire(&self, identity: &ProjectIdentity) -> OwnedMutexGuard<()> {
        self.entry(identity).lock_owned().await
    }
}

// ABOUTME: Verified push event handed to the pipeline core by the gateway.
// ABOUTME: Immutable once constructed; parsed from the raw webhook payload.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed push payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("push payload missing field: {0}")]
    MissingField(&'static str),
}

/// A push notification that has already passed the signature gate.
///
/// Constructed by the gateway, consumed read-only by the core. The raw
/// payload is retained for the run report only.
#[derive(Debug, Clone)]
pub struct VerifiedEvent {
    pub owner_name: String,
    pub repo_name: String,
    pub full_name: String,
    pub commit_id: String,
    pub git_ref: String,
    pub raw_payload: String,
}

// Wire shape of the fields we extract from a push payload.
#[derive(Deserialize)]
struct PushPayload {
    repository: Repository,
    after: Option<String>,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

#[derive(Deserialize)]
struct Repository {
    name: String,
    full_name: String,
    owner: Owner,
}

#[derive(Deserialize)]
struct Owner {
    // Push payloads carry `name`; other event families only `login`.
    name: Option<String>,
    login: Option<String>,
}

impl VerifiedEvent {
    /// Parse a raw push payload body into an event.
    ///
    /// Only called after signature verification has accepted the body.
    pub fn from_push_payload(body: &[u8]) -> Result<Self, EventError> {
        let payload: PushPayload = serde_json::from_slice(body)?;

        let owner_name = payload
            .repository
            .owner
            .name
            .or(payload.repository.owner.login)
            .ok_or(EventError::MissingField("repository.owner.name"))?;

        let commit_id = payload.after.ok_or(EventError::MissingField("after"))?;
        let git_ref = payload.git_ref.ok_or(EventError::MissingField("ref"))?;

        Ok(Self {
            owner_name,
            repo_name: payload.repository.name,
            full_name: payload.repository.full_name,
            commit_id,
            git_ref,
            raw_payload: String::from_utf8_lossy(body).into_owned(),
        })
    }

    /// Short commit id for log lines and report headers. Falls back to
    /// the full id when byte 7 is not a char boundary.
    pub fn short_commit(&self) -> &str {
        self.commit_id.get(..7).unwrap_or(&self.commit_id)
    }
}

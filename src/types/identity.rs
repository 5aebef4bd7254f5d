// ABOUTME: Canonical per-project naming key derived from a push event.
// ABOUTME: Used as container name, image tag, and serialization lock key.

use std::fmt;
use thiserror::Error;

use super::VerifiedEvent;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("owner name cannot be empty")]
    EmptyOwner,

    #[error("repository name cannot be empty")]
    EmptyRepo,

    #[error("identity exceeds maximum length of 63 characters")]
    TooLong,

    #[error("invalid character in identity: '{0}'")]
    InvalidChar(char),
}

/// Canonical project key in the form `lower(owner)-lower(repo)`.
///
/// Derivation is a pure function of the event: two events differing only
/// in the case of owner or repository name yield the same identity. The
/// value doubles as the engine-side container name and image tag, so it
/// is restricted to characters both accept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectIdentity(String);

impl ProjectIdentity {
    /// Derive the identity from a verified event. No I/O.
    pub fn from_event(event: &VerifiedEvent) -> Result<Self, IdentityError> {
        Self::new(&event.owner_name, &event.repo_name)
    }

    pub fn new(owner: &str, repo: &str) -> Result<Self, IdentityError> {
        if owner.trim().is_empty() {
            return Err(IdentityError::EmptyOwner);
        }
        if repo.trim().is_empty() {
            return Err(IdentityError::EmptyRepo);
        }

        let value = format!("{}-{}", owner.to_lowercase(), repo.to_lowercase());

        if value.len() > 63 {
            return Err(IdentityError::TooLong);
        }

        for c in value.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '_' && c != '.' {
                return Err(IdentityError::InvalidChar(c));
            }
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Image tag for the throwaway test-stage image.
    ///
    /// Kept distinct from the deployable tag so a test build can never be
    /// picked up by a deploy swap.
    pub fn test_tag(&self) -> String {
        format!("{}-test", self.0)
    }
}

impl fmt::Display for ProjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Participant session identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque participant identifier embedded in interaction records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Generate a fresh random identifier (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One participant's session. The identifier is fixed for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSession {
    participant_id: ParticipantId,
}

impl ParticipantSession {
    /// Start a session with a newly generated identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(ParticipantId::generate())
    }

    /// Resume a session with a known identifier.
    #[must_use]
    pub const fn with_id(participant_id: ParticipantId) -> Self {
        Self { participant_id }
    }

    /// The session's participant identifier.
    #[must_use]
    pub const fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }
}

impl Default for ParticipantSession {
    fn default() -> Self {
        Self::new()
    }
}

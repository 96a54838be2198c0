use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque participant identifier assigned by the signaling relay.
/// Unique per room membership, immutable once assigned.
///
/// `Ord` so that glare tie-breaking can compare the two sides of a
/// connection deterministically.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Random identifier, used by tests and local tooling. Real ids come
    /// from the relay.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

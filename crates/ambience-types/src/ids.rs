//! Type-safe identifiers.
//!
//! Actors are identified by the host's own UUID (a player's account UUID in
//! a game server). The engine never stores references to host objects, only
//! these ids, and asks the accessor to re-resolve the entity every tick.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a tracked actor (usually a player).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Create a fresh random identifier (tests, simulated hosts).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ActorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ActorId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ActorId> for Uuid {
    fn from(id: ActorId) -> Self {
        id.0
    }
}

/// Opaque handle to a host entity returned by region enumeration.
///
/// The engine only passes it back to the accessor to look up the entity's
/// type; it carries no meaning of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef(pub u64);

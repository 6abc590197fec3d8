//! Identity types for simulated entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a simulated entity
///
/// The server hands these out in connection order, so the id doubles as the
/// entity's index in the server's entity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create a new entity ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Position of this entity in an id-indexed list
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for EntityId {
    fn from(index: usize) -> Self {
        Self(index as u64)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id() {
        let id = EntityId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.index(), 42);
        assert_eq!(format!("{}", id), "entity:42");
        assert_eq!(EntityId::from(3usize), EntityId(3));
    }
}

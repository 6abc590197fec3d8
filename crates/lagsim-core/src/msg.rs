//! Message types exchanged between clients and the server
//!
//! Messages are plain values. A `WorldState` owns deep copies of everything
//! it reports, so a receiver can never observe or mutate server state.

use crate::{Entity, EntityId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single control sample sent from a client to the server
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// Per-client sequence number, increasing by one per emitted input
    pub sequence_number: u64,
    /// Seconds the control was held; negative moves left
    pub press_duration: f64,
    /// Entity the input drives
    pub entity_id: EntityId,
}

impl Input {
    /// Create a new input
    pub fn new(sequence_number: u64, press_duration: f64, entity_id: EntityId) -> Self {
        Self {
            sequence_number,
            press_duration,
            entity_id,
        }
    }
}

/// Authoritative snapshot of every entity at one server tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    sequence_number: u64,
    entities: Vec<Entity>,
    last_processed_input: IndexMap<EntityId, u64>,
}

impl WorldState {
    /// Build a snapshot by copying the given entities and acknowledgement map
    pub fn capture(
        sequence_number: u64,
        entities: &[Entity],
        last_processed_input: &IndexMap<EntityId, u64>,
    ) -> Self {
        Self {
            sequence_number,
            entities: entities.to_vec(),
            last_processed_input: last_processed_input.clone(),
        }
    }

    /// Server tick sequence number of this snapshot
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Entities in id order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Look up one entity by id
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Highest input sequence number the server has applied for `id`
    ///
    /// `None` until the server has accepted at least one input for that entity.
    pub fn last_processed_input(&self, id: EntityId) -> Option<u64> {
        self.last_processed_input.get(&id).copied()
    }

    /// The full acknowledgement map
    pub fn acknowledgements(&self) -> &IndexMap<EntityId, u64> {
        &self.last_processed_input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_is_a_copy() {
        let mut entities = vec![
            Entity::new(EntityId(0), 5.0, 2.0),
            Entity::new(EntityId(1), 5.0, 2.0),
        ];
        let mut acks = IndexMap::new();
        acks.insert(EntityId(0), 7);

        let snapshot = WorldState::capture(3, &entities, &acks);

        entities[0].position = 99.0;
        acks.insert(EntityId(0), 8);

        assert_eq!(snapshot.sequence_number(), 3);
        assert_eq!(snapshot.entity(EntityId(0)).map(|e| e.position), Some(5.0));
        assert_eq!(snapshot.last_processed_input(EntityId(0)), Some(7));
        assert_eq!(snapshot.last_processed_input(EntityId(1)), None);
    }

    #[test]
    fn test_world_state_ron_shape() {
        let mut acks = IndexMap::new();
        acks.insert(EntityId(0), 2);
        let snapshot = WorldState::capture(1, &[Entity::new(EntityId(0), 1.5, 2.0)], &acks);

        let text = ron::to_string(&snapshot).unwrap();
        let back: WorldState = ron::from_str(&text).unwrap();
        assert_eq!(back, snapshot);
    }
}

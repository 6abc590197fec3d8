//! The simulated entity

use crate::{EntityId, Input};
use serde::{Deserialize, Serialize};

/// A minimal simulated object moving along one axis
///
/// Each actor owns its own copies; nothing here is ever shared by reference
/// between the server and a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Identity (never overwritten after creation)
    pub id: EntityId,
    /// Position on the track
    pub position: f64,
    /// Units moved per second of key press; constant after creation
    pub speed: f64,
}

impl Entity {
    /// Create an entity at `position`
    pub fn new(id: EntityId, position: f64, speed: f64) -> Self {
        Self {
            id,
            position,
            speed,
        }
    }

    /// Advance by one input: `position += press_duration * speed`
    pub fn apply_input(&mut self, input: &Input) {
        self.position += input.press_duration * self.speed;
    }

    /// Linear blend between two observations of the same entity
    ///
    /// `factor == 0` yields `prev`'s values and `factor == 1` yields `curr`'s
    /// values exactly. Factors outside `[0, 1]` extrapolate.
    pub fn lerp(prev: &Entity, curr: &Entity, factor: f64) -> Entity {
        Entity {
            id: curr.id,
            position: lerp(prev.position, curr.position, factor),
            speed: lerp(prev.speed, curr.speed, factor),
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_input() {
        let mut entity = Entity::new(EntityId(0), 5.0, 2.0);
        entity.apply_input(&Input::new(0, 0.25, EntityId(0)));
        assert_eq!(entity.position, 5.5);

        entity.apply_input(&Input::new(1, -0.5, EntityId(0)));
        assert_eq!(entity.position, 4.5);
        assert_eq!(entity.speed, 2.0);
    }

    #[test]
    fn test_lerp_endpoints_are_exact() {
        let prev = Entity::new(EntityId(1), 0.1, 2.0);
        let curr = Entity::new(EntityId(1), 0.7, 2.0);

        assert_eq!(Entity::lerp(&prev, &curr, 0.0).position, 0.1);
        assert_eq!(Entity::lerp(&prev, &curr, 1.0).position, 0.7);
        assert!((Entity::lerp(&prev, &curr, 0.5).position - 0.4).abs() < 1e-12);
    }
}

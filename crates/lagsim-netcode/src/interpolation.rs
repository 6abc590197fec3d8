//! Entity interpolation for remote entities
//!
//! Keeps the two most recent snapshots with their local receipt times and
//! blends remote entities between them. Remote entities are therefore shown
//! one server update in the past, always between two real data points.

use lagsim_core::{Entity, EntityId, Timestamp, WorldState};

/// A snapshot together with the local time it was processed
#[derive(Debug, Clone, PartialEq)]
pub struct SavedWorldState {
    /// Local time of receipt
    pub received_at: Timestamp,
    /// The snapshot
    pub snapshot: WorldState,
}

/// Holds the previous and current snapshots
#[derive(Debug, Default)]
pub struct Interpolator {
    previous: Option<SavedWorldState>,
    current: Option<SavedWorldState>,
}

impl Interpolator {
    /// Create an empty interpolator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly processed snapshot, discarding the oldest one kept
    pub fn push_state(&mut self, received_at: Timestamp, snapshot: WorldState) {
        self.previous = self.current.take();
        self.current = Some(SavedWorldState {
            received_at,
            snapshot,
        });
    }

    /// Blend factor for `now`
    ///
    /// `(now - current.received_at) / (current.received_at - previous.received_at)`,
    /// or exactly `1.0` when both snapshots were received at the same instant.
    /// `None` until two snapshots have been recorded.
    pub fn factor(&self, now: Timestamp) -> Option<f64> {
        let (previous, current) = self.pair()?;
        let span = current.received_at.seconds_since(previous.received_at);
        let factor = now.seconds_since(current.received_at) / span;
        if span == 0.0 || !factor.is_finite() {
            Some(1.0)
        } else {
            Some(factor)
        }
    }

    /// Display copies of every entity in the current snapshot except `exclude`
    ///
    /// Entities missing from the previous snapshot are shown at their current
    /// values.
    pub fn interpolate(&self, now: Timestamp, exclude: EntityId) -> Option<Vec<Entity>> {
        let factor = self.factor(now)?;
        let (previous, current) = self.pair()?;

        let entities = current
            .snapshot
            .entities()
            .iter()
            .filter(|e| e.id != exclude)
            .map(|curr| match previous.snapshot.entity(curr.id) {
                Some(prev) => Entity::lerp(prev, curr, factor),
                None => curr.clone(),
            })
            .collect();
        Some(entities)
    }

    /// The older of the two retained snapshots
    pub fn previous(&self) -> Option<&SavedWorldState> {
        self.previous.as_ref()
    }

    /// The newest snapshot
    pub fn current(&self) -> Option<&SavedWorldState> {
        self.current.as_ref()
    }

    /// Check if interpolation is possible (have both states)
    pub fn can_interpolate(&self) -> bool {
        self.previous.is_some() && self.current.is_some()
    }

    fn pair(&self) -> Option<(&SavedWorldState, &SavedWorldState)> {
        Some((self.previous.as_ref()?, self.current.as_ref()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn snapshot(seq: u64, positions: &[f64]) -> WorldState {
        let entities: Vec<Entity> = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| Entity::new(EntityId::from(i), p, 2.0))
            .collect();
        WorldState::capture(seq, &entities, &IndexMap::new())
    }

    #[test]
    fn test_needs_two_snapshots() {
        let mut interpolator = Interpolator::new();
        interpolator.push_state(Timestamp::from_millis(0), snapshot(1, &[0.0, 0.0]));
        assert!(!interpolator.can_interpolate());
        assert_eq!(interpolator.factor(Timestamp::from_millis(10)), None);
        assert!(interpolator
            .interpolate(Timestamp::from_millis(10), EntityId(0))
            .is_none());
    }

    #[test]
    fn test_blends_between_snapshots() {
        let mut interpolator = Interpolator::new();
        interpolator.push_state(Timestamp::from_millis(0), snapshot(1, &[0.0, 1.0]));
        interpolator.push_state(Timestamp::from_millis(200), snapshot(2, &[0.0, 2.0]));

        let now = Timestamp::from_millis(300);
        assert!((interpolator.factor(now).unwrap() - 0.5).abs() < 1e-12);

        let shown = interpolator.interpolate(now, EntityId(0)).unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, EntityId(1));
        assert!((shown[0].position - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_same_receipt_time_uses_current_exactly() {
        let mut interpolator = Interpolator::new();
        let t = Timestamp::from_millis(500);
        interpolator.push_state(t, snapshot(1, &[0.0, 0.3]));
        interpolator.push_state(t, snapshot(2, &[0.0, 0.7]));

        assert_eq!(interpolator.factor(t), Some(1.0));
        let shown = interpolator.interpolate(t, EntityId(0)).unwrap();
        assert_eq!(shown[0].position, 0.7);
        assert!(!shown[0].position.is_nan());
    }

    #[test]
    fn test_new_entity_shown_at_current_value() {
        let mut interpolator = Interpolator::new();
        interpolator.push_state(Timestamp::from_millis(0), snapshot(1, &[0.0]));
        interpolator.push_state(Timestamp::from_millis(100), snapshot(2, &[0.0, 4.0]));

        let shown = interpolator
            .interpolate(Timestamp::from_millis(150), EntityId(0))
            .unwrap();
        assert_eq!(shown[0].position, 4.0);
    }

    #[test]
    fn test_keeps_only_two() {
        let mut interpolator = Interpolator::new();
        interpolator.push_state(Timestamp::from_millis(0), snapshot(1, &[0.0]));
        interpolator.push_state(Timestamp::from_millis(100), snapshot(2, &[0.0]));
        interpolator.push_state(Timestamp::from_millis(200), snapshot(3, &[0.0]));

        assert_eq!(
            interpolator.previous().map(|s| s.snapshot.sequence_number()),
            Some(2)
        );
        assert_eq!(
            interpolator.current().map(|s| s.snapshot.sequence_number()),
            Some(3)
        );
        assert!(interpolator.can_interpolate());
    }
}

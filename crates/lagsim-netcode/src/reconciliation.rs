//! Server reconciliation
//!
//! Corrects the client's own entity when an authoritative snapshot arrives:
//! adopt the server's position, forget the inputs the server has already
//! applied, and replay the rest on top.

use crate::PendingInputs;
use lagsim_core::Entity;

/// What one reconciliation pass did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reconciliation {
    /// Inputs acknowledged by the snapshot and dropped
    pub dropped: usize,
    /// Inputs replayed on top of the authoritative position
    pub replayed: usize,
    /// Displayed position after the pass minus the position before it
    pub correction: f64,
}

/// Reconcile `local` against the authoritative `server` view of the same entity
///
/// `acknowledged` is the highest input sequence number the server reports as
/// applied for this entity; `None` means the server has applied none yet and
/// every pending input is replayed.
pub fn reconcile(
    local: &mut Entity,
    server: &Entity,
    acknowledged: Option<u64>,
    pending: &mut PendingInputs,
) -> Reconciliation {
    let before = local.position;
    local.position = server.position;

    let dropped = acknowledged.map_or(0, |seq| pending.acknowledge(seq));
    for input in pending.iter() {
        local.apply_input(input);
    }

    Reconciliation {
        dropped,
        replayed: pending.len(),
        correction: local.position - before,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lagsim_core::{EntityId, Input};

    #[test]
    fn test_replays_only_unacknowledged() {
        let id = EntityId(0);
        let mut pending = PendingInputs::new();
        pending.push(Input::new(5, 0.01, id));
        pending.push(Input::new(6, 0.02, id));
        pending.push(Input::new(7, 0.015, id));

        let mut local = Entity::new(id, 9.0, 2.0);
        let server = Entity::new(id, 6.0, 2.0);

        let outcome = reconcile(&mut local, &server, Some(6), &mut pending);

        assert_eq!(pending.len(), 1);
        assert_eq!(pending.oldest(), Some(7));
        assert_eq!(local.position, 6.0 + 0.015 * 2.0);
        assert_eq!(outcome.dropped, 2);
        assert_eq!(outcome.replayed, 1);
    }

    #[test]
    fn test_no_acknowledgement_replays_everything() {
        let id = EntityId(1);
        let mut pending = PendingInputs::new();
        pending.push(Input::new(0, 0.01, id));
        pending.push(Input::new(1, 0.01, id));

        let mut local = Entity::new(id, 5.04, 2.0);
        let server = Entity::new(id, 5.0, 2.0);

        let outcome = reconcile(&mut local, &server, None, &mut pending);
        assert_eq!(outcome.replayed, 2);
        assert!((local.position - 5.04).abs() < 1e-12);
        assert!(outcome.correction.abs() < 1e-12);
    }

    #[test]
    fn test_identity_is_never_overwritten() {
        let mut local = Entity::new(EntityId(2), 1.0, 2.0);
        let server = Entity::new(EntityId(2), 3.0, 2.0);
        reconcile(&mut local, &server, Some(0), &mut PendingInputs::new());
        assert_eq!(local.id, EntityId(2));
        assert_eq!(local.position, 3.0);
    }
}

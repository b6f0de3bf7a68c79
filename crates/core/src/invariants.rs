//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{PendingAssignment, Slot};
use crate::projection::SlotProjection;

/// Validate that a slot's availability flag agrees with its holder
pub fn assert_slot_invariants(slot: &Slot) {
    debug_assert!(
        slot.is_consistent(),
        "Slot {} has is_available={} but reserved_by={:?}",
        slot.slot_id,
        slot.is_available,
        slot.reserved_by
    );

    debug_assert!(
        !slot.slot_id.as_str().is_empty(),
        "Slot with empty id"
    );
}

/// Validate every slot of a projection
pub fn assert_projection_invariants(projection: &SlotProjection) {
    for (key, slot) in projection.iter() {
        debug_assert!(
            key.slot_id == slot.slot_id,
            "Projection key {} points at slot {}",
            key,
            slot.slot_id
        );
        assert_slot_invariants(slot);
    }

    // Every slot belongs to a known team
    debug_assert!(
        projection
            .iter()
            .all(|(key, _)| projection.team(&key.team_id).is_some()),
        "Projection holds a slot of an unknown team"
    );
}

/// Validate that a pending assignment snapshot belongs to its target
pub fn assert_pending_invariants(pending: &PendingAssignment) {
    debug_assert!(
        pending.key.slot_id == pending.previous.slot_id,
        "Pending {} for {} captured snapshot of slot {}",
        pending.id,
        pending.key,
        pending.previous.slot_id
    );
    assert_slot_invariants(&pending.previous);
}

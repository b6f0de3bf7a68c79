//! Conflict reconciliation
//!
//! The backend is the only arbiter of slot ownership. When it refuses a
//! commit, the optimistic change is reverted and the participant is told why.
//! No alternative slot is picked on their behalf.

use tracing::warn;

use crate::error::BackendError;
use crate::invariants;
use crate::models::{Notification, PendingAssignment, ReservationKind};
use crate::projection::SlotProjection;

/// Revert a failed optimistic action and describe the failure
pub fn reconcile(
    projection: &mut SlotProjection,
    pending: &PendingAssignment,
    reason: &BackendError,
) -> Notification {
    invariants::assert_pending_invariants(pending);
    projection.rollback(pending);

    let message = failure_message(reason);
    warn!(
        slot = %pending.key,
        action = pending.kind.verb(),
        error = %reason,
        "Reservation rolled back"
    );

    Notification::error(message, Some(pending.key.clone()))
}

/// Human-readable text for a failed commit
pub fn failure_message(reason: &BackendError) -> String {
    match reason {
        BackendError::Rejected {
            message: Some(message),
            ..
        } if !message.trim().is_empty() => message.clone(),
        BackendError::Rejected { status, .. } => match status {
            409 => "Slot already reserved by another participant".to_string(),
            401 | 403 => "You are not allowed to change this slot".to_string(),
            404 => "This slot no longer exists".to_string(),
            other => format!("The server rejected the request (status {})", other),
        },
        BackendError::Network(_) => "Could not reach the server".to_string(),
        BackendError::Timeout(_) => "The server did not respond in time".to_string(),
        BackendError::Decode(_) => "The server sent an unexpected response".to_string(),
        BackendError::InvalidRequest(detail) => format!("Invalid request: {}", detail),
    }
}

/// Human-readable text for a committed action
pub fn success_message(pending: &PendingAssignment) -> String {
    match &pending.kind {
        ReservationKind::Book => format!("Booked {}", pending.key),
        ReservationKind::Release => format!("Released {}", pending.key),
        ReservationKind::Assign { holder } => format!("Assigned {} to {}", holder, pending.key),
    }
}

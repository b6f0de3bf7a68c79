//! Reservation coordinator
//!
//! State machine for a single reservation action:
//!
//! ```text
//! Idle/Committed --select--> Selected --confirm--> Confirming --ok--> Committed
//!                               |                      |
//!                            cancel                  failure (rolled back)
//!                               v                      v
//!                              Idle                   Idle
//! ```
//!
//! The coordinator does no I/O. `confirm` applies the optimistic change and
//! hands back the request to send; the caller reports the backend's answer
//! through `complete`. At most one commit is in flight per coordinator.

use tracing::{debug, info};

use crate::error::{BackendError, ReservationError};
use crate::invariants;
use crate::models::{
    ActorId, CommitRequest, Notification, PendingAssignment, ReservationKind, Slot, SlotKey,
};
use crate::projection::{SlotMutation, SlotProjection};
use crate::reconcile;

type Result<T> = std::result::Result<T, ReservationError>;

/// A slot the participant picked but has not confirmed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub key: SlotKey,
    pub kind: ReservationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationState {
    Idle,
    Selected(Selection),
    /// Optimistic change applied, waiting for the backend
    Confirming {
        pending: PendingAssignment,
        /// Selection of an unrelated slot made while waiting
        queued: Option<Selection>,
    },
    /// Last action was accepted by the backend
    Committed { key: SlotKey, kind: ReservationKind },
}

impl ReservationState {
    pub fn name(&self) -> &'static str {
        match self {
            ReservationState::Idle => "idle",
            ReservationState::Selected(_) => "selected",
            ReservationState::Confirming { .. } => "confirming",
            ReservationState::Committed { .. } => "committed",
        }
    }
}

/// Result of reporting the backend's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(Notification),
    RolledBack(Notification),
}

impl CommitOutcome {
    pub fn notification(&self) -> &Notification {
        match self {
            CommitOutcome::Committed(n) | CommitOutcome::RolledBack(n) => n,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed(_))
    }
}

pub struct ReservationCoordinator {
    actor: ActorId,
    state: ReservationState,
}

impl ReservationCoordinator {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            state: ReservationState::Idle,
        }
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    pub fn state(&self) -> &ReservationState {
        &self.state
    }

    pub fn is_confirming(&self) -> bool {
        matches!(self.state, ReservationState::Confirming { .. })
    }

    /// Slot the current selection (or queued selection) points at
    pub fn selection(&self) -> Option<&Selection> {
        match &self.state {
            ReservationState::Selected(selection) => Some(selection),
            ReservationState::Confirming { queued, .. } => queued.as_ref(),
            _ => None,
        }
    }

    /// Pick a slot for the given action
    ///
    /// While a commit is in flight, the in-flight slot cannot be selected;
    /// any other slot is queued and becomes the selection once the commit
    /// completes.
    pub fn select(
        &mut self,
        projection: &SlotProjection,
        key: SlotKey,
        kind: ReservationKind,
    ) -> Result<()> {
        if let ReservationState::Confirming { pending, .. } = &self.state {
            if pending.key == key {
                return Err(ReservationError::SlotBusy(key));
            }
        }

        self.check(projection, &key, &kind)?;
        let selection = Selection { key, kind };
        debug!(slot = %selection.key, action = selection.kind.verb(), "Slot selected");

        match &mut self.state {
            ReservationState::Confirming { queued, .. } => *queued = Some(selection),
            state => *state = ReservationState::Selected(selection),
        }
        Ok(())
    }

    /// Abandon the selection before anything is sent
    pub fn cancel(&mut self) -> Result<()> {
        match &mut self.state {
            ReservationState::Selected(selection) => {
                debug!(slot = %selection.key, "Selection cancelled");
                self.state = ReservationState::Idle;
                Ok(())
            }
            ReservationState::Confirming { queued, .. } => match queued.take() {
                Some(selection) => {
                    debug!(slot = %selection.key, "Queued selection cancelled");
                    Ok(())
                }
                None => Err(ReservationError::NotCancellable),
            },
            _ => Err(ReservationError::NothingSelected),
        }
    }

    /// Apply the selection optimistically and return the request to commit
    ///
    /// The selection is checked again against the projection; if the slot
    /// changed since it was picked, the selection is dropped.
    pub fn confirm(&mut self, projection: &mut SlotProjection) -> Result<CommitRequest> {
        let selection = match &self.state {
            ReservationState::Selected(selection) => selection.clone(),
            ReservationState::Confirming { .. } => return Err(ReservationError::CommitInFlight),
            _ => return Err(ReservationError::NothingSelected),
        };

        let previous = match self.check(projection, &selection.key, &selection.kind) {
            Ok(slot) => slot.clone(),
            Err(e) => {
                self.state = ReservationState::Idle;
                return Err(e);
            }
        };

        let pending = PendingAssignment::new(
            selection.key.clone(),
            selection.kind.clone(),
            self.actor.clone(),
            previous,
        );
        invariants::assert_pending_invariants(&pending);

        projection.apply(&SlotMutation {
            key: selection.key.clone(),
            holder: selection.kind.resulting_holder(&self.actor),
        })?;

        let request = pending.request();
        info!(slot = %pending.key, action = pending.kind.verb(), "Confirming reservation");
        self.state = ReservationState::Confirming {
            pending,
            queued: None,
        };
        Ok(request)
    }

    /// Report the backend's answer for the in-flight commit
    pub fn complete(
        &mut self,
        projection: &mut SlotProjection,
        result: std::result::Result<(), BackendError>,
    ) -> Result<CommitOutcome> {
        let (pending, queued) = match std::mem::replace(&mut self.state, ReservationState::Idle) {
            ReservationState::Confirming { pending, queued } => (pending, queued),
            other => {
                self.state = other;
                return Err(ReservationError::NoCommitInFlight);
            }
        };

        let outcome = match result {
            Ok(()) => {
                info!(slot = %pending.key, action = pending.kind.verb(), "Reservation committed");
                let notification =
                    Notification::info(reconcile::success_message(&pending), Some(pending.key.clone()));
                self.state = ReservationState::Committed {
                    key: pending.key,
                    kind: pending.kind,
                };
                CommitOutcome::Committed(notification)
            }
            Err(reason) => {
                CommitOutcome::RolledBack(reconcile::reconcile(projection, &pending, &reason))
            }
        };

        if let Some(selection) = queued {
            self.state = ReservationState::Selected(selection);
        }
        Ok(outcome)
    }

    /// Bring the state in line with a freshly loaded projection
    ///
    /// A selection survives if its slot still exists; otherwise a slot the
    /// backend reports as held puts the coordinator straight into
    /// `Committed`.
    pub fn on_reload(&mut self, projection: &SlotProjection, held: Option<SlotKey>) {
        if self.is_confirming() {
            return;
        }

        if let ReservationState::Selected(selection) = &self.state {
            if projection.contains(&selection.key) {
                return;
            }
        }

        self.state = match held {
            Some(key) if projection.contains(&key) => {
                debug!(slot = %key, "Restored committed reservation");
                ReservationState::Committed {
                    key,
                    kind: ReservationKind::Book,
                }
            }
            _ => ReservationState::Idle,
        };
    }

    fn check<'p>(
        &self,
        projection: &'p SlotProjection,
        key: &SlotKey,
        kind: &ReservationKind,
    ) -> Result<&'p Slot> {
        let slot = projection
            .get(key)
            .ok_or_else(|| ReservationError::UnknownSlot(key.clone()))?;

        if kind.requires_available() {
            if !slot.is_available {
                return Err(ReservationError::SlotUnavailable(key.clone()));
            }
        } else if !slot.is_held_by(&self.actor) {
            return Err(ReservationError::NotHeld(key.clone()));
        }

        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Catalog, Team};
    use chrono::{Duration, Utc};

    fn make_projection() -> SlotProjection {
        let start = Utc::now();
        let slot = |id: &str| Slot::new(id, start, start + Duration::minutes(15));
        let catalog = Catalog::new(vec![Team::new("t", "Team")
            .with_slot(slot("s1"))
            .with_slot(slot("s2"))
            .with_slot(slot("mine").reserved("alice"))
            .with_slot(slot("taken").reserved("bob"))]);
        SlotProjection::from_catalog(catalog).unwrap()
    }

    fn key(id: &str) -> SlotKey {
        SlotKey::new("t", id)
    }

    fn coordinator() -> ReservationCoordinator {
        ReservationCoordinator::new(ActorId::new("alice"))
    }

    #[test]
    fn test_book_success() {
        let mut projection = make_projection();
        let mut c = coordinator();

        c.select(&projection, key("s1"), ReservationKind::Book).unwrap();
        let request = c.confirm(&mut projection).unwrap();
        assert_eq!(request.key, key("s1"));
        assert!(c.is_confirming());
        // Optimistic change is visible before the answer
        assert!(projection.get(&key("s1")).unwrap().is_held_by(c.actor()));

        let outcome = c.complete(&mut projection, Ok(())).unwrap();
        assert!(outcome.is_committed());
        assert_eq!(
            c.state(),
            &ReservationState::Committed {
                key: key("s1"),
                kind: ReservationKind::Book
            }
        );
        assert_eq!(
            projection.get(&key("s1")).unwrap().reserved_by,
            Some(ActorId::new("alice"))
        );
    }

    #[test]
    fn test_rejection_rolls_back_to_idle() {
        let mut projection = make_projection();
        let before = projection.clone();
        let mut c = coordinator();

        c.select(&projection, key("s1"), ReservationKind::Book).unwrap();
        c.confirm(&mut projection).unwrap();
        let outcome = c
            .complete(
                &mut projection,
                Err(BackendError::Rejected {
                    status: 409,
                    message: Some("slot already booked".to_string()),
                }),
            )
            .unwrap();

        assert_eq!(outcome.notification().message, "slot already booked");
        assert_eq!(c.state(), &ReservationState::Idle);
        assert_eq!(projection, before);
    }

    #[test]
    fn test_select_unavailable_is_rejected() {
        let projection = make_projection();
        let mut c = coordinator();

        let err = c
            .select(&projection, key("taken"), ReservationKind::Book)
            .unwrap_err();
        assert_eq!(err, ReservationError::SlotUnavailable(key("taken")));
        assert_eq!(c.state(), &ReservationState::Idle);

        let err = c
            .select(&projection, key("nope"), ReservationKind::Book)
            .unwrap_err();
        assert!(matches!(err, ReservationError::UnknownSlot(_)));
    }

    #[test]
    fn test_release_requires_holding() {
        let mut projection = make_projection();
        let mut c = coordinator();

        assert_eq!(
            c.select(&projection, key("taken"), ReservationKind::Release),
            Err(ReservationError::NotHeld(key("taken")))
        );

        c.select(&projection, key("mine"), ReservationKind::Release)
            .unwrap();
        c.confirm(&mut projection).unwrap();
        assert!(projection.get(&key("mine")).unwrap().is_available);
        c.complete(&mut projection, Ok(())).unwrap();
        assert!(projection.get(&key("mine")).unwrap().is_available);
    }

    #[test]
    fn test_assign_places_other_holder() {
        let mut projection = make_projection();
        let mut c = coordinator();
        let kind = ReservationKind::Assign {
            holder: ActorId::new("carol"),
        };

        c.select(&projection, key("s2"), kind).unwrap();
        c.confirm(&mut projection).unwrap();
        assert_eq!(
            projection.get(&key("s2")).unwrap().reserved_by,
            Some(ActorId::new("carol"))
        );
    }

    #[test]
    fn test_cancel_before_confirm_leaves_projection() {
        let projection = make_projection();
        let before = projection.clone();
        let mut c = coordinator();

        c.select(&projection, key("s1"), ReservationKind::Book).unwrap();
        c.cancel().unwrap();
        assert_eq!(c.state(), &ReservationState::Idle);
        assert_eq!(projection, before);
        assert_eq!(c.cancel(), Err(ReservationError::NothingSelected));
    }

    #[test]
    fn test_second_confirm_is_rejected_while_in_flight() {
        let mut projection = make_projection();
        let mut c = coordinator();

        c.select(&projection, key("s1"), ReservationKind::Book).unwrap();
        c.confirm(&mut projection).unwrap();
        assert_eq!(
            c.confirm(&mut projection),
            Err(ReservationError::CommitInFlight)
        );
        assert_eq!(
            c.select(&projection, key("s1"), ReservationKind::Book),
            Err(ReservationError::SlotBusy(key("s1")))
        );
        assert_eq!(c.cancel(), Err(ReservationError::NotCancellable));
    }

    #[test]
    fn test_unrelated_selection_is_queued() {
        let mut projection = make_projection();
        let mut c = coordinator();

        c.select(&projection, key("s1"), ReservationKind::Book).unwrap();
        c.confirm(&mut projection).unwrap();
        c.select(&projection, key("s2"), ReservationKind::Book).unwrap();
        assert_eq!(c.selection().map(|s| &s.key), Some(&key("s2")));

        c.complete(&mut projection, Err(BackendError::Network("reset".into())))
            .unwrap();
        assert_eq!(
            c.state(),
            &ReservationState::Selected(Selection {
                key: key("s2"),
                kind: ReservationKind::Book
            })
        );
    }

    #[test]
    fn test_stale_selection_dropped_on_confirm() {
        let mut projection = make_projection();
        let mut c = coordinator();

        c.select(&projection, key("s1"), ReservationKind::Book).unwrap();
        projection
            .apply(&SlotMutation {
                key: key("s1"),
                holder: Some(ActorId::new("bob")),
            })
            .unwrap();

        assert_eq!(
            c.confirm(&mut projection),
            Err(ReservationError::SlotUnavailable(key("s1")))
        );
        assert_eq!(c.state(), &ReservationState::Idle);
    }

    #[test]
    fn test_complete_without_commit() {
        let mut projection = make_projection();
        let mut c = coordinator();
        assert_eq!(
            c.complete(&mut projection, Ok(())),
            Err(ReservationError::NoCommitInFlight)
        );
        assert_eq!(c.state(), &ReservationState::Idle);
    }

    #[test]
    fn test_on_reload_restores_held_slot() {
        let projection = make_projection();
        let mut c = coordinator();

        c.on_reload(&projection, Some(key("mine")));
        assert_eq!(
            c.state(),
            &ReservationState::Committed {
                key: key("mine"),
                kind: ReservationKind::Book
            }
        );

        c.on_reload(&projection, Some(key("gone")));
        assert_eq!(c.state(), &ReservationState::Idle);
    }
}

//! Reservation actions and pending optimistic records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ActorId, Slot, SlotKey};

/// What a reservation does to its slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReservationKind {
    /// Reserve an available slot for the acting participant
    Book,
    /// Give back a slot the acting participant holds
    Release,
    /// Place another participant into an available role seat
    Assign { holder: ActorId },
}

impl ReservationKind {
    pub fn verb(&self) -> &'static str {
        match self {
            ReservationKind::Book => "book",
            ReservationKind::Release => "release",
            ReservationKind::Assign { .. } => "assign",
        }
    }

    /// Holder the slot ends up with once the action commits
    pub fn resulting_holder(&self, actor: &ActorId) -> Option<ActorId> {
        match self {
            ReservationKind::Book => Some(actor.clone()),
            ReservationKind::Release => None,
            ReservationKind::Assign { holder } => Some(holder.clone()),
        }
    }

    /// Whether the action needs the slot to be free beforehand
    pub fn requires_available(&self) -> bool {
        !matches!(self, ReservationKind::Release)
    }
}

/// A request the backend has to accept or reject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub key: SlotKey,
    pub kind: ReservationKind,
}

/// Optimistic action awaiting the backend's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAssignment {
    pub id: Uuid,
    pub key: SlotKey,
    pub kind: ReservationKind,
    /// Participant performing the action
    pub actor: ActorId,
    /// Slot state before the optimistic apply
    pub previous: Slot,
    pub created_at: DateTime<Utc>,
}

impl PendingAssignment {
    pub fn new(key: SlotKey, kind: ReservationKind, actor: ActorId, previous: Slot) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            kind,
            actor,
            previous,
            created_at: Utc::now(),
        }
    }

    pub fn request(&self) -> CommitRequest {
        CommitRequest {
            key: self.key.clone(),
            kind: self.kind.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resulting_holder() {
        let me = ActorId::new("me");
        assert_eq!(ReservationKind::Book.resulting_holder(&me), Some(me.clone()));
        assert_eq!(ReservationKind::Release.resulting_holder(&me), None);

        let assign = ReservationKind::Assign {
            holder: ActorId::new("usher-7"),
        };
        assert_eq!(assign.resulting_holder(&me), Some(ActorId::new("usher-7")));
        assert!(assign.requires_available());
        assert!(!ReservationKind::Release.requires_available());
    }
}

//! Slot model - one reservable unit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActorId, SlotId};

/// An interview time window or an open role seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub slot_id: SlotId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_available: bool,
    /// Current holder, absent while available
    #[serde(default)]
    pub reserved_by: Option<ActorId>,
}

/// How a slot looks from one participant's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Available,
    Mine,
    Taken,
}

impl SlotStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Mine => "yours",
            SlotStatus::Taken => "taken",
        }
    }
}

impl Slot {
    pub fn new(slot_id: impl Into<SlotId>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            slot_id: slot_id.into(),
            start_time,
            end_time,
            is_available: true,
            reserved_by: None,
        }
    }

    pub fn reserved(mut self, holder: impl Into<ActorId>) -> Self {
        self.hold(holder.into());
        self
    }

    /// Availability flag and holder agree
    pub fn is_consistent(&self) -> bool {
        self.is_available == self.reserved_by.is_none()
    }

    pub fn is_held_by(&self, actor: &ActorId) -> bool {
        self.reserved_by.as_ref() == Some(actor)
    }

    pub fn status_for(&self, actor: &ActorId) -> SlotStatus {
        match &self.reserved_by {
            None => SlotStatus::Available,
            Some(holder) if holder == actor => SlotStatus::Mine,
            Some(_) => SlotStatus::Taken,
        }
    }

    pub fn hold(&mut self, holder: ActorId) {
        self.reserved_by = Some(holder);
        self.is_available = false;
    }

    pub fn free(&mut self) {
        self.reserved_by = None;
        self.is_available = true;
    }
}

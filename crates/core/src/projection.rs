//! Local slot projection
//!
//! In-memory copy of the backend's slot state for the current view. It is
//! rebuilt from scratch on every catalog load and otherwise only changed by
//! the reservation coordinator (optimistic apply and rollback).

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::error::{Error, ReservationError, Result};
use crate::invariants;
use crate::models::{ActorId, Catalog, PendingAssignment, Slot, SlotKey, SlotStatus, TeamId};

/// Display metadata of a team, without its slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamInfo {
    pub team_id: TeamId,
    pub name: String,
    pub description: Option<String>,
}

/// Change of a single slot's holder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMutation {
    pub key: SlotKey,
    /// New holder, `None` frees the slot
    pub holder: Option<ActorId>,
}

/// Slot state for one collection, keyed by team and slot id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotProjection {
    teams: Vec<TeamInfo>,
    slots: BTreeMap<SlotKey, Slot>,
}

impl SlotProjection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a projection from a freshly fetched catalog
    ///
    /// Fails if the catalog repeats a team or slot, or carries a slot whose
    /// availability flag disagrees with its holder.
    pub fn from_catalog(catalog: Catalog) -> Result<Self> {
        let mut teams = Vec::with_capacity(catalog.teams.len());
        let mut slots = BTreeMap::new();
        let mut seen_teams = HashSet::new();

        for team in catalog.teams {
            if !seen_teams.insert(team.team_id.clone()) {
                return Err(Error::InvalidCatalog(format!(
                    "duplicate team {}",
                    team.team_id
                )));
            }

            for slot in team.slots {
                let key = SlotKey {
                    team_id: team.team_id.clone(),
                    slot_id: slot.slot_id.clone(),
                };
                if !slot.is_consistent() {
                    return Err(Error::InvalidCatalog(format!(
                        "slot {} availability disagrees with its holder",
                        key
                    )));
                }
                if slot.end_time < slot.start_time {
                    return Err(Error::InvalidCatalog(format!(
                        "slot {} ends before it starts",
                        key
                    )));
                }
                if slots.contains_key(&key) {
                    return Err(Error::InvalidCatalog(format!("duplicate slot {}", key)));
                }
                slots.insert(key, slot);
            }

            teams.push(TeamInfo {
                team_id: team.team_id,
                name: team.name,
                description: team.description,
            });
        }

        debug!(teams = teams.len(), slots = slots.len(), "Projection built");

        Ok(Self { teams, slots })
    }

    pub fn get(&self, key: &SlotKey) -> Option<&Slot> {
        self.slots.get(key)
    }

    pub fn contains(&self, key: &SlotKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Apply an optimistic change in place
    pub fn apply(&mut self, mutation: &SlotMutation) -> std::result::Result<(), ReservationError> {
        let slot = self
            .slots
            .get_mut(&mutation.key)
            .ok_or_else(|| ReservationError::UnknownSlot(mutation.key.clone()))?;

        match &mutation.holder {
            Some(holder) => slot.hold(holder.clone()),
            None => slot.free(),
        }
        invariants::assert_slot_invariants(slot);

        debug!(slot = %mutation.key, holder = ?mutation.holder, "Applied optimistic mutation");
        Ok(())
    }

    /// Restore the slot snapshot captured before the optimistic apply
    pub fn rollback(&mut self, pending: &PendingAssignment) {
        match self.slots.get_mut(&pending.key) {
            Some(slot) => {
                *slot = pending.previous.clone();
                debug!(slot = %pending.key, "Rolled back optimistic mutation");
            }
            None => {
                debug!(slot = %pending.key, "Rollback target no longer in projection");
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.teams.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn teams(&self) -> &[TeamInfo] {
        &self.teams
    }

    pub fn team(&self, team_id: &TeamId) -> Option<&TeamInfo> {
        self.teams.iter().find(|t| &t.team_id == team_id)
    }

    /// Slots of one team, earliest first
    pub fn slots_of(&self, team_id: &TeamId) -> Vec<(&SlotKey, &Slot)> {
        let mut slots: Vec<_> = self
            .slots
            .iter()
            .filter(|(key, _)| &key.team_id == team_id)
            .collect();
        slots.sort_by(|a, b| {
            a.1.start_time
                .cmp(&b.1.start_time)
                .then_with(|| a.0.slot_id.cmp(&b.0.slot_id))
        });
        slots
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotKey, &Slot)> {
        self.slots.iter()
    }

    /// First slot (in key order) held by the given participant
    pub fn held_by(&self, actor: &ActorId) -> Option<&SlotKey> {
        self.slots
            .iter()
            .find(|(_, slot)| slot.is_held_by(actor))
            .map(|(key, _)| key)
    }

    pub fn status_for(&self, key: &SlotKey, actor: &ActorId) -> Option<SlotStatus> {
        self.get(key).map(|slot| slot.status_for(actor))
    }

    pub fn available_count(&self) -> usize {
        self.slots.values().filter(|s| s.is_available).count()
    }
}

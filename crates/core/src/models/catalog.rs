//! Team and catalog models

use serde::{Deserialize, Serialize};

use super::{Slot, SlotKey, TeamId};

/// A named grouping of slots (an ushering team, a role bucket)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub team_id: TeamId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl Team {
    pub fn new(team_id: impl Into<TeamId>, name: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            name: name.into(),
            description: None,
            slots: Vec::new(),
        }
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Name for display, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.team_id.as_str()
        } else {
            &self.name
        }
    }
}

/// Everything `GET /collection/{id}` returns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub teams: Vec<Team>,
}

impl Catalog {
    pub fn new(teams: Vec<Team>) -> Self {
        Self { teams }
    }

    pub fn slot_count(&self) -> usize {
        self.teams.iter().map(|t| t.slots.len()).sum()
    }
}

/// The slot held by the authenticated participant, as reported by `mySlot`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldSlot {
    pub team_id: TeamId,
    pub slot: Slot,
}

impl HeldSlot {
    pub fn key(&self) -> SlotKey {
        SlotKey {
            team_id: self.team_id.clone(),
            slot_id: self.slot.slot_id.clone(),
        }
    }
}

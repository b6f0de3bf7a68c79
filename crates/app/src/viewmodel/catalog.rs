//! Catalog view model

use slotbook_core::{ActorId, ReservationState, SlotKey, SlotProjection, SlotStatus};

/// One row of the slot list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotItem {
    pub key: SlotKey,
    pub time: String,
    pub status: SlotStatus,
    pub holder: Option<String>,
    pub is_selected: bool,
    /// Optimistic change waiting for the backend
    pub is_pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamItem {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub slots: Vec<SlotItem>,
}

/// Build the rows shown for a projection as seen by `actor`
pub fn team_items(
    projection: &SlotProjection,
    state: &ReservationState,
    actor: &ActorId,
) -> Vec<TeamItem> {
    let (selected, pending) = match state {
        ReservationState::Selected(selection) => (Some(&selection.key), None),
        ReservationState::Confirming { pending, queued } => {
            (queued.as_ref().map(|q| &q.key), Some(&pending.key))
        }
        ReservationState::Idle | ReservationState::Committed { .. } => (None, None),
    };

    projection
        .teams()
        .iter()
        .map(|team| TeamItem {
            id: team.team_id.to_string(),
            name: team.name.clone(),
            description: team.description.clone(),
            slots: projection
                .slots_of(&team.team_id)
                .into_iter()
                .map(|(key, slot)| SlotItem {
                    key: key.clone(),
                    time: format!(
                        "{} - {}",
                        slot.start_time.format("%a %d %b %H:%M"),
                        slot.end_time.format("%H:%M")
                    ),
                    status: slot.status_for(actor),
                    holder: slot.reserved_by.as_ref().map(|h| h.to_string()),
                    is_selected: selected == Some(key),
                    is_pending: pending == Some(key),
                })
                .collect(),
        })
        .collect()
}

fn marker(item: &SlotItem) -> char {
    if item.is_pending {
        '~'
    } else if item.is_selected {
        '>'
    } else {
        ' '
    }
}

/// Plain-text listing for the terminal
pub fn render(teams: &[TeamItem]) -> String {
    if teams.is_empty() {
        return "No slots in this collection.".to_string();
    }

    let mut out = String::new();
    for team in teams {
        out.push_str(&format!("{} ({})\n", team.name, team.id));
        if let Some(description) = &team.description {
            out.push_str(&format!("  {}\n", description));
        }
        for slot in &team.slots {
            let status = match (&slot.status, &slot.holder) {
                (SlotStatus::Taken, Some(holder)) => format!("taken by {}", holder),
                (status, _) => status.label().to_string(),
            };
            out.push_str(&format!(
                "  {} {:<12} {}  {}\n",
                marker(slot),
                slot.key.slot_id.as_str(),
                slot.time,
                status
            ));
        }
    }
    out
}

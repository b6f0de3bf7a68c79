//! Notifications and status line view model

use slotbook_core::{Notification, ReservationKind, ReservationState};

/// Toast shown for a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastItem {
    pub text: String,
    pub is_error: bool,
    pub time: String,
}

impl From<&Notification> for ToastItem {
    fn from(n: &Notification) -> Self {
        Self {
            text: n.message.clone(),
            is_error: n.is_error(),
            time: n.timestamp.format("%H:%M:%S").to_string(),
        }
    }
}

pub fn render_toast(toast: &ToastItem) -> String {
    let tag = if toast.is_error { "error" } else { "ok" };
    format!("[{} {}] {}", toast.time, tag, toast.text)
}

fn describe(kind: &ReservationKind) -> String {
    match kind {
        ReservationKind::Assign { holder } => format!("assign to {}", holder),
        other => other.verb().to_string(),
    }
}

/// One-line summary of the reservation state
pub fn status_line(state: &ReservationState) -> String {
    match state {
        ReservationState::Idle => "Nothing selected".to_string(),
        ReservationState::Selected(selection) => format!(
            "Selected {} ({}): type 'confirm' or 'cancel'",
            selection.key,
            describe(&selection.kind)
        ),
        ReservationState::Confirming { pending, queued } => {
            let mut line = format!(
                "Waiting for the server: {} ({})",
                pending.key,
                describe(&pending.kind)
            );
            if let Some(next) = queued {
                line.push_str(&format!(", then {} ({})", next.key, describe(&next.kind)));
            }
            line
        }
        ReservationState::Committed { key, kind } => {
            format!("Done: {} ({})", key, describe(kind))
        }
    }
}

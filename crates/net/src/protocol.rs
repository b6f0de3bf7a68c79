//! REST wire types
//!
//! Bodies are JSON. The catalog and slot shapes are the core models
//! themselves; only the envelopes that exist purely on the wire live here.

use serde::{Deserialize, Serialize};
use slotbook_core::{ActorId, Catalog, HeldSlot, ReservationKind};

use crate::error::Result;

/// Body of a `4xx`/`5xx` answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of an `assign` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignBody {
    pub holder: ActorId,
}

/// Request body for an action, if it carries one
pub fn action_body(kind: &ReservationKind) -> Result<Option<Vec<u8>>> {
    match kind {
        ReservationKind::Assign { holder } => Ok(Some(serde_json::to_vec(&AssignBody {
            holder: holder.clone(),
        })?)),
        ReservationKind::Book | ReservationKind::Release => Ok(None),
    }
}

pub fn decode_catalog(bytes: &[u8]) -> Result<Catalog> {
    Ok(serde_json::from_slice(bytes)?)
}

/// `mySlot` answers `null`, an empty body, or `{teamId, slot}`
pub fn decode_my_slot(bytes: &[u8]) -> Result<Option<HeldSlot>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Backend-provided error text, if the body has one
pub fn decode_error(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(bytes)
        .ok()
        .map(|body| body.error)
        .filter(|error| !error.trim().is_empty())
}

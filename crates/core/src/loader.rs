//! Slot catalog loader
//!
//! One request per view load, no pagination, no retry.

use tracing::{info, instrument, warn};

use crate::backend::SlotBackend;
use crate::error::Result;
use crate::invariants;
use crate::models::{CollectionId, SlotKey};
use crate::projection::SlotProjection;

/// A freshly built projection plus the participant's committed slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedCatalog {
    pub projection: SlotProjection,
    pub held: Option<SlotKey>,
}

/// Fetch a collection and build its projection
///
/// A failed `mySlot` lookup does not fail the load; the catalog is still
/// usable, only the committed state cannot be restored.
#[instrument(skip(backend), fields(collection = %collection))]
pub async fn load<B: SlotBackend>(backend: &B, collection: &CollectionId) -> Result<LoadedCatalog> {
    let catalog = backend.fetch_collection(collection).await?;
    let projection = SlotProjection::from_catalog(catalog)?;
    invariants::assert_projection_invariants(&projection);

    let held = match backend.my_slot(collection).await {
        Ok(held) => held.map(|h| h.key()).filter(|key| {
            let known = projection.contains(key);
            if !known {
                warn!(slot = %key, "Held slot is not part of the catalog");
            }
            known
        }),
        Err(e) => {
            warn!(error = %e, "Could not look up held slot");
            None
        }
    };

    info!(
        teams = projection.teams().len(),
        slots = projection.len(),
        held = ?held,
        "Catalog loaded"
    );

    Ok(LoadedCatalog { projection, held })
}

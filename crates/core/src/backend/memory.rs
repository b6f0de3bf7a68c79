//! In-memory backend
//!
//! Serializes conflicting claims the same way the REST backend does. Handles
//! created with [`MemoryBackend::handle_for`] share one store, so several
//! participants can compete for the same slot.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::debug;

use super::SlotBackend;
use crate::error::BackendError;
use crate::models::{
    ActorId, Catalog, CollectionId, CommitRequest, HeldSlot, ReservationKind, SlotKey,
};

#[derive(Default)]
struct Store {
    collections: HashMap<CollectionId, Catalog>,
    fail_next_fetch: Option<BackendError>,
    fail_next_commit: Option<BackendError>,
    commit_delay: Option<Duration>,
    fetches: usize,
    commits: usize,
}

/// Shared in-memory slot store, seen as one participant
#[derive(Clone)]
pub struct MemoryBackend {
    actor: ActorId,
    store: Arc<Mutex<Store>>,
}

impl MemoryBackend {
    pub fn new(actor: impl Into<ActorId>) -> Self {
        Self {
            actor: actor.into(),
            store: Arc::new(Mutex::new(Store::default())),
        }
    }

    /// Another participant's view of the same store
    pub fn handle_for(&self, actor: impl Into<ActorId>) -> Self {
        Self {
            actor: actor.into(),
            store: self.store.clone(),
        }
    }

    pub fn insert_collection(&self, collection: impl Into<CollectionId>, catalog: Catalog) {
        self.lock().collections.insert(collection.into(), catalog);
    }

    /// Make the next catalog fetch fail with the given error
    pub fn fail_next_fetch(&self, error: BackendError) {
        self.lock().fail_next_fetch = Some(error);
    }

    /// Make the next commit fail with the given error
    pub fn fail_next_commit(&self, error: BackendError) {
        self.lock().fail_next_commit = Some(error);
    }

    /// Delay every commit answer
    pub fn set_commit_delay(&self, delay: Option<Duration>) {
        self.lock().commit_delay = delay;
    }

    /// Number of catalog fetches served
    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    /// Number of commit requests received
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    /// Current holder of a slot in the authoritative store
    pub fn holder_of(&self, collection: &CollectionId, key: &SlotKey) -> Option<ActorId> {
        let store = self.lock();
        store
            .collections
            .get(collection)
            .and_then(|catalog| find_slot(catalog, key))
            .and_then(|slot| slot.reserved_by.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn find_slot<'a>(catalog: &'a Catalog, key: &SlotKey) -> Option<&'a crate::models::Slot> {
    catalog
        .teams
        .iter()
        .find(|t| t.team_id == key.team_id)
        .and_then(|t| t.slots.iter().find(|s| s.slot_id == key.slot_id))
}

fn rejected(status: u16, message: &str) -> BackendError {
    BackendError::Rejected {
        status,
        message: Some(message.to_string()),
    }
}

fn apply_commit(
    store: &mut Store,
    actor: &ActorId,
    collection: &CollectionId,
    request: &CommitRequest,
) -> Result<(), BackendError> {
    let catalog = store
        .collections
        .get_mut(collection)
        .ok_or_else(|| rejected(404, "collection not found"))?;

    let slot = catalog
        .teams
        .iter_mut()
        .find(|t| t.team_id == request.key.team_id)
        .and_then(|t| t.slots.iter_mut().find(|s| s.slot_id == request.key.slot_id))
        .ok_or_else(|| rejected(404, "slot not found"))?;

    match &request.kind {
        ReservationKind::Book => {
            if !slot.is_available {
                return Err(rejected(409, "slot already booked"));
            }
            slot.hold(actor.clone());
        }
        ReservationKind::Release => {
            if !slot.is_held_by(actor) {
                return Err(rejected(403, "you do not hold this slot"));
            }
            slot.free();
        }
        ReservationKind::Assign { holder } => {
            if !slot.is_available {
                return Err(rejected(409, "role already assigned"));
            }
            slot.hold(holder.clone());
        }
    }
    Ok(())
}

impl SlotBackend for MemoryBackend {
    fn fetch_collection(
        &self,
        collection: &CollectionId,
    ) -> impl Future<Output = Result<Catalog, BackendError>> + Send {
        let result = {
            let mut store = self.lock();
            store.fetches += 1;
            match store.fail_next_fetch.take() {
                Some(error) => Err(error),
                None => store
                    .collections
                    .get(collection)
                    .cloned()
                    .ok_or_else(|| rejected(404, "collection not found")),
            }
        };
        async move { result }
    }

    fn my_slot(
        &self,
        collection: &CollectionId,
    ) -> impl Future<Output = Result<Option<HeldSlot>, BackendError>> + Send {
        let result = {
            let store = self.lock();
            let held = store.collections.get(collection).and_then(|catalog| {
                catalog.teams.iter().find_map(|team| {
                    team.slots
                        .iter()
                        .find(|s| s.is_held_by(&self.actor))
                        .map(|slot| HeldSlot {
                            team_id: team.team_id.clone(),
                            slot: slot.clone(),
                        })
                })
            });
            Ok(held)
        };
        async move { result }
    }

    fn commit(
        &self,
        collection: &CollectionId,
        request: &CommitRequest,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        let backend = self.clone();
        let collection = collection.clone();
        let request = request.clone();

        async move {
            let delay = {
                let mut store = backend.lock();
                store.commits += 1;
                store.commit_delay
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut store = backend.lock();
            if let Some(error) = store.fail_next_commit.take() {
                return Err(error);
            }
            let result = apply_commit(&mut store, &backend.actor, &collection, &request);
            debug!(
                actor = %backend.actor,
                slot = %request.key,
                accepted = result.is_ok(),
                "Memory backend commit"
            );
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Slot, Team};
    use chrono::{Duration as ChronoDuration, Utc};

    fn seeded() -> (MemoryBackend, CollectionId) {
        let backend = MemoryBackend::new("alice");
        let start = Utc::now();
        backend.insert_collection(
            "interviews",
            Catalog::new(vec![Team::new("t", "T").with_slot(Slot::new(
                "s1",
                start,
                start + ChronoDuration::minutes(15),
            ))]),
        );
        (backend, CollectionId::new("interviews"))
    }

    #[tokio::test]
    async fn test_only_one_booking_wins() {
        let (alice, collection) = seeded();
        let bob = alice.handle_for("bob");
        let request = CommitRequest {
            key: SlotKey::new("t", "s1"),
            kind: ReservationKind::Book,
        };

        assert!(alice.commit(&collection, &request).await.is_ok());
        let err = bob.commit(&collection, &request).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 409, .. }));
        assert_eq!(
            alice.holder_of(&collection, &request.key),
            Some(ActorId::new("alice"))
        );
        assert_eq!(alice.commit_count(), 2);
    }

    #[tokio::test]
    async fn test_my_slot() {
        let (alice, collection) = seeded();
        assert_eq!(alice.my_slot(&collection).await.unwrap(), None);

        let request = CommitRequest {
            key: SlotKey::new("t", "s1"),
            kind: ReservationKind::Book,
        };
        alice.commit(&collection, &request).await.unwrap();
        let held = alice.my_slot(&collection).await.unwrap().unwrap();
        assert_eq!(held.key(), request.key);
    }

    #[tokio::test]
    async fn test_release_by_non_holder_is_rejected() {
        let (alice, collection) = seeded();
        let request = CommitRequest {
            key: SlotKey::new("t", "s1"),
            kind: ReservationKind::Release,
        };
        let err = alice.commit(&collection, &request).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 403, .. }));
    }
}

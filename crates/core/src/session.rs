//! Reservation session
//!
//! Owns everything one booking view needs: the backend handle, the
//! projection, the coordinator and the queue of notifications waiting to be
//! shown. Rejected transitions and failed commits never escape as errors
//! only; each one also leaves a notification behind.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::backend::SlotBackend;
use crate::coordinator::{CommitOutcome, ReservationCoordinator, ReservationState};
use crate::error::{BackendError, Error, ReservationError, Result};
use crate::loader;
use crate::models::{ActorId, CollectionId, CommitRequest, Notification, ReservationKind, SlotKey};
use crate::projection::SlotProjection;
use crate::reconcile;

/// Default limit for one commit round trip
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Send one commit request, giving up after `timeout`
pub async fn commit_with_timeout<B: SlotBackend>(
    backend: &B,
    collection: &CollectionId,
    request: &CommitRequest,
    timeout: Duration,
) -> std::result::Result<(), BackendError> {
    match tokio::time::timeout(timeout, backend.commit(collection, request)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(slot = %request.key, timeout_ms = timeout.as_millis() as u64, "Commit timed out");
            Err(BackendError::Timeout(timeout))
        }
    }
}

pub struct ReservationSession<B> {
    backend: B,
    collection: CollectionId,
    projection: SlotProjection,
    coordinator: ReservationCoordinator,
    commit_timeout: Duration,
    notifications: VecDeque<Notification>,
    load_error: Option<String>,
}

impl<B: SlotBackend> ReservationSession<B> {
    pub fn new(backend: B, collection: CollectionId, actor: ActorId) -> Self {
        Self {
            backend,
            collection,
            projection: SlotProjection::empty(),
            coordinator: ReservationCoordinator::new(actor),
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
            notifications: VecDeque::new(),
            load_error: None,
        }
    }

    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn collection(&self) -> &CollectionId {
        &self.collection
    }

    pub fn actor(&self) -> &ActorId {
        self.coordinator.actor()
    }

    pub fn projection(&self) -> &SlotProjection {
        &self.projection
    }

    pub fn state(&self) -> &ReservationState {
        self.coordinator.state()
    }

    pub fn commit_timeout(&self) -> Duration {
        self.commit_timeout
    }

    /// Error text of the last failed load, while the view is blocked by it
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// (Re)load the catalog, replacing the projection
    ///
    /// Refused while a commit is in flight. On failure the projection is
    /// left empty; no partial catalog is ever shown.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn load(&mut self) -> Result<()> {
        if self.coordinator.is_confirming() {
            let err = ReservationError::CommitInFlight;
            self.notify(Notification::error(err.to_string(), None));
            return Err(err.into());
        }

        match loader::load(&self.backend, &self.collection).await {
            Ok(loaded) => {
                self.projection = loaded.projection;
                self.coordinator.on_reload(&self.projection, loaded.held);
                self.load_error = None;
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    Error::Backend(reason) => reconcile::failure_message(reason),
                    other => other.to_string(),
                };
                warn!(error = %e, "Catalog load failed");
                self.projection = SlotProjection::empty();
                self.coordinator.on_reload(&self.projection, None);
                self.load_error = Some(message.clone());
                self.notify(Notification::error(
                    format!("Could not load slots: {}", message),
                    None,
                ));
                Err(e)
            }
        }
    }

    pub fn select(&mut self, key: SlotKey, kind: ReservationKind) -> std::result::Result<(), ReservationError> {
        let result = self.coordinator.select(&self.projection, key.clone(), kind);
        if let Err(e) = &result {
            self.notify(Notification::error(e.to_string(), Some(key)));
        }
        result
    }

    pub fn cancel(&mut self) -> std::result::Result<(), ReservationError> {
        let result = self.coordinator.cancel();
        if let Err(e) = &result {
            self.notify(Notification::error(e.to_string(), None));
        }
        result
    }

    /// First half of a confirm: apply optimistically, get the request
    pub fn begin_confirm(&mut self) -> std::result::Result<CommitRequest, ReservationError> {
        let result = self.coordinator.confirm(&mut self.projection);
        if let Err(e) = &result {
            self.notify(Notification::error(e.to_string(), None));
        }
        result
    }

    /// Second half of a confirm: feed in the backend's answer
    pub fn finish_confirm(
        &mut self,
        result: std::result::Result<(), BackendError>,
    ) -> std::result::Result<CommitOutcome, ReservationError> {
        let outcome = self.coordinator.complete(&mut self.projection, result)?;
        self.notify(outcome.notification().clone());
        Ok(outcome)
    }

    /// Confirm the selection and wait for the backend's answer
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn confirm(&mut self) -> std::result::Result<CommitOutcome, ReservationError> {
        let request = self.begin_confirm()?;
        let result =
            commit_with_timeout(&self.backend, &self.collection, &request, self.commit_timeout).await;
        let outcome = self.finish_confirm(result)?;
        info!(slot = %request.key, committed = outcome.is_committed(), "Confirm finished");
        Ok(outcome)
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::{Catalog, Slot, Team};
    use chrono::{Duration as ChronoDuration, Utc};

    const COLLECTION: &str = "ushering-2026";

    fn seeded() -> MemoryBackend {
        let backend = MemoryBackend::new("alice");
        let start = Utc::now();
        let slot = |id: &str| Slot::new(id, start, start + ChronoDuration::minutes(15));
        backend.insert_collection(
            COLLECTION,
            Catalog::new(vec![Team::new("ushers", "Ushers")
                .with_slot(slot("S1"))
                .with_slot(slot("S2"))]),
        );
        backend
    }

    fn session(backend: MemoryBackend) -> ReservationSession<MemoryBackend> {
        let actor = ActorId::new("alice");
        ReservationSession::new(backend, CollectionId::new(COLLECTION), actor)
    }

    fn s(id: &str) -> SlotKey {
        SlotKey::new("ushers", id)
    }

    #[tokio::test]
    async fn test_book_commits() {
        let mut session = session(seeded());
        session.load().await.unwrap();

        session.select(s("S1"), ReservationKind::Book).unwrap();
        let outcome = session.confirm().await.unwrap();

        assert!(outcome.is_committed());
        assert_eq!(
            session.projection().get(&s("S1")).unwrap().reserved_by,
            Some(ActorId::new("alice"))
        );
        assert_eq!(session.state().name(), "committed");
        let notes = session.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert!(!notes[0].is_error());
    }

    #[tokio::test]
    async fn test_conflict_reverts_with_backend_message() {
        let backend = seeded();
        let mut session = session(backend.clone());
        session.load().await.unwrap();
        let before = session.projection().clone();

        backend.fail_next_commit(BackendError::Rejected {
            status: 409,
            message: Some("slot already booked".to_string()),
        });
        session.select(s("S1"), ReservationKind::Book).unwrap();
        let outcome = session.confirm().await.unwrap();

        assert!(!outcome.is_committed());
        assert_eq!(session.projection(), &before);
        assert_eq!(session.state(), &ReservationState::Idle);
        let notes = session.drain_notifications();
        assert_eq!(notes.last().unwrap().message, "slot already booked");
    }

    #[tokio::test]
    async fn test_competing_sessions_one_wins() {
        let alice_backend = seeded();
        let bob_backend = alice_backend.handle_for("bob");
        let mut alice = session(alice_backend.clone());
        let mut bob = ReservationSession::new(
            bob_backend,
            CollectionId::new(COLLECTION),
            ActorId::new("bob"),
        );
        alice.load().await.unwrap();
        bob.load().await.unwrap();
        let bob_before = bob.projection().clone();

        alice.select(s("S1"), ReservationKind::Book).unwrap();
        bob.select(s("S1"), ReservationKind::Book).unwrap();

        assert!(alice.confirm().await.unwrap().is_committed());
        assert!(!bob.confirm().await.unwrap().is_committed());

        assert_eq!(bob.state(), &ReservationState::Idle);
        assert_eq!(bob.projection(), &bob_before);
        assert_eq!(
            alice_backend.holder_of(&CollectionId::new(COLLECTION), &s("S1")),
            Some(ActorId::new("alice"))
        );
    }

    #[tokio::test]
    async fn test_cancel_sends_nothing() {
        let backend = seeded();
        let mut session = session(backend.clone());
        session.load().await.unwrap();
        let before = session.projection().clone();

        session.select(s("S1"), ReservationKind::Book).unwrap();
        session.cancel().unwrap();

        assert_eq!(backend.commit_count(), 0);
        assert_eq!(session.projection(), &before);
        assert_eq!(session.state(), &ReservationState::Idle);
    }

    #[tokio::test]
    async fn test_reload_restores_committed() {
        let backend = seeded();
        {
            let mut first = session(backend.clone());
            first.load().await.unwrap();
            first.select(s("S2"), ReservationKind::Book).unwrap();
            first.confirm().await.unwrap();
        }

        let mut reloaded = session(backend);
        reloaded.load().await.unwrap();
        assert_eq!(
            reloaded.state(),
            &ReservationState::Committed {
                key: s("S2"),
                kind: ReservationKind::Book
            }
        );
    }

    #[tokio::test]
    async fn test_load_failure_leaves_projection_empty() {
        let backend = seeded();
        let mut session = session(backend.clone());
        session.load().await.unwrap();
        assert!(!session.projection().is_empty());

        backend.fail_next_fetch(BackendError::Network("refused".into()));
        assert!(session.load().await.is_err());
        assert!(session.projection().is_empty());
        assert_eq!(session.load_error(), Some("Could not reach the server"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_timeout_rolls_back() {
        let backend = seeded();
        backend.set_commit_delay(Some(Duration::from_secs(60)));
        let mut session = session(backend).with_commit_timeout(Duration::from_secs(5));
        session.load().await.unwrap();
        let before = session.projection().clone();

        session.select(s("S1"), ReservationKind::Book).unwrap();
        let outcome = session.confirm().await.unwrap();

        assert!(!outcome.is_committed());
        assert_eq!(
            outcome.notification().message,
            "The server did not respond in time"
        );
        assert_eq!(session.projection(), &before);
    }

    #[tokio::test]
    async fn test_rejected_select_leaves_notification() {
        let mut session = session(seeded());
        session.load().await.unwrap();

        assert!(session.select(s("nope"), ReservationKind::Book).is_err());
        let notes = session.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].is_error());
    }

    #[tokio::test]
    async fn test_reload_refused_while_confirming() {
        let backend = seeded();
        let mut session = session(backend.clone());
        session.load().await.unwrap();
        let fetches = backend.fetch_count();

        session.select(s("S1"), ReservationKind::Book).unwrap();
        session.begin_confirm().unwrap();
        session.drain_notifications();

        let err = session.load().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Reservation(ReservationError::CommitInFlight)
        ));
        assert_eq!(backend.fetch_count(), fetches);
        assert!(matches!(
            session.state(),
            ReservationState::Confirming { .. }
        ));
        let notes = session.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].is_error());
    }
}

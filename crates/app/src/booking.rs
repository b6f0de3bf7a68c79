//! Booking management for the app
//!
//! Owns the reservation session on a background task. The UI sends commands
//! and polls events; commits run on their own task so the view keeps
//! responding while the backend answers.

use std::sync::Arc;

use slotbook_core::{
    commit_with_timeout, BackendError, Notification, ReservationKind, ReservationSession,
    ReservationState, SlotBackend, SlotKey, SlotProjection,
};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Events from the booking task to the UI
#[derive(Debug, Clone)]
pub enum BookingEvent {
    /// Reservation state moved
    StateChanged(ReservationState),
    /// Projection replaced or changed
    ProjectionUpdated,
    /// Something to show the participant
    Notification(Notification),
    /// Catalog could not be loaded; the view is blocked until a reload works
    LoadFailed(String),
}

/// What the UI renders from
#[derive(Debug, Clone)]
pub struct BookingSnapshot {
    pub projection: SlotProjection,
    pub state: ReservationState,
    pub load_error: Option<String>,
}

enum BookingCommand {
    Load,
    Select { key: SlotKey, kind: ReservationKind },
    Cancel,
    Confirm,
}

/// Booking manager handle
pub struct BookingManager {
    snapshot: Arc<RwLock<BookingSnapshot>>,
    event_rx: mpsc::Receiver<BookingEvent>,
    cmd_tx: mpsc::Sender<BookingCommand>,
}

impl BookingManager {
    /// Start the booking task for a session
    pub fn new<B>(session: ReservationSession<B>) -> Self
    where
        B: SlotBackend + Clone + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        let snapshot = Arc::new(RwLock::new(BookingSnapshot {
            projection: session.projection().clone(),
            state: session.state().clone(),
            load_error: None,
        }));

        tokio::spawn(booking_task(session, snapshot.clone(), event_tx, cmd_rx));

        Self {
            snapshot,
            event_rx,
            cmd_tx,
        }
    }

    /// Wait for the next booking event
    pub async fn next_event(&mut self) -> Option<BookingEvent> {
        self.event_rx.recv().await
    }

    /// Fetch the catalog and the held slot again
    pub async fn load(&self) -> Result<(), &'static str> {
        self.send(BookingCommand::Load).await
    }

    pub async fn select(&self, key: SlotKey, kind: ReservationKind) -> Result<(), &'static str> {
        self.send(BookingCommand::Select { key, kind }).await
    }

    pub async fn cancel(&self) -> Result<(), &'static str> {
        self.send(BookingCommand::Cancel).await
    }

    pub async fn confirm(&self) -> Result<(), &'static str> {
        self.send(BookingCommand::Confirm).await
    }

    /// Current view of the projection and reservation state
    pub async fn snapshot(&self) -> BookingSnapshot {
        self.snapshot.read().await.clone()
    }

    async fn send(&self, cmd: BookingCommand) -> Result<(), &'static str> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| "Booking task not running")
    }
}

/// Main booking task
async fn booking_task<B>(
    mut session: ReservationSession<B>,
    snapshot: Arc<RwLock<BookingSnapshot>>,
    event_tx: mpsc::Sender<BookingEvent>,
    mut cmd_rx: mpsc::Receiver<BookingCommand>,
) where
    B: SlotBackend + Clone + 'static,
{
    let mut in_flight: Option<JoinHandle<Result<(), BackendError>>> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(BookingCommand::Load) => {
                        let loaded = session.load().await;
                        if loaded.is_err() {
                            if let Some(reason) = session.load_error() {
                                let _ = event_tx.send(BookingEvent::LoadFailed(reason.to_string())).await;
                            }
                        }
                        publish(&mut session, &snapshot, &event_tx, true).await;
                    }
                    Some(BookingCommand::Select { key, kind }) => {
                        let _ = session.select(key, kind);
                        publish(&mut session, &snapshot, &event_tx, false).await;
                    }
                    Some(BookingCommand::Cancel) => {
                        let _ = session.cancel();
                        publish(&mut session, &snapshot, &event_tx, false).await;
                    }
                    Some(BookingCommand::Confirm) => {
                        if let Ok(request) = session.begin_confirm() {
                            let backend = session.backend().clone();
                            let collection = session.collection().clone();
                            let timeout = session.commit_timeout();
                            debug!(slot = %request.key, "Commit dispatched");
                            in_flight = Some(tokio::spawn(async move {
                                commit_with_timeout(&backend, &collection, &request, timeout).await
                            }));
                            publish(&mut session, &snapshot, &event_tx, true).await;
                        } else {
                            publish(&mut session, &snapshot, &event_tx, false).await;
                        }
                    }
                    None => {
                        debug!("Booking command channel closed");
                        break;
                    }
                }
            }

            // Wait for the in-flight commit, if any
            joined = async {
                if let Some(handle) = in_flight.as_mut() {
                    handle.await
                } else {
                    std::future::pending().await
                }
            } => {
                in_flight = None;
                let result = joined.unwrap_or_else(|e| {
                    error!(error = %e, "Commit task failed");
                    Err(BackendError::Network(format!("commit task failed: {}", e)))
                });
                match session.finish_confirm(result) {
                    Ok(outcome) => info!(committed = outcome.is_committed(), "Commit finished"),
                    Err(e) => error!(error = %e, "Commit answer without a pending commit"),
                }
                publish(&mut session, &snapshot, &event_tx, true).await;
            }
        }
    }
}

/// Copy the session into the snapshot and forward its notifications
async fn publish<B: SlotBackend>(
    session: &mut ReservationSession<B>,
    snapshot: &Arc<RwLock<BookingSnapshot>>,
    event_tx: &mpsc::Sender<BookingEvent>,
    projection_changed: bool,
) {
    let state = session.state().clone();
    let changed = {
        let mut s = snapshot.write().await;
        let changed = s.state != state;
        s.state = state.clone();
        if projection_changed {
            s.projection = session.projection().clone();
        }
        s.load_error = session.load_error().map(str::to_string);
        changed
    };

    if projection_changed {
        let _ = event_tx.send(BookingEvent::ProjectionUpdated).await;
    }
    if changed {
        let _ = event_tx.send(BookingEvent::StateChanged(state)).await;
    }
    for notification in session.drain_notifications() {
        let _ = event_tx.send(BookingEvent::Notification(notification)).await;
    }
}

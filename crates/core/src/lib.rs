//! Slotbook Core Library
//!
//! Slot models, the local projection, the reservation coordinator and the
//! session that drives them against an authoritative backend.

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod invariants;
pub mod loader;
pub mod models;
pub mod projection;
pub mod reconcile;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub use backend::MemoryBackend;
pub use backend::SlotBackend;
pub use config::Config;
pub use coordinator::{CommitOutcome, ReservationCoordinator, ReservationState, Selection};
pub use error::{BackendError, Error, ReservationError, Result};
pub use loader::LoadedCatalog;
pub use models::*;
pub use projection::{SlotMutation, SlotProjection, TeamInfo};
pub use session::{commit_with_timeout, ReservationSession, DEFAULT_COMMIT_TIMEOUT};

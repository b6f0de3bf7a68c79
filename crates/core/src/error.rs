//! Error types for Slotbook Core

use thiserror::Error;

use crate::models::SlotKey;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Reservation error: {0}")]
    Reservation(#[from] ReservationError),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse config TOML: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a call to a [`crate::SlotBackend`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend answered with a non-success status
    #[error("Rejected with status {status}")]
    Rejected { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    Network(String),

    /// No answer within the commit timeout
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Invalid response: {0}")]
    Decode(String),

    /// Refused client-side before anything was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Transitions the coordinator refuses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    #[error("Unknown slot {0}")]
    UnknownSlot(SlotKey),

    #[error("Slot {0} is unavailable")]
    SlotUnavailable(SlotKey),

    #[error("Slot {0} is not held by you")]
    NotHeld(SlotKey),

    #[error("No slot selected")]
    NothingSelected,

    #[error("A reservation is already being confirmed")]
    CommitInFlight,

    #[error("Slot {0} is being confirmed")]
    SlotBusy(SlotKey),

    #[error("The pending reservation can no longer be cancelled")]
    NotCancellable,

    #[error("No reservation is being confirmed")]
    NoCommitInFlight,
}

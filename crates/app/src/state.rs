//! Application state management

use slotbook_core::{Config, ReservationSession};
use slotbook_net::RestClient;
use tracing::info;

use crate::booking::BookingManager;

/// Bootstrap failures; the binary exits on any of these
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Core(#[from] slotbook_core::Error),

    #[error("{0}")]
    Net(#[from] slotbook_net::Error),
}

/// Main application state
pub struct AppState {
    pub config: Config,
    pub bookings: BookingManager,
}

impl AppState {
    /// Load config and start the booking task; must run inside a tokio runtime
    pub fn new() -> Result<Self, AppError> {
        let config = Config::load()?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, AppError> {
        config.validate()?;
        let client = RestClient::from_config(&config)?;
        let session = ReservationSession::new(client, config.collection.clone(), config.actor.clone())
            .with_commit_timeout(config.commit_timeout());

        info!(
            actor = %config.actor,
            collection = %config.collection,
            "Booking session ready"
        );

        Ok(Self {
            bookings: BookingManager::new(session),
            config,
        })
    }
}

//! Slotbook Network Library
//!
//! REST client for the authoritative slot backend.
//!
//! # Endpoints
//!
//! - `GET  /collection/{collectionId}`: every team and slot
//! - `GET  /collection/{collectionId}/mySlot`: slot held by the caller, or `null`
//! - `POST /collection/{collectionId}/teams/{teamId}/slots/{slotId}/book`
//! - `POST /collection/{collectionId}/teams/{teamId}/slots/{slotId}/cancel`
//! - `POST /collection/{collectionId}/teams/{teamId}/slots/{slotId}/assign` with `{"holder": ...}`
//!
//! # Usage
//!
//! ```ignore
//! let client = RestClient::from_config(&config)?;
//! let mut session = ReservationSession::new(client, config.collection.clone(), config.actor.clone());
//! session.load().await?;
//! ```

pub mod client;
pub mod endpoint;
pub mod error;
pub mod protocol;
mod transport;

pub use client::{RestClient, DEFAULT_REQUEST_TIMEOUT};
pub use endpoint::BaseUrl;
pub use error::{Error, Result};
pub use protocol::{AssignBody, ErrorBody};

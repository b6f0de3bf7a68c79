//! Data models for Slotbook

mod catalog;
mod ids;
mod notification;
mod reservation;
mod slot;

pub use catalog::*;
pub use ids::*;
pub use notification::*;
pub use reservation::*;
pub use slot::*;

//! View models for the terminal view

pub mod catalog;
pub mod notifications;

pub use catalog::team_items;
pub use notifications::{render_toast, status_line, ToastItem};

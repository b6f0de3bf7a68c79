//! User-facing notifications

use chrono::{DateTime, Utc};

use super::SlotKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A toast shown to the participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub key: Option<SlotKey>,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn info(message: impl Into<String>, key: Option<SlotKey>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            key,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>, key: Option<SlotKey>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            key,
            timestamp: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

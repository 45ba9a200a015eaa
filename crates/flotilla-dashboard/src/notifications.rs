use std::sync::{Mutex, PoisonError};

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

impl NotificationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// Transient user-facing message emitted by a controller.
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Default)]
/// FIFO of notifications waiting for the presentation layer to drain them.
pub struct NotificationQueue {
    items: Mutex<Vec<Notification>>,
}

impl NotificationQueue {
    pub fn push(&self, notification: Notification) {
        if notification.level == NotificationLevel::Error {
            tracing::debug!(text = %notification.text, "error notification emitted");
        }
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }

    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.items.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::{Notification, NotificationQueue};

    #[test]
    fn unit_notification_serializes_with_snake_case_level() {
        let encoded = serde_json::to_value(Notification::error("Failed to load nodes"))
            .expect("encode");
        assert_eq!(
            encoded,
            serde_json::json!({ "level": "error", "text": "Failed to load nodes" })
        );
        assert_eq!(Notification::success("ok").level.as_str(), "success");
    }

    #[test]
    fn unit_queue_drains_in_push_order() {
        let queue = NotificationQueue::default();
        queue.push(Notification::success("first"));
        queue.push(Notification::error("second"));

        assert_eq!(
            queue.drain(),
            vec![Notification::success("first"), Notification::error("second")]
        );
        assert!(queue.drain().is_empty());
    }
}

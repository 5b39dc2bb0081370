use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationVariant {
    #[default]
    Default,
    Destructive,
}

/// Transient toast-style message for whoever is driving the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub variant: NotificationVariant,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            variant: NotificationVariant::Default,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            variant: NotificationVariant::Destructive,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}

/// Fire-and-forget display hook.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Headless sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, notification: Notification) {
        match notification.variant {
            NotificationVariant::Default => {
                info!(title = %notification.title, "{}", notification.description)
            }
            NotificationVariant::Destructive => {
                warn!(title = %notification.title, "{}", notification.description)
            }
        }
    }
}

/// Collects notifications so they can be returned with an API response.
#[derive(Debug, Default, Clone)]
pub struct NotificationBuffer {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationBuffer {
    pub fn drain(&self) -> Vec<Notification> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl NotificationSink for NotificationBuffer {
    fn notify(&self, notification: Notification) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

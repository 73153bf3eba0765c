//! Short-lived user-facing messages.
//!
//! Each notification removes itself after its duration unless dismissed
//! first. Expiry runs on a Tokio timer task; dismissal aborts that task, and
//! a timer that fires for an already-removed ID does nothing.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// How long a notification stays visible by default.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

/// How many notifications may coexist by default.
pub const DEFAULT_MAX_VISIBLE: usize = 5;

/// Unique identifier for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Create a new unique notification ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// The action completed.
    Success,
    /// The action failed; nothing changed.
    Error,
    /// The action completed but something non-fatal went wrong.
    Warning,
}

/// A queued message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique ID, used for dismissal.
    pub id: NotificationId,
    /// Text shown to the user.
    pub message: String,
    /// Severity.
    pub kind: NotificationKind,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
}

#[derive(Debug, Default)]
struct QueueInner {
    items: VecDeque<Notification>,
    timers: HashMap<NotificationId, JoinHandle<()>>,
}

impl QueueInner {
    fn remove(&mut self, id: NotificationId) -> bool {
        if let Some(timer) = self.timers.remove(&id) {
            timer.abort();
        }
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }
}

impl Drop for QueueInner {
    fn drop(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }
}

/// Creation-ordered queue of notifications with timed expiry.
///
/// Cloning shares the same queue.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    inner: Arc<RwLock<QueueInner>>,
    max_visible: usize,
}

impl NotificationQueue {
    /// Create an empty queue holding at most [`DEFAULT_MAX_VISIBLE`] items.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_visible(DEFAULT_MAX_VISIBLE)
    }

    /// Create an empty queue holding at most `max_visible` items.
    #[must_use]
    pub fn with_max_visible(max_visible: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(QueueInner::default())),
            max_visible: max_visible.max(1),
        }
    }

    /// Append a notification that expires after [`DEFAULT_DURATION`].
    pub fn enqueue(&self, message: impl Into<String>, kind: NotificationKind) -> NotificationId {
        self.enqueue_for(message, kind, DEFAULT_DURATION)
    }

    /// Append a notification that expires after `duration`.
    ///
    /// Returns immediately. If the queue is full the oldest notification is
    /// dropped. Outside a Tokio runtime the notification is kept until
    /// dismissed.
    pub fn enqueue_for(
        &self,
        message: impl Into<String>,
        kind: NotificationKind,
        duration: Duration,
    ) -> NotificationId {
        let notification = Notification {
            id: NotificationId::new(),
            message: message.into(),
            kind,
            created_at: crate::current_timestamp_ms(),
        };
        let id = notification.id;

        // Hold the lock across spawn so the timer cannot run before its
        // handle is registered.
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        while inner.items.len() >= self.max_visible {
            if let Some(oldest) = inner.items.front().map(|n| n.id) {
                inner.remove(oldest);
            }
        }

        tracing::debug!("Notification {id} ({kind:?}): {}", notification.message);
        inner.items.push_back(notification);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let timer = handle.spawn(expire_after(Arc::downgrade(&self.inner), id, duration));
                inner.timers.insert(id, timer);
            }
            Err(_) => {
                tracing::warn!("No async runtime; notification {id} will not auto-expire");
            }
        }

        id
    }

    /// Remove a notification now and cancel its timer.
    ///
    /// Returns `false` if the ID was not present.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.remove(id)
    }

    /// Current notifications, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.items.iter().cloned().collect()
    }

    /// Number of visible notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.items.len()
    }

    /// Whether no notifications are visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of expiry timers still pending.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.timers.len()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

async fn expire_after(queue: Weak<RwLock<QueueInner>>, id: NotificationId, duration: Duration) {
    tokio::time::sleep(duration).await;
    let Some(queue) = queue.upgrade() else {
        return;
    };
    let mut inner = queue
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // Drop our own handle without aborting the task we are running in
    inner.timers.remove(&id);
    let before = inner.items.len();
    inner.items.retain(|n| n.id != id);
    if inner.items.len() != before {
        tracing::debug!("Notification {id} expired");
    }
}

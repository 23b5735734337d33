use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;

/// Best-effort outcome notifications. Delivery is never guaranteed.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Used when notifications are disabled
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub ts: String,
    pub title: String,
    pub body: String,
}

const MAX_PENDING: usize = 20;

/// Queues notifications for the page, which drains them and shows them through
/// the browser Notification API when permission allows.
#[derive(Debug, Default)]
pub struct FeedNotifier {
    pending: Mutex<VecDeque<Notification>>,
}

impl FeedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        self.pending.lock().unwrap().drain(..).collect()
    }
}

impl Notifier for FeedNotifier {
    fn notify(&self, title: &str, body: &str) {
        let mut pending = self.pending.lock().unwrap();
        // nobody is reading: drop the oldest
        if pending.len() >= MAX_PENDING {
            pending.pop_front();
        }
        pending.push_back(Notification {
            ts: chrono::Utc::now().format("%H:%M:%S").to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
    }
}

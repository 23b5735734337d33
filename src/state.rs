use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::config::Config;
use crate::notify::FeedNotifier;
use crate::session::SessionHandle;

#[derive(Debug, Clone, Serialize)]
pub struct EventEntry {
    pub ts: String,
    pub kind: String,
    pub detail: String,
}

const MAX_EVENTS: usize = 200;

/// Bounded feed of session events shown in the page. Shared between the session task and HTTP handlers.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<VecDeque<EventEntry>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_EVENTS))),
        }
    }

    pub fn push_event(&self, kind: &str, detail: &str) {
        let entry = EventEntry {
            ts: chrono::Utc::now().format("%H:%M:%S").to_string(),
            kind: kind.to_string(),
            detail: detail.to_string(),
        };
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= MAX_EVENTS {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn snapshot(&self) -> Vec<EventEntry> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }
}

pub struct AppState {
    pub config: Config,
    pub session: SessionHandle,
    pub events: EventLog,
    /// `None` when notifications are disabled
    pub feed: Option<Arc<FeedNotifier>>,
}

impl AppState {
    pub fn new(
        config: Config,
        session: SessionHandle,
        events: EventLog,
        feed: Option<Arc<FeedNotifier>>,
    ) -> Arc<Self> {
        Arc::new(Self { config, session, events, feed })
    }
}

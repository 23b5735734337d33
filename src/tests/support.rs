/// In-process fakes for the session's collaborators.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::PlayerBackend;
use crate::error::{GameError, GameResult};
use crate::identity::IdentityStore;
use crate::notify::Notifier;
use crate::price::PriceSource;
use crate::session::{self, SessionDeps, SessionHandle, SessionTiming, SessionView};
use crate::state::EventLog;
use crate::types::Player;

#[derive(Default)]
pub struct FakeBackend {
    pub players: Mutex<HashMap<String, i64>>,
    pub creates: AtomicUsize,
    pub updates: Mutex<Vec<(String, i64)>>,
    pub fail_create: AtomicBool,
    pub fail_updates: AtomicBool,
}

impl FakeBackend {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_player(id: &str, score: i64) -> Arc<Self> {
        let backend = Self::default();
        backend.players.lock().unwrap().insert(id.to_string(), score);
        Arc::new(backend)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn stored_score(&self, id: &str) -> Option<i64> {
        self.players.lock().unwrap().get(id).copied()
    }

    pub fn recorded_updates(&self) -> Vec<(String, i64)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlayerBackend for FakeBackend {
    async fn create_player(&self, initial_score: i64) -> GameResult<Player> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GameError::Backend("connection refused".into()));
        }
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("player-{n}");
        self.players.lock().unwrap().insert(id.clone(), initial_score);
        Ok(Player { id, score: initial_score, updated_at: Some(Utc::now()) })
    }

    async fn read_player(&self, id: &str) -> GameResult<Option<Player>> {
        let score = self.players.lock().unwrap().get(id).copied();
        Ok(score.map(|score| Player { id: id.to_string(), score, updated_at: None }))
    }

    async fn update_score(&self, id: &str, score: i64, _updated_at: DateTime<Utc>) -> GameResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(GameError::Backend("update rejected".into()));
        }
        self.players.lock().unwrap().insert(id.to_string(), score);
        self.updates.lock().unwrap().push((id.to_string(), score));
        Ok(())
    }
}

/// Returns whatever price the test last set, optionally after a delay.
pub struct FakePrices {
    pub price: Mutex<Decimal>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
    pub delay: Mutex<Option<Duration>>,
}

impl FakePrices {
    pub fn at(price: Decimal) -> Arc<Self> {
        Arc::new(Self {
            price: Mutex::new(price),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            delay: Mutex::new(None),
        })
    }

    pub fn set(&self, price: Decimal) {
        *self.price.lock().unwrap() = price;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for FakePrices {
    async fn current_price(&self) -> GameResult<Decimal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(GameError::Price("price API returned 503 Service Unavailable".into()));
        }
        Ok(*self.price.lock().unwrap())
    }
}

#[derive(Default)]
pub struct MemoryIdentity {
    pub slot: Mutex<Option<String>>,
}

impl MemoryIdentity {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn holding(id: &str) -> Arc<Self> {
        let store = Self::default();
        *store.slot.lock().unwrap() = Some(id.to_string());
        Arc::new(store)
    }

    pub fn stored(&self) -> Option<String> {
        self.slot.lock().unwrap().clone()
    }
}

impl IdentityStore for MemoryIdentity {
    fn load(&self) -> GameResult<Option<String>> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn save(&self, player_id: &str) -> GameResult<()> {
        *self.slot.lock().unwrap() = Some(player_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn bodies(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, body)| body.clone()).collect()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(title, _)| title.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.sent.lock().unwrap().push((title.to_string(), body.to_string()));
    }
}

pub struct Harness {
    pub handle: SessionHandle,
    pub task: JoinHandle<()>,
    pub cancel: CancellationToken,
    pub events: EventLog,
}

impl Harness {
    pub fn start(
        backend: Arc<FakeBackend>,
        prices: Arc<FakePrices>,
        identity: Arc<dyn IdentityStore>,
        notifier: Arc<RecordingNotifier>,
    ) -> Self {
        let deps = SessionDeps { backend, prices, identity, notifier };
        let events = EventLog::new();
        let cancel = CancellationToken::new();
        let (handle, task) = session::spawn(deps, SessionTiming::default(), events.clone(), cancel.clone());
        Self { handle, task, cancel, events }
    }

    /// Waits (in virtual time) until the published view satisfies `pred`.
    pub async fn wait_for<F>(&self, pred: F) -> SessionView
    where
        F: FnMut(&SessionView) -> bool,
    {
        let mut rx = self.handle.subscribe();
        let view = tokio::time::timeout(Duration::from_secs(600), rx.wait_for(pred))
            .await
            .expect("timed out waiting for session view")
            .expect("session view channel closed")
            .clone();
        view
    }

    /// Lets spawned completions (score persistence, refreshes) run without advancing far.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.task.await.expect("session task panicked");
    }
}

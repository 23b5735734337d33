use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::backend::PlayerBackend;
use crate::error::{GameError, GameResult};
use crate::game::{GuessState, GuessTimer, Resolution};
use crate::identity::IdentityStore;
use crate::notify::Notifier;
use crate::price::PriceSource;
use crate::state::EventLog;
use crate::types::{Direction, Player, PriceSample};

const EVENT_QUEUE_CAPACITY: usize = 64;
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);
const NOTIFICATION_TITLE: &str = "Guess Result";

/// External collaborators, constructed by the caller and injected into the session.
#[derive(Clone)]
pub struct SessionDeps {
    pub backend: Arc<dyn PlayerBackend>,
    pub prices: Arc<dyn PriceSource>,
    pub identity: Arc<dyn IdentityStore>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionTiming {
    pub price_poll: Duration,
    pub guess_window: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            price_poll: Duration::from_secs(30),
            guess_window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuessView {
    pub direction: Direction,
    pub reference_price: Decimal,
    pub started_at: DateTime<Utc>,
    pub remaining_secs: u64,
    pub resolving: bool,
}

/// Snapshot published after every state change
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub player_id: Option<String>,
    pub score: i64,
    /// When the score was last written to the backend
    pub updated_at: Option<DateTime<Utc>>,
    pub price: Option<PriceSample>,
    pub guess: Option<GuessView>,
    pub error: Option<String>,
    pub last_outcome: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GuessReply {
    Accepted {
        direction: Direction,
        reference_price: Decimal,
        remaining_secs: u64,
    },
    AlreadyPending,
    PlayerNotReady,
    NoPrice,
}

/// Everything the session reacts to arrives through one queue.
#[derive(Debug)]
pub enum SessionEvent {
    GuessSubmitted {
        direction: Direction,
        reply: Option<oneshot::Sender<GuessReply>>,
    },
    PlayerLoaded(GameResult<Player>),
    PriceFetched(GameResult<Decimal>),
    ClosingPriceFetched(GameResult<Decimal>),
    ScorePersisted {
        score: i64,
        updated_at: DateTime<Utc>,
        result: GameResult<()>,
    },
}

/// Which step produced the visible error. A later success only clears errors of its own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorSource {
    Init,
    Price,
    Resolution,
    Persist,
}

/// Cheap to clone; used by the HTTP layer to submit guesses and read the view.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionEvent>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub async fn submit_guess(&self, direction: Direction) -> anyhow::Result<GuessReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionEvent::GuessSubmitted { direction, reply: Some(reply_tx) })
            .await
            .map_err(|_| anyhow::anyhow!("game session has ended"))?;
        reply_rx
            .await
            .map_err(|_| anyhow::anyhow!("game session dropped the guess"))
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }
}

/// Starts the session task. It runs until `cancel` fires.
pub fn spawn(
    deps: SessionDeps,
    timing: SessionTiming,
    events: EventLog,
    cancel: CancellationToken,
) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let (view_tx, view_rx) = watch::channel(SessionView::default());

    let session = Session {
        deps,
        timing,
        events,
        tx: tx.clone(),
        view_tx,
        timer: GuessTimer::new(timing.guess_window),
        countdown: None,
        phase: SessionPhase::Loading,
        player: None,
        price: None,
        error: None,
        last_outcome: None,
    };

    let task = tokio::spawn(session.run(rx, cancel));
    (SessionHandle { tx, view: view_rx }, task)
}

struct Session {
    deps: SessionDeps,
    timing: SessionTiming,
    events: EventLog,
    tx: mpsc::Sender<SessionEvent>,
    view_tx: watch::Sender<SessionView>,

    timer: GuessTimer,
    /// Present only while a guess is counting down
    countdown: Option<Interval>,
    phase: SessionPhase,
    player: Option<Player>,
    price: Option<PriceSample>,
    error: Option<(ErrorSource, String)>,
    last_outcome: Option<String>,
}

impl Session {
    async fn run(mut self, mut rx: mpsc::Receiver<SessionEvent>, cancel: CancellationToken) {
        tracing::info!(
            poll_secs = self.timing.price_poll.as_secs(),
            window_secs = self.timing.guess_window.as_secs(),
            "game session started"
        );
        self.publish();
        self.spawn_player_load();

        let mut poll = tokio::time::interval(self.timing.price_poll);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(event) = rx.recv() => self.handle(event),
                _ = poll.tick() => self.spawn_price_fetch(),
                _ = next_tick(&mut self.countdown) => self.on_tick(),
            }
        }

        self.countdown = None;
        tracing::info!("game session stopped");
    }

    fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::GuessSubmitted { direction, reply } => {
                let result = self.on_guess(direction);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            SessionEvent::PlayerLoaded(result) => self.on_player_loaded(result),
            SessionEvent::PriceFetched(result) => self.on_price(result),
            SessionEvent::ClosingPriceFetched(result) => self.on_closing_price(result),
            SessionEvent::ScorePersisted { score, updated_at, result } => {
                self.on_score_persisted(score, updated_at, result)
            }
        }
        self.publish();
    }

    fn on_guess(&mut self, direction: Direction) -> GuessReply {
        if self.timer.is_pending() {
            tracing::debug!(direction = %direction, "guess ignored, one is already pending");
            return GuessReply::AlreadyPending;
        }
        if self.phase != SessionPhase::Ready || self.player.is_none() {
            return GuessReply::PlayerNotReady;
        }
        let Some(sample) = self.price else {
            return GuessReply::NoPrice;
        };

        let now = Instant::now();
        self.timer.submit(direction, sample.usd, now);

        let mut countdown = tokio::time::interval_at(now + COUNTDOWN_TICK, COUNTDOWN_TICK);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.countdown = Some(countdown);

        let remaining_secs = self.timing.guess_window.as_secs();
        tracing::info!(direction = %direction, reference = %sample.usd, "guess started");
        self.events.push_event("guess", &format!("{direction} @ {}", sample.usd));

        GuessReply::Accepted { direction, reference_price: sample.usd, remaining_secs }
    }

    fn on_tick(&mut self) {
        if self.timer.expire(Instant::now()) {
            self.on_countdown_expired();
        }
        self.publish();
    }

    fn on_countdown_expired(&mut self) {
        self.countdown = None;
        tracing::info!("countdown expired, fetching closing price");

        let prices = self.deps.prices.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = prices.current_price().await;
            let _ = tx.send(SessionEvent::ClosingPriceFetched(result)).await;
        });
    }

    fn on_closing_price(&mut self, result: GameResult<Decimal>) {
        let Some(guess) = self.timer.clear() else {
            tracing::warn!("closing price arrived with no pending guess");
            return;
        };

        let closing = match result {
            Ok(price) => price,
            Err(e) => {
                tracing::error!(error = %e, "closing price fetch failed, guess voided");
                self.events.push_event("error", &format!("guess voided: {e}"));
                self.error = Some((ErrorSource::Resolution, e.to_string()));
                return;
            }
        };

        let Some(player) = self.player.as_mut() else {
            return;
        };

        let resolution = Resolution::new(&guess, closing, player.score);
        player.score = resolution.new_score;
        let player_id = player.id.clone();

        tracing::info!(
            direction = %resolution.direction,
            reference = %resolution.reference_price,
            closing = %resolution.closing_price,
            outcome = %resolution.outcome,
            score = resolution.new_score,
            "guess resolved"
        );
        self.events.push_event(
            "resolve",
            &format!(
                "{} {} → {}: {} (score {})",
                resolution.direction,
                resolution.reference_price,
                resolution.closing_price,
                resolution.outcome,
                resolution.new_score
            ),
        );
        self.last_outcome = Some(resolution.message().to_string());

        self.spawn_score_persist(player_id, resolution.new_score);
        self.deps.notifier.notify(NOTIFICATION_TITLE, resolution.message());
        self.spawn_price_fetch();
    }

    fn on_player_loaded(&mut self, result: GameResult<Player>) {
        match result {
            Ok(player) => {
                tracing::info!(player_id = %player.id, score = player.score, "player ready");
                self.events.push_event("player", &format!("{} (score {})", player.id, player.score));
                self.player = Some(player);
                self.phase = SessionPhase::Ready;
            }
            Err(e) => {
                tracing::error!(error = %e, "player initialization failed");
                self.events.push_event("error", &format!("initialization failed: {e}"));
                self.error = Some((ErrorSource::Init, e.to_string()));
                self.phase = SessionPhase::Failed;
            }
        }
    }

    fn on_price(&mut self, result: GameResult<Decimal>) {
        match result {
            Ok(usd) => {
                self.price = Some(PriceSample::now(usd));
                self.events.push_event("price", &usd.to_string());
                if matches!(self.error, Some((ErrorSource::Price, _))) {
                    self.error = None;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "price poll failed");
                self.events.push_event("error", &e.to_string());
                self.error = Some((ErrorSource::Price, e.to_string()));
            }
        }
    }

    fn on_score_persisted(&mut self, score: i64, updated_at: DateTime<Utc>, result: GameResult<()>) {
        match result {
            Ok(()) => {
                if let Some(player) = self.player.as_mut() {
                    player.updated_at = Some(updated_at);
                }
            }
            Err(e) => {
                tracing::error!(score, error = %e, "score update failed");
                self.events.push_event("error", &format!("score {score} not saved: {e}"));
                self.error = Some((ErrorSource::Persist, e.to_string()));
            }
        }
    }

    fn spawn_player_load(&self) {
        let deps = self.deps.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = load_player(deps.identity.as_ref(), deps.backend.as_ref()).await;
            let _ = tx.send(SessionEvent::PlayerLoaded(result)).await;
        });
    }

    fn spawn_price_fetch(&self) {
        let prices = self.deps.prices.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = prices.current_price().await;
            let _ = tx.send(SessionEvent::PriceFetched(result)).await;
        });
    }

    fn spawn_score_persist(&self, player_id: String, score: i64) {
        let backend = self.deps.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let updated_at = Utc::now();
            let result = backend.update_score(&player_id, score, updated_at).await;
            let _ = tx.send(SessionEvent::ScorePersisted { score, updated_at, result }).await;
        });
    }

    fn publish(&self) {
        let guess = match self.timer.state() {
            GuessState::Idle => None,
            GuessState::Pending { guess, resolving } => Some(GuessView {
                direction: guess.direction,
                reference_price: guess.reference_price,
                started_at: guess.started_wall,
                remaining_secs: self.timer.remaining_secs(Instant::now()).unwrap_or(0),
                resolving: *resolving,
            }),
        };

        self.view_tx.send_replace(SessionView {
            phase: self.phase,
            player_id: self.player.as_ref().map(|p| p.id.clone()),
            score: self.player.as_ref().map(|p| p.score).unwrap_or(0),
            updated_at: self.player.as_ref().and_then(|p| p.updated_at),
            price: self.price,
            guess,
            error: self.error.as_ref().map(|(_, msg)| msg.clone()),
            last_outcome: self.last_outcome.clone(),
        });
    }
}

/// Restores the persisted player or creates a fresh one with score 0.
pub(crate) async fn load_player(
    identity: &dyn IdentityStore,
    backend: &dyn PlayerBackend,
) -> GameResult<Player> {
    match identity.load()? {
        Some(id) => match backend.read_player(&id).await? {
            Some(player) => Ok(player),
            None => Err(GameError::UnknownPlayer(id)),
        },
        None => {
            let player = backend.create_player(0).await?;
            identity.save(&player.id)?;
            Ok(player)
        }
    }
}

async fn next_tick(countdown: &mut Option<Interval>) -> Instant {
    match countdown {
        Some(interval) => interval.tick().await,
        None => std::future::pending().await,
    }
}

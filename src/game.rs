use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::types::{Direction, Outcome};

/// A pending prediction with its reference price
#[derive(Debug, Clone, PartialEq)]
pub struct Guess {
    pub direction: Direction,
    pub reference_price: Decimal,
    pub started_at: Instant,
    pub started_wall: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuessState {
    Idle,
    /// `resolving` is set once the countdown has expired and the closing price is being fetched.
    Pending { guess: Guess, resolving: bool },
}

/// Idle → Pending → Idle. At most one guess is outstanding at any time.
#[derive(Debug, Clone)]
pub struct GuessTimer {
    state: GuessState,
    window: Duration,
}

impl GuessTimer {
    pub fn new(window: Duration) -> Self {
        Self { state: GuessState::Idle, window }
    }

    pub fn state(&self) -> &GuessState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, GuessState::Pending { .. })
    }

    pub fn guess(&self) -> Option<&Guess> {
        match &self.state {
            GuessState::Pending { guess, .. } => Some(guess),
            GuessState::Idle => None,
        }
    }

    /// Records a guess if none is pending. Returns false (and changes nothing) otherwise.
    pub fn submit(&mut self, direction: Direction, reference_price: Decimal, now: Instant) -> bool {
        if self.is_pending() {
            return false;
        }
        self.state = GuessState::Pending {
            guess: Guess {
                direction,
                reference_price,
                started_at: now,
                started_wall: Utc::now(),
            },
            resolving: false,
        };
        true
    }

    /// Display value for the countdown, `None` when idle.
    pub fn remaining_secs(&self, now: Instant) -> Option<u64> {
        self.guess()
            .map(|g| remaining_secs(self.window, now.saturating_duration_since(g.started_at)))
    }

    /// True exactly once per guess: the first call after the window has fully elapsed.
    /// Marks the guess as resolving so later ticks cannot fire it again.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &mut self.state {
            GuessState::Pending { guess, resolving } if !*resolving => {
                if now.saturating_duration_since(guess.started_at) >= self.window {
                    *resolving = true;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Returns to Idle, handing back the guess that was pending.
    pub fn clear(&mut self) -> Option<Guess> {
        match std::mem::replace(&mut self.state, GuessState::Idle) {
            GuessState::Pending { guess, .. } => Some(guess),
            GuessState::Idle => None,
        }
    }
}

/// `max(0, window − floor(elapsed_ms / 1000))`
pub fn remaining_secs(window: Duration, elapsed: Duration) -> u64 {
    let elapsed_secs = (elapsed.as_millis() / 1000) as u64;
    window.as_secs().saturating_sub(elapsed_secs)
}

/// Decision rule. A tie counts against the player whichever way they guessed.
pub fn judge(direction: Direction, reference: Decimal, closing: Decimal) -> Outcome {
    match direction {
        Direction::Up if closing > reference => Outcome::Correct,
        Direction::Down if closing < reference => Outcome::Correct,
        _ => Outcome::Incorrect,
    }
}

/// Result of resolving one guess
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub direction: Direction,
    pub reference_price: Decimal,
    pub closing_price: Decimal,
    pub outcome: Outcome,
    pub new_score: i64,
}

impl Resolution {
    pub fn new(guess: &Guess, closing_price: Decimal, score: i64) -> Self {
        let outcome = judge(guess.direction, guess.reference_price, closing_price);
        Self {
            direction: guess.direction,
            reference_price: guess.reference_price,
            closing_price,
            outcome,
            new_score: score + outcome.score_delta(),
        }
    }

    pub fn message(&self) -> &'static str {
        self.outcome.message(self.direction)
    }
}

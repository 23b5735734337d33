use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which way the player thinks the price will move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Parse "up" / "down" (case-insensitive, surrounding whitespace ignored).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Latest USD price reading. Overwritten on every fetch, never kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceSample {
    pub usd: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl PriceSample {
    pub fn now(usd: Decimal) -> Self {
        Self { usd, fetched_at: Utc::now() }
    }
}

/// Anonymous player as held by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub id: String,
    pub score: i64,
    /// `None` until the backend has reported or accepted a write
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    pub fn score_delta(self) -> i64 {
        match self {
            Outcome::Correct => 1,
            Outcome::Incorrect => -1,
        }
    }

    pub fn message(self, direction: Direction) -> &'static str {
        match (self, direction) {
            (Outcome::Correct, Direction::Up) => "Your guess was correct! Bitcoin went up.",
            (Outcome::Correct, Direction::Down) => "Your guess was correct! Bitcoin went down.",
            (Outcome::Incorrect, _) => "Your guess was incorrect.",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Correct => write!(f, "correct"),
            Outcome::Incorrect => write!(f, "incorrect"),
        }
    }
}

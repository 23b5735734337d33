use thiserror::Error;

/// Domain failures surfaced to the player. `Display` is the text shown in the page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// A required URL or key is absent from the environment
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    /// Player backend call failed (create / read / update)
    #[error("{0}")]
    Backend(String),

    /// The persisted identity does not match any backend record
    #[error("Unknown player id {0}")]
    UnknownPlayer(String),

    /// Price API call failed or returned an unexpected shape
    #[error("{0}")]
    Price(String),

    /// Local identity file could not be read or written
    #[error("Identity store error: {0}")]
    Identity(String),
}

pub type GameResult<T> = std::result::Result<T, GameError>;

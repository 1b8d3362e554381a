//! Error types for Roundtable Core
//!
//! Every variant except the theme loading ones is an expected, user-facing
//! room condition. Their `Display` text is what participants see.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("The room is full (all numbers are taken).")]
    PoolExhausted,

    #[error("The game has already started; joining as an observer.")]
    GameAlreadyStarted,

    #[error("The game has not started yet.")]
    GameNotStarted,

    #[error("Opinion text is empty.")]
    EmptyOpinion,

    #[error("Only numbered participants can submit opinions.")]
    NotNumbered,

    #[error("No themes are available.")]
    NoThemes,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse theme TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

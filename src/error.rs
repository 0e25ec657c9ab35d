use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuessError {
    #[error("Please enter a valid number between {min} and {max}!")]
    InvalidInput { min: i64, max: i64 },
    #[error("Wait for your turn!")]
    NotYourTurn,
    #[error("No attempts left! Start a new game.")]
    NoAttemptsLeft,
    #[error("This round is over. Start a new game.")]
    RoundOver,
    #[error("No round in progress.")]
    NoActiveRound,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HelpError {
    #[error("Help already used!")]
    AlreadyUsed,
    #[error("This round is over. Start a new game.")]
    RoundOver,
    #[error("No round in progress.")]
    NoActiveRound,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored data could not be (de)serialized: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

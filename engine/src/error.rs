//! Error types shared across the engine

use std::io;
use thiserror::Error;

/// Errors that abort an operation or a whole solve.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid card: {0}")]
    InvalidCard(String),

    #[error("invalid hand: {0}")]
    InvalidHand(String),

    #[error("cannot evaluate {0} cards, expected 5 to 7")]
    CardCount(usize),

    #[error("missing hole cards for player {0}")]
    MissingHoleCards(usize),

    #[error("unsupported solver type: {0}")]
    UnsupportedSolver(String),

    #[error("unsupported root state: {0}")]
    UnsupportedRoot(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("sampling error: {0}")]
    Sampling(String),
}

/// Errors raised while reading or writing a checkpoint.
///
/// Solvers log these and carry on; only the codec itself returns them.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("corrupt checkpoint: {0}")]
    Corrupt(String),

    #[error("rng state: {0}")]
    RngState(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;

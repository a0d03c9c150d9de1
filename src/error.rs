use thiserror::Error;

/// Errors surfaced by the storage engine.
///
/// `Validation` and `Conflict` are local to a transaction: they cancel it
/// and leave no trace in the WAL. `Io` and `Corruption` come from the WAL
/// layer — `Io` during append/flush leaves the in-memory store untouched,
/// `Corruption` during recovery is fatal to `Engine::open`. `Closed`
/// guards reuse of a transaction or engine past its lifetime.
#[derive(Error, Debug)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt wal record: {0}")]
    Corruption(String),

    #[error("operation attempted against a closed transaction or engine")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;

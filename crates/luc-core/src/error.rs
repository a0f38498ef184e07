use thiserror::Error;

/// Errors produced by the LUC relay and its clients.
#[derive(Debug, Error)]
pub enum LucError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("connection closed")]
    Closed,
}

pub type LucResult<T> = Result<T, LucError>;

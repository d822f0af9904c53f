//! Error types for workpad.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid recurrence policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid count: {0}")]
    InvalidCount(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("invalid import data: {0}")]
    InvalidImport(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

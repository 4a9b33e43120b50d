use std::path::PathBuf;

/// Core error type for the bot.
///
/// Only setup and infrastructure failures travel through this type. Missing
/// content (empty pools, absent corpus, unknown saint) is modelled as values
/// in the content layer and never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid path: {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("invalid data in {path}: {reason}")]
    Data { path: PathBuf, reason: String },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

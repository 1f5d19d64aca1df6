use std::path::PathBuf;

use thiserror::Error;

/// All errors produced by callscan-core.
///
/// None of these abort a batch: the orchestrator converts them into failed
/// per-file results at the file boundary.
#[derive(Debug, Error)]
pub enum CallscanError {
    #[error("invalid audio file: {path}")]
    InvalidFile { path: PathBuf },

    #[error("failed to load audio: {path}")]
    LoadFailure { path: PathBuf },

    #[error("audio too short: {duration_ms}ms")]
    TooShort { duration_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CallscanError>;

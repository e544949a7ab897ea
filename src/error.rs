use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("stats database error: {0}")]
    Stats(#[from] rusqlite::Error),

    #[error("no practice text found in {path}")]
    EmptyImport { path: PathBuf },

    #[error("unknown topic: {name}")]
    UnknownTopic { name: String },
}

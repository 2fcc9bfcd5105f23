use thiserror::Error;

/// Errors surfaced by the storage and vocabulary layers.
///
/// The scene never propagates these: it logs them and keeps running.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("vocabulary '{0}' not found")]
    VocabularyNotFound(String),

    #[error("vocabulary '{0}' has no usable words")]
    EmptyVocabulary(String),
}

pub type Result<T> = std::result::Result<T, GameError>;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors from writing result rows.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

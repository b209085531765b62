use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Store root does not exist or is not a directory: {path}")]
    MissingStoreRoot { path: String },

    #[error("Request failed with status {status}")]
    RequestFailed { status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Geosr(#[from] geosr::Error),
}

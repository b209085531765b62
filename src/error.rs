//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, GDAL, storage and inference runtime errors, and provides semantic
//! variants for request validation and tiling/inference invariant violations.
//! Every variant belongs to an [`ErrorClass`] so callers can tell a bad request
//! apart from a processing failure.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification reported to callers of the request handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing or invalid request/configuration; retrying will not help.
    BadRequest,
    /// An invariant broke while processing, or an adapter failed.
    ProcessingFailure,
}

impl ErrorClass {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorClass::BadRequest => 400,
            ErrorClass::ProcessingFailure => 500,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::io::StorageError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("Band indices {indices:?} exceed available bands {available}")]
    BandIndexOutOfRange { indices: Vec<usize>, available: usize },

    #[error("Image {height}x{width} is not a multiple of tile size {tile_size}")]
    TileDivision {
        height: usize,
        width: usize,
        tile_size: usize,
    },

    #[error("Tile ({row}, {col}) has shape {found:?}, grid expects {expected:?}")]
    TileShapeMismatch {
        row: usize,
        col: usize,
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    #[error("Tile ({row}, {col}) is outside the {tiles_y}x{tiles_x} grid")]
    TileOutOfGrid {
        row: usize,
        col: usize,
        tiles_y: usize,
        tiles_x: usize,
    },

    #[error("Tile ({row}, {col}) missing from grid")]
    MissingTile { row: usize, col: usize },

    #[error("Unexpected super-resolution output: {height}x{width} is not square")]
    NonSquareOutput { height: usize, width: usize },

    #[error("Cannot detect scale: output size {output} is not a positive multiple of padded tile size {padded}")]
    ScaleDetection { output: usize, padded: usize },

    #[error("Tile ({row}, {col}) output size {found} disagrees with detected scale {scale} (expected {expected})")]
    InconsistentScale {
        row: usize,
        col: usize,
        scale: usize,
        expected: usize,
        found: usize,
    },

    #[error("Malformed inference output: {0}")]
    InferenceOutput(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

impl Error {
    pub fn inference<E: std::fmt::Display>(e: E) -> Self {
        Error::Inference(e.to_string())
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Error::InvalidRequest(_)
            | Error::InvalidArgument { .. }
            | Error::MissingArgument { .. }
            | Error::BandIndexOutOfRange { .. }
            | Error::Storage(crate::io::StorageError::InvalidKey(_)) => ErrorClass::BadRequest,
            _ => ErrorClass::ProcessingFailure,
        }
    }
}

use thiserror::Error;

pub type BoardResult<T> = Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to table loading, schema shape and frame operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Data frame error: {0}")]
    DataFrame(String),

    #[error("Missing required column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    #[error("Unknown axis column '{column}' for {source_name}; available: {available}")]
    UnknownAxisColumn {
        source_name: String,
        column: String,
        available: String,
    },

    #[error("Invalid value range (min: {min}, max: {max})")]
    InvalidRange { min: f64, max: f64 },
}

/// Errors related to reading inputs and writing rendered frames.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO operation failed")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("Input file not found: {0}")]
    NotFound(String),

    #[error("Failed to create reader: {0}")]
    ReaderCreation(String),

    #[error("Failed to read data: {0}")]
    ReadFailed(String),

    #[error("Failed to write data: {0}")]
    WriteFailed(String),
}

/// Errors related to dashboard configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid dashboard configuration: {0}")]
    Invalid(String),

    #[error("Failed to read configuration '{path}': {msg}")]
    Unreadable { path: String, msg: String },
}

pub(crate) fn polars_err(context: &str, e: polars::error::PolarsError) -> BoardError {
    DataError::DataFrame(format!("{context}: {e}")).into()
}

use thiserror::Error;

/// Errors surfaced before any training arithmetic runs.
///
/// Numeric divergence during a run is not an error: `NaN`/`Inf` values flow
/// into the snapshots unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The dataset cannot be trained on (empty, non-finite values, ragged features).
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// A configuration value is out of its allowed domain.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(String),
    /// Reading or writing a trace file failed.
    #[error("io error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, Error>;

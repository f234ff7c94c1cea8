use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dataset is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("invalid row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("dataset contains no usable rows")]
    EmptyDataset,

    #[error("grid_position must be an integer, got {0:?}")]
    InvalidGridPosition(String),

    #[error("model artifact is inconsistent: {0}")]
    Artifact(String),

    #[error("least squares solve failed: {0}")]
    Solver(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// True when the caller sent bad input, as opposed to a server-side fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidGridPosition(_))
    }
}

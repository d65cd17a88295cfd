use std::path::PathBuf;

/// Failure while navigating the event tree or reading a table.
///
/// Both cases are expected while a front end probes the model (asking for
/// one row past the end, stepping past the last sibling) and are always
/// returned, never raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("index {index} out of range (count {count})")]
    OutOfRange { index: usize, count: usize },

    #[error("no sibling next to ordinal {ordinal}")]
    NoSibling { ordinal: usize },

    #[error("no column named {0:?}")]
    UnknownColumn(String),
}

/// Failure while loading or assembling a capture.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed capture snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid event tag {0}")]
    InvalidTag(u8),

    #[error("inconsistent capture: {what}")]
    Inconsistent { what: String },
}

impl CaptureError {
    pub(crate) fn inconsistent(what: impl Into<String>) -> Self {
        Self::Inconsistent { what: what.into() }
    }
}

pub type ViewResult<T> = Result<T, ViewError>;

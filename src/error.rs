use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by index construction, graph handling and result output.
///
/// Construction-phase variants (`UnreadableInput`, `CorruptIndex`,
/// `GraphMismatch`) abort a run. Per-query variants (`InvalidNucleotide`,
/// `EmptyHeadOrTail`, `MalformedQuery`) are isolated to one query by the
/// callers in `search` and `graph::resolver`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read input '{}': {source}", path.display())]
    UnreadableInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write output '{}': {source}", path.display())]
    UnwritableOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("persisted index '{}' is corrupt: {reason}", path.display())]
    CorruptIndex { path: PathBuf, reason: String },

    #[error("invalid nucleotide '{0}'")]
    InvalidNucleotide(char),

    #[error("graph and colour files disagree: {0}")]
    GraphMismatch(String),

    #[error("query has no head or tail k-mer")]
    EmptyHeadOrTail,

    #[error("malformed query '{0}'")]
    MalformedQuery(String),

    #[error("{}:{line}: {msg}", path.display())]
    Format { path: PathBuf, line: usize, msg: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::UnreadableInput { path: path.into(), source }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, msg: impl Into<String>) -> Self {
        Error::Format { path: path.into(), line, msg: msg.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

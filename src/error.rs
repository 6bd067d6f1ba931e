use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a fixture table into [`TestCases`](crate::TestCases).
///
/// Any of these aborts the whole load; no partial collection is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read test cases from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed test case table: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing mandatory information in row {row} ({name})")]
    Validation { row: usize, name: String },

    #[error("invalid status code {value:?} in row {row}: expected three leading digits")]
    StatusCode { row: usize, value: String },
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("url {0} has no host")]
    NoHost(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] http::Error),

    #[error(transparent)]
    Hyper(#[from] hyper::Error),
}

use std::path::PathBuf;
use thiserror::Error;

/// Convenient Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the library can report
///
/// The policy engines, trace generator and simulator are infallible, so errors only come from
/// configuration and from the results sink
#[derive(Debug, Error)]
pub enum Error {
    /// The output destination could not be created or written
    #[error("Failed to create file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file isn't valid JSON, or has fields of the wrong type
    #[error("Couldn't parse the config file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The configuration parsed, but describes a simulation which can't be run
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error came from creating or writing the output destination
    pub fn is_output_failure(&self) -> bool {
        matches!(self, Error::Io { .. })
    }
}

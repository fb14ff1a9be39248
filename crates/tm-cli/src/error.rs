//! Error types for the CLI

use std::path::PathBuf;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Common(#[from] tm_common::Error),

    #[error("cannot read {path}: {message}")]
    ReadFile { path: PathBuf, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("{failed} of {total} testruns did not succeed")]
    TestrunsFailed { failed: usize, total: usize },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    pub fn read_file(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Error::ReadFile {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No index file at the given path; run `build` first.
    #[error("index file not found: {}", .0.display())]
    IndexNotFound(PathBuf),

    /// The persisted document is not a valid index.
    #[error("malformed index document: {0}")]
    Deserialize(String),

    #[error("failed to serialize index: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    pub fn deserialize<S: Into<String>>(msg: S) -> Self {
        Error::Deserialize(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

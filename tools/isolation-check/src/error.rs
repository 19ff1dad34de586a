//! Failures of the checker itself.
//!
//! Violations and cycles are findings, reported through
//! [`CheckReport`](crate::CheckReport). These errors mean the check could
//! not be carried out at all.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("modules root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("modules root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid checker configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid scanning pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

impl CheckError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

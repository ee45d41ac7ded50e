//! Error types for the panel info library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when loading the database or querying devices.
#[derive(Error, Debug)]
pub enum Error {
    /// The device database could not be loaded.
    #[error("Failed to load device database: {0}")]
    Load(#[from] LoadError),

    /// None of the candidate compatible strings is known.
    #[error("No display panel known for {}", .candidates.join(", "))]
    NoMatch { candidates: Vec<String> },

    /// The database behind a resolved device was invalidated.
    #[error("Device handle refers to invalidated database (generation {generation})")]
    StaleHandle { generation: u64 },

    /// Invalid compatible string.
    #[error("Invalid compatible string: {0:?}")]
    InvalidCompatible(String),

    /// Invalid corner position name.
    #[error("Invalid corner position: {0}")]
    InvalidCorner(String),

    /// The device-tree compatible property could not be read.
    #[error("Failed to read device tree {}: {source}", .path.display())]
    DeviceTree {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that make a database source unusable.
///
/// No partial database is ever built when one of these occurs.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Reading the source failed.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or has the wrong shape.
    #[error("Malformed document {origin}: {source}")]
    Syntax {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record violates the database invariants.
    #[error("Invalid record {origin}: {reason}")]
    InvalidRecord { origin: String, reason: String },

    /// A cutout path could not be parsed.
    #[error("Invalid cutout path {path:?} at offset {offset}: {reason}")]
    CutoutPath {
        path: String,
        offset: usize,
        reason: String,
    },
}

impl LoadError {
    pub(crate) fn invalid(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadError::InvalidRecord {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    /// Attaches the record origin to a cutout error raised while parsing it.
    pub(crate) fn in_record(self, origin: &str) -> Self {
        match self {
            LoadError::CutoutPath { path, offset, reason } => LoadError::InvalidRecord {
                origin: origin.to_string(),
                reason: format!("cutout path {path:?} at offset {offset}: {reason}"),
            },
            other => other,
        }
    }
}

impl Error {
    /// Returns true if this is a database load failure.
    pub fn is_load(&self) -> bool {
        matches!(self, Error::Load(_))
    }

    /// Returns true if no candidate matched.
    pub fn is_no_match(&self) -> bool {
        matches!(self, Error::NoMatch { .. })
    }

    /// Returns true if the handle outlived its database.
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::StaleHandle { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_message() {
        let err = Error::NoMatch {
            candidates: vec!["foo,bar".to_string(), "foo,baz".to_string()],
        };
        assert_eq!(err.to_string(), "No display panel known for foo,bar, foo,baz");
        assert!(err.is_no_match());
        assert!(!err.is_load());
    }

    #[test]
    fn test_cutout_error_in_record() {
        let err = LoadError::CutoutPath {
            path: "M 1".to_string(),
            offset: 3,
            reason: "expected number".to_string(),
        }
        .in_record("oneplus,fajita");
        match err {
            LoadError::InvalidRecord { origin, reason } => {
                assert_eq!(origin, "oneplus,fajita");
                assert!(reason.contains("offset 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. The domain crate hands these errors
//! back to its callers untouched, so the kind stays inspectable all the way
//! up to the command line.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// How a record was looked up when it could not be found.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Key {
    #[display("#{_0}")]
    Id(i64),
    #[display("'{_0}'")]
    Name(String),
}

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No file record matches the lookup.
    #[display("file record not found: {_0}")]
    FileNotFound(#[error(not(source))] Key),
    /// No tag record matches the lookup.
    #[display("tag record not found: {_0}")]
    TagNotFound(#[error(not(source))] Key),
    /// Refused to record a file path that has nothing behind it on disk.
    #[display("no file exists at: {}", _0.display())]
    NotOnDisk(#[error(not(source))] PathBuf),
    /// No data folder in the directory or any of its ancestors.
    #[display("data folder not found at or above {}", _0.display())]
    DataFolderNotFound(#[error(not(source))] PathBuf),
    /// Refused to create a data folder on top of an existing one.
    #[display("data folder already exists at {}", _0.display())]
    AlreadyInitialized(#[error(not(source))] PathBuf),
    /// Anything the underlying database reported that isn't classified above.
    #[display("database error")]
    Database,
    #[display("I/O error: {_0}")]
    Io(IoError),
    #[display("invalid data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database | Self::Io(_))
    }

    /// Returns `true` for the "no such record" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::TagNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::FileNotFound(Key::Id(3)), "file record not found: #3")]
    #[case(ErrorKind::TagNotFound(Key::Name("work".to_string())), "tag record not found: 'work'")]
    #[case(ErrorKind::NotOnDisk(PathBuf::from("/tmp/a.txt")), "no file exists at: /tmp/a.txt")]
    fn test_display(#[case] kind: ErrorKind, #[case] expected: &str) {
        assert_eq!(kind.to_string(), expected);
    }

    #[test]
    fn test_not_found_family() {
        assert!(ErrorKind::FileNotFound(Key::Id(1)).is_not_found());
        assert!(ErrorKind::TagNotFound(Key::Id(1)).is_not_found());
        assert!(!ErrorKind::Database.is_not_found());
        assert!(!ErrorKind::NotOnDisk(PathBuf::from("x")).is_not_found());
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Database.is_retryable());
        assert!(ErrorKind::Io(IoError::other("disk full")).is_retryable());
        assert!(!ErrorKind::TagNotFound(Key::Id(1)).is_retryable());
        assert!(!ErrorKind::AlreadyInitialized(PathBuf::from("/tree")).is_retryable());
    }
}

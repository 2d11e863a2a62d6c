// Rust guideline compliant 2026-02-06

//! Error types for the pincheck core library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pincheck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pincheck operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A TOML document could not be parsed.
    #[error("Invalid TOML in {path}: {message}")]
    Toml {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A PEP 440 version string could not be parsed.
    #[error("Invalid version: '{0}'")]
    InvalidVersion(String),

    /// A version specifier could not be parsed.
    #[error("Invalid specifier: '{0}'")]
    InvalidSpecifier(String),

    /// A PEP 508 requirement line could not be parsed.
    #[error("Invalid requirement '{line}': {reason}")]
    InvalidRequirement {
        /// The offending requirement text.
        line: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An environment marker could not be parsed.
    #[error("Invalid marker '{marker}': {reason}")]
    InvalidMarker {
        /// The offending marker text.
        marker: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A setup.cfg file is malformed.
    #[error("Invalid setup.cfg {path} (line {line}): {message}")]
    SetupCfg {
        /// File that failed to parse.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Parser message.
        message: String,
    },

    /// A lock file line could not be parsed as an exact pin.
    #[error("Cannot parse lock file {path} (line {line}): {message}")]
    LockFile {
        /// Lock file path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Parser message.
        message: String,
    },

    /// A lock file required by the check does not exist.
    #[error("Lock file not found: {0}")]
    LockFileMissing(PathBuf),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Returns true when the error is a parse failure of an input file.
    ///
    /// Parse failures are reported separately from unsatisfied constraints.
    pub fn is_parse_error(&self) -> bool {
        !matches!(
            self,
            Error::Io(_) | Error::LockFileMissing(_) | Error::InvalidConfig(_)
        )
    }
}

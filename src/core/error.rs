//! Error types for configuring and running scans.
//!
//! Configuration errors fail fast before a scan starts. Scan errors are
//! per-source I/O failures: the coordinator logs them and moves on to the
//! next input.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A scan setting outside its accepted bounds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("timeout must be greater than zero seconds (got {0})")]
    InvalidTimeout(i64),

    #[error("retries cannot be less than zero (got {0})")]
    InvalidRetries(i64),

    #[error("thread count cannot be less than two (got {0})")]
    InvalidThreadCount(i64),

    #[error("separator cannot be a line terminator (got {0:?})")]
    InvalidSeparator(char),
}

/// A failure that makes one input source unscannable.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("could not open input file {}", .path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not open output file {}", .path.display())]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write results to {}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

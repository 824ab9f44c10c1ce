//! Error types for the autotest harness
//!
//! Only environment errors abort a run. Everything a scenario can trip over
//! (empty lists, bad patterns, missing operands) is turned into a failing
//! verdict by the runner instead of escaping to `main`.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Environment Errors ===
    #[error("Baseline fixture '{path}' not found. Check [paths].data_dir in the config")]
    MissingFixture { path: String },

    #[error("Unable to change directory to '{path}': {source}")]
    WorkDir {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: String,
        to: String,
        #[source]
        source: io::Error,
    },

    // === Scenario Errors ===
    #[error("Unknown operation '{0}'. Known operations: add, watch, delete, history, recent, queue, next, exit")]
    UnknownOperation(String),

    #[error("Operation '{0}' requires an operand")]
    MissingOperand(String),

    #[error("List file '{0}' has no first record (empty or blank first line)")]
    EmptyList(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // === Process Errors ===
    #[error("Failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing fixture error
    pub fn missing_fixture(path: &Path) -> Self {
        Self::MissingFixture {
            path: path.display().to_string(),
        }
    }

    /// Create a work directory error
    pub fn work_dir(path: &Path, source: io::Error) -> Self {
        Self::WorkDir {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create a copy error
    pub fn copy(from: &Path, to: &Path, source: io::Error) -> Self {
        Self::Copy {
            from: from.display().to_string(),
            to: to.display().to_string(),
            source,
        }
    }

    /// Create a file read error
    pub fn file_read(path: &Path, error: io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create an empty list error
    pub fn empty_list(path: &Path) -> Self {
        Self::EmptyList(path.display().to_string())
    }

    /// Whether this error must abort the whole run rather than fail one scenario
    pub fn is_environment(&self) -> bool {
        matches!(
            self,
            Error::MissingFixture { .. }
                | Error::WorkDir { .. }
                | Error::Copy { .. }
                | Error::Launch { .. }
                | Error::Config(_)
                | Error::ConfigParse(_)
                | Error::Io(_)
        )
    }
}

//! Error types for recordkeeper.
//!
//! This module defines the error type shared by the stores, the
//! authentication workflow and the application driver. Input validation
//! failures during prompts are not errors in this sense; they live in
//! [`crate::editor::ValidationError`] and never leave the prompt loop.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for recordkeeper operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to read a data file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path to the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a data file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        /// Path to the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding failed while writing the record file.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Path to the record file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: csv::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Logging Errors ===
    /// The log sink could not be opened.
    #[error("failed to open log file {path}: {source}")]
    LogInit {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Console Errors ===
    /// Standard input reached end of file while a prompt was waiting.
    #[error("input closed while waiting for {prompt:?}")]
    InputClosed {
        /// The prompt that was being answered.
        prompt: String,
    },

    // === I/O Errors ===
    /// Console or other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for recordkeeper operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an input-closed error for the given prompt.
    #[must_use]
    pub fn input_closed(prompt: impl Into<String>) -> Self {
        Self::InputClosed {
            prompt: prompt.into(),
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error means the console has no more input.
    #[must_use]
    pub fn is_input_closed(&self) -> bool {
        matches!(self, Self::InputClosed { .. })
    }
}

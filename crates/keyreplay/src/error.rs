//! Error handling for the keyreplay binary.

use std::{io, result};

use thiserror::Error;

/// Convenient result type for keyreplay operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while replaying a script.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrapper for standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Errors surfaced by the dispatcher or its settings.
    #[error("Dispatcher error: {0}")]
    Dispatch(#[from] keydispatch::Error),
    /// The replay script could not be parsed.
    #[error("Failed to parse script: {0}")]
    Script(String),
    /// The script parsed but contains no steps.
    #[error("Script contains no steps")]
    EmptyScript,
}

//! Error types for the key dispatcher.

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the dispatcher crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the key dispatcher.
///
/// Dispatch itself never fails; these cover construction and settings loading.
#[derive(Debug, Error)]
pub enum Error {
    /// A dispatcher was constructed outside of a tokio runtime.
    #[error("No tokio runtime available; construct the dispatcher inside a runtime or pass a handle")]
    NoRuntime,

    /// Settings could not be parsed.
    #[error("Settings error: {0}")]
    Config(String),

    /// I/O failure while reading settings.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

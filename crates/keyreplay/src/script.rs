//! Replay scripts: a RON list of key steps.

use std::{fmt, fs, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

/// One scripted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Step {
    /// Press the key with this code.
    Down(i32),
    /// Release the key with this code.
    Up(i32),
    /// Press and release in one step.
    DownUp(i32),
    /// Abort the press of this code.
    Cancel(i32),
    /// Pause for this many milliseconds.
    Wait(u64),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down(c) => write!(f, "down {c}"),
            Self::Up(c) => write!(f, "up {c}"),
            Self::DownUp(c) => write!(f, "down-up {c}"),
            Self::Cancel(c) => write!(f, "cancel {c}"),
            Self::Wait(ms) => write!(f, "wait {ms}ms"),
        }
    }
}

/// Parse a script from RON text.
pub fn parse(text: &str) -> Result<Vec<Step>> {
    let steps: Vec<Step> = ron::from_str(text).map_err(|e| Error::Script(e.to_string()))?;
    if steps.is_empty() {
        return Err(Error::EmptyScript);
    }
    Ok(steps)
}

/// Read and parse a script file.
pub fn load(path: &Path) -> Result<Vec<Step>> {
    parse(&fs::read_to_string(path)?)
}

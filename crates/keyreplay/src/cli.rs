//! Command-line interface definitions for keyreplay.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use logging::LogArgs;

/// Command-line interface for the `keyreplay` binary.
#[derive(Parser, Debug)]
#[command(
    name = "keyreplay",
    about = "Replay a scripted key sequence through the dispatcher and print delivered events",
    version
)]
pub struct Cli {
    /// Logging controls shared across workspace binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// Script of key steps in RON syntax, e.g. `[Down(-7), Wait(600), Up(-7)]`.
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Optional settings file (RON) supplying the long-press delay and delete behavior.
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Override the base long-press threshold.
    #[arg(long, value_parser = humantime::parse_duration, value_name = "DURATION")]
    pub long_press: Option<Duration>,

    /// Repeat held delete keys word by word.
    #[arg(long)]
    pub delete_word: bool,

    /// Key codes whose long-press handler accepts, consuming the press.
    #[arg(
        long = "accept-long-press",
        value_name = "CODE",
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    pub accept_long_press: Vec<i32>,

    /// Replace the default set of repeatable key codes.
    #[arg(
        long,
        value_name = "CODE",
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    pub repeatable: Option<Vec<i32>>,
}

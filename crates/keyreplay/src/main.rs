#![warn(missing_docs)]

//! Entry point for the `keyreplay` binary.

mod cli;
mod error;
mod replay;
mod script;

use std::process;

use clap::Parser;
use tokio::runtime::Builder;
use tracing::error;

use crate::{cli::Cli, error::Result};

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and replay the script on a single-threaded runtime.
fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log.spec());
    let runtime = Builder::new_current_thread().enable_time().build()?;
    runtime.block_on(replay::run(&cli))?;
    Ok(())
}

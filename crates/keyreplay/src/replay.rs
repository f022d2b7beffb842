//! Drive a dispatcher through a script and print what the receiver sees.

use std::{collections::HashSet, sync::Arc, time::Duration};

use keydispatch::{
    ChannelReceiver, DeleteLongPress, Dispatcher, InputEvent, KeyCode, KeyData, Settings,
};
use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    cli::Cli,
    error::Result,
    script::{self, Step},
};

/// Resolve settings from the optional file and CLI overrides.
fn settings_for(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(delay) = cli.long_press {
        settings.long_press_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    }
    if cli.delete_word {
        settings.delete_long_press = DeleteLongPress::Word;
    }
    Ok(settings)
}

/// Print delivered events until the receiver is dropped. Returns the number printed.
fn spawn_printer(mut rx: UnboundedReceiver<InputEvent>, start: Instant) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut printed = 0;
        while let Some(event) = rx.recv().await {
            println!("{:>6}ms  {event}", start.elapsed().as_millis());
            printed += 1;
        }
        printed
    })
}

/// Wait for the printer to drain. A failed printer is logged and counts as zero.
async fn join_printer(printer: JoinHandle<usize>) -> usize {
    match printer.await {
        Ok(printed) => printed,
        Err(e) => {
            warn!(error = %e, "replay_printer_failed");
            0
        }
    }
}

/// Apply one step to the dispatcher.
async fn apply(dispatcher: &Dispatcher, step: Step, accept_long_press: &HashSet<i32>) {
    debug!(%step, "replay_step");
    match step {
        Step::Down(code) => {
            let accept = accept_long_press.contains(&code);
            dispatcher.send_down(&KeyData::new(code), move || accept, || true);
        }
        Step::Up(code) => dispatcher.send_up(&KeyData::new(code)),
        Step::DownUp(code) => dispatcher.send_down_up(&KeyData::new(code)),
        Step::Cancel(code) => dispatcher.send_cancel(&KeyData::new(code)),
        Step::Wait(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
    }
}

/// Replay the script named on the command line. Returns the number of delivered events.
pub async fn run(cli: &Cli) -> Result<usize> {
    let steps = script::load(&cli.script)?;
    let settings = settings_for(cli)?;
    info!(
        steps = steps.len(),
        long_press_ms = settings.long_press_delay_ms,
        delete = ?settings.delete_long_press,
        "replay_start"
    );

    let repeatable = cli
        .repeatable
        .clone()
        .unwrap_or_else(|| KeyCode::DEFAULT_REPEATABLE.to_vec());
    let dispatcher = Dispatcher::new(Arc::new(settings), repeatable)?;
    let accept_long_press: HashSet<i32> = cli.accept_long_press.iter().copied().collect();

    let (receiver, rx) = ChannelReceiver::channel();
    dispatcher.set_receiver(Some(Arc::new(receiver)));
    let printer = spawn_printer(rx, Instant::now());

    for step in steps {
        apply(&dispatcher, step, &accept_long_press).await;
    }
    if dispatcher.pressed_count() > 0 {
        info!(still_pressed = dispatcher.pressed_count(), "replay_end_with_keys_down");
    }

    // Dropping the receiver closes the channel and ends the printer.
    dispatcher.shutdown().await;
    let delivered = join_printer(printer).await;
    info!(delivered, "replay_done");
    Ok(delivered)
}

//! Key dispatcher
//!
//! Turns raw key press/release signals from a software keyboard into a semantic event stream
//! delivered to a single receiver:
//! - down, up, repeat and cancel events, each at most once per press
//! - long-press detection with per-key thresholds
//! - auto-repeat for configured keys, including word-wise repeat for delete keys
//! - consecutive-press queries for multi-tap detection
//!
//! The primary type is [`Dispatcher`]. Events go to an [`InputEventReceiver`]; timing comes
//! from a [`ConfigProvider`]. Multiple keys may be held at once, and a release racing its own
//! long-press timer is resolved without losing or duplicating events.

mod config;
mod dispatcher;
mod error;
mod key;
mod receiver;
mod registry;
mod scheduler;
pub mod test_support;

pub use config::{ConfigProvider, DEFAULT_LONG_PRESS_DELAY_MS, DeleteLongPress, LiveConfig, Settings};
pub use dispatcher::{Dispatcher, EventData, STOP_WAIT_TIMEOUT_MS};
pub use error::{Error, Result};
pub use key::{KeyCode, KeyData};
pub use receiver::{ChannelReceiver, InputEvent, InputEventReceiver};
pub use scheduler::{
    PressHandler, REPEAT_BASE_DELAY_MS, long_press_delay, repeat_data, repeat_delay,
};

//! Event receivers: the consumer side of the dispatcher.

use std::{fmt, sync::Arc};

use parking_lot::RwLock;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::trace;

use crate::KeyData;

/// Consumer of dispatched key events.
///
/// Calls are synchronous and fire-and-forget. The dispatcher never holds a lock while calling
/// into a receiver, so implementations may call back into the dispatcher.
pub trait InputEventReceiver: Send + Sync {
    /// A key went down.
    fn on_input_key_down(&self, data: &KeyData);
    /// A key was released without a long-press or repeat consuming it.
    fn on_input_key_up(&self, data: &KeyData);
    /// A held key repeated. `data` is the effective repeat key, which may differ from the
    /// pressed key (delete keys can repeat as word deletes).
    fn on_input_key_repeat(&self, data: &KeyData);
    /// A press was aborted.
    fn on_input_key_cancel(&self, data: &KeyData);
}

/// A dispatched event, as an owned value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// See [`InputEventReceiver::on_input_key_down`].
    Down(KeyData),
    /// See [`InputEventReceiver::on_input_key_up`].
    Up(KeyData),
    /// See [`InputEventReceiver::on_input_key_repeat`].
    Repeat(KeyData),
    /// See [`InputEventReceiver::on_input_key_cancel`].
    Cancel(KeyData),
}

impl InputEvent {
    /// Key data carried by the event.
    pub fn data(&self) -> &KeyData {
        match self {
            Self::Down(d) | Self::Up(d) | Self::Repeat(d) | Self::Cancel(d) => d,
        }
    }

    /// Short lowercase name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Down(_) => "down",
            Self::Up(_) => "up",
            Self::Repeat(_) => "repeat",
            Self::Cancel(_) => "cancel",
        }
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6} {}", self.kind(), self.data())
    }
}

/// Receiver that forwards every event over an unbounded tokio channel.
#[derive(Clone)]
pub struct ChannelReceiver {
    /// Sending half of the event channel.
    tx: UnboundedSender<InputEvent>,
}

impl ChannelReceiver {
    /// Forward events into `tx`.
    pub fn new(tx: UnboundedSender<InputEvent>) -> Self {
        Self { tx }
    }

    /// Create a receiver together with the consuming end of its channel.
    pub fn channel() -> (Self, UnboundedReceiver<InputEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Send `event`, ignoring a closed channel.
    fn forward(&self, event: InputEvent) {
        if self.tx.send(event).is_err() {
            trace!("receiver_channel_closed");
        }
    }
}

impl InputEventReceiver for ChannelReceiver {
    fn on_input_key_down(&self, data: &KeyData) {
        self.forward(InputEvent::Down(data.clone()));
    }

    fn on_input_key_up(&self, data: &KeyData) {
        self.forward(InputEvent::Up(data.clone()));
    }

    fn on_input_key_repeat(&self, data: &KeyData) {
        self.forward(InputEvent::Repeat(data.clone()));
    }

    fn on_input_key_cancel(&self, data: &KeyData) {
        self.forward(InputEvent::Cancel(data.clone()));
    }
}

/// Shared, replaceable slot holding the current receiver.
///
/// The receiver is cloned out of the lock before each call.
#[derive(Clone, Default)]
pub(crate) struct ReceiverSlot {
    /// The installed receiver, if any.
    inner: Arc<RwLock<Option<Arc<dyn InputEventReceiver>>>>,
}

impl ReceiverSlot {
    /// Install, replace or clear the receiver.
    pub(crate) fn set(&self, receiver: Option<Arc<dyn InputEventReceiver>>) {
        *self.inner.write() = receiver;
    }

    /// Returns true if a receiver is installed.
    pub(crate) fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Clone of the installed receiver; the lock is released before delivery.
    fn current(&self) -> Option<Arc<dyn InputEventReceiver>> {
        self.inner.read().clone()
    }

    /// Deliver a down event, if a receiver is installed.
    pub(crate) fn down(&self, data: &KeyData) {
        if let Some(r) = self.current() {
            r.on_input_key_down(data);
        }
    }

    /// Deliver an up event, if a receiver is installed.
    pub(crate) fn up(&self, data: &KeyData) {
        if let Some(r) = self.current() {
            r.on_input_key_up(data);
        }
    }

    /// Deliver a repeat event, if a receiver is installed.
    pub(crate) fn repeat(&self, data: &KeyData) {
        if let Some(r) = self.current() {
            r.on_input_key_repeat(data);
        }
    }

    /// Deliver a cancel event, if a receiver is installed.
    pub(crate) fn cancel(&self, data: &KeyData) {
        if let Some(r) = self.current() {
            r.on_input_key_cancel(data);
        }
    }
}

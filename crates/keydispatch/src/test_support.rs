//! Test support utilities for keydispatch unit and integration tests.
//! These helpers are public so the integration suite and downstream crates can share them.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{InputEvent, InputEventReceiver, KeyData};

/// Receiver that records every event it is given.
#[derive(Default)]
pub struct RecordingReceiver {
    /// Everything delivered so far.
    events: Mutex<Vec<InputEvent>>,
}

impl RecordingReceiver {
    /// A fresh recorder, ready to hand to [`crate::Dispatcher::set_receiver`].
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Copy of all events recorded so far, in delivery order.
    pub fn events(&self) -> Vec<InputEvent> {
        self.events.lock().clone()
    }

    /// Events recorded for `code`, in delivery order.
    pub fn events_for(&self, code: i32) -> Vec<InputEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.data().code == code)
            .cloned()
            .collect()
    }

    /// Number of recorded events of `kind` ("down", "up", "repeat" or "cancel").
    pub fn count(&self, kind: &str) -> usize {
        self.events.lock().iter().filter(|e| e.kind() == kind).count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Append one event.
    fn push(&self, event: InputEvent) {
        self.events.lock().push(event);
    }
}

impl InputEventReceiver for RecordingReceiver {
    fn on_input_key_down(&self, data: &KeyData) {
        self.push(InputEvent::Down(data.clone()));
    }

    fn on_input_key_up(&self, data: &KeyData) {
        self.push(InputEvent::Up(data.clone()));
    }

    fn on_input_key_repeat(&self, data: &KeyData) {
        self.push(InputEvent::Repeat(data.clone()));
    }

    fn on_input_key_cancel(&self, data: &KeyData) {
        self.push(InputEvent::Cancel(data.clone()));
    }
}

//! The dispatcher: public entry point tying the registry, delay tasks and receiver together.

use std::{collections::HashSet, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{runtime::Handle, time::Instant};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, trace};

use crate::{
    ConfigProvider, Error, InputEventReceiver, KeyCode, KeyData, Result,
    receiver::ReceiverSlot,
    registry::PressedKeys,
    scheduler::{self, DelayTask, RepeatPlan},
};

/// Maximum time [`Dispatcher::shutdown`] waits for delay tasks to acknowledge cancellation.
pub const STOP_WAIT_TIMEOUT_MS: u64 = 50;

/// Snapshot of the most recent delivered down or up event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventData {
    /// When the event was dispatched.
    pub timestamp: Instant,
    /// The key involved.
    pub data: KeyData,
}

impl EventData {
    /// Same code as `data`, and less than `max_diff` old.
    fn is_consecutive(&self, data: &KeyData, max_diff: Duration) -> bool {
        self.data.code == data.code && self.timestamp.elapsed() < max_diff
    }
}

/// Turns raw press/release calls into down, up, repeat and cancel events.
///
/// All methods are synchronous. Long-press and repeat timing run on tasks spawned onto the
/// runtime captured at construction; each pressed key owns one such task. Cloning yields
/// another handle to the same dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    /// Runtime the delay tasks are spawned on.
    handle: Handle,
    /// Source of delays and delete behavior, read on each key-down.
    config: Arc<dyn ConfigProvider>,
    /// Codes that repeat after a declined long-press.
    repeatable: Arc<HashSet<i32>>,
    /// Currently pressed keys.
    pressed: Arc<PressedKeys>,
    /// Optional event consumer.
    receiver: ReceiverSlot,
    /// Last delivered down event.
    last_down: Arc<Mutex<Option<EventData>>>,
    /// Last delivered up event.
    last_up: Arc<Mutex<Option<EventData>>>,
    /// Group of all delay tasks; a failing task does not affect its siblings.
    tasks: TaskTracker,
    /// Parent of every per-key token; cancelled on close.
    root: CancellationToken,
}

impl Dispatcher {
    /// Create a dispatcher bound to the current tokio runtime.
    ///
    /// `repeatable` is copied; later changes by the caller have no effect.
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        repeatable: impl IntoIterator<Item = i32>,
    ) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self::with_handle(handle, config, repeatable))
    }

    /// Create a dispatcher that repeats [`KeyCode::DEFAULT_REPEATABLE`].
    pub fn with_default_repeatable(config: Arc<dyn ConfigProvider>) -> Result<Self> {
        Self::new(config, KeyCode::DEFAULT_REPEATABLE.iter().copied())
    }

    /// Create a dispatcher that spawns its delay tasks on `handle`.
    pub fn with_handle(
        handle: Handle,
        config: Arc<dyn ConfigProvider>,
        repeatable: impl IntoIterator<Item = i32>,
    ) -> Self {
        Self {
            handle,
            config,
            repeatable: Arc::new(repeatable.into_iter().collect()),
            pressed: Arc::new(PressedKeys::default()),
            receiver: ReceiverSlot::default(),
            last_down: Arc::new(Mutex::new(None)),
            last_up: Arc::new(Mutex::new(None)),
            tasks: TaskTracker::new(),
            root: CancellationToken::new(),
        }
    }

    /// Install, replace or clear the event receiver.
    pub fn set_receiver(&self, receiver: Option<Arc<dyn InputEventReceiver>>) {
        self.receiver.set(receiver);
    }

    /// Returns true if a receiver is installed.
    pub fn has_receiver(&self) -> bool {
        self.receiver.is_set()
    }

    /// Press a key.
    ///
    /// A key that is already down is ignored. Otherwise the key is recorded, the receiver is
    /// notified and the delay task is started. Once the long-press threshold (counted from the
    /// moment the key was recorded) passes, `on_long_press` runs on the delay task; returning
    /// true consumes the press and suppresses its up event. If it declines and the key is repeatable, `on_repeat` runs on every repeat
    /// tick; each true delivers a repeat event and likewise consumes the press.
    pub fn send_down<L, R>(&self, data: &KeyData, on_long_press: L, on_repeat: R)
    where
        L: FnMut() -> bool + Send + 'static,
        R: FnMut() -> bool + Send + 'static,
    {
        let code = data.code;
        let token = self.root.child_token();
        if !self.pressed.try_insert(code, token.clone()) {
            trace!(code, "key_down_ignored_duplicate");
            return;
        }
        let now = Instant::now();

        let long_press_delay = scheduler::long_press_delay(self.config.long_press_delay(), code);
        let repeat = self
            .repeatable
            .contains(&code)
            .then(|| RepeatPlan::new(data, self.config.delete_long_press()));

        // The down must reach the receiver before the task can act on this press.
        trace!(code, "key_down");
        self.receiver.down(data);
        *self.last_down.lock() = Some(EventData {
            timestamp: now,
            data: data.clone(),
        });

        let task = DelayTask {
            code,
            token,
            deadline: scheduler::deadline_after(now, long_press_delay),
            repeat,
            on_long_press: Box::new(on_long_press),
            on_repeat: Box::new(on_repeat),
            pressed: self.pressed.clone(),
            receiver: self.receiver.clone(),
        };
        self.tasks.spawn_on(task.run(), &self.handle);
    }

    /// Press a key whose long-press and repeat handlers always decline.
    ///
    /// Repeatable keys still tick, but no repeat events are delivered.
    pub fn send_down_simple(&self, data: &KeyData) {
        self.send_down(data, || false, || false);
    }

    /// Release a key.
    ///
    /// Delivers an up event only if the key was tracked and no long-press or repeat consumed
    /// the press. The press is forgotten and its delay task cancelled either way.
    pub fn send_up(&self, data: &KeyData) {
        let code = data.code;
        let Some(info) = self.pressed.remove(code) else {
            trace!(code, "key_up_untracked");
            return;
        };
        let held_ms = info.down_timestamp.elapsed().as_millis();
        if info.blocked {
            debug!(code, held_ms, "key_up_suppressed");
            return;
        }

        trace!(code, held_ms, "key_up");
        let now = Instant::now();
        self.receiver.up(data);
        *self.last_up.lock() = Some(EventData {
            timestamp: now,
            data: data.clone(),
        });
    }

    /// Press and release a key in one step.
    ///
    /// Any tracked press of the same code is discarded without notification. The receiver then
    /// sees a down immediately followed by an up, both stamped with the same time.
    pub fn send_down_up(&self, data: &KeyData) {
        let code = data.code;
        if self.pressed.remove(code).is_some() {
            debug!(code, "key_down_up_discarded_press");
        }

        trace!(code, "key_down_up");
        let now = Instant::now();
        self.receiver.down(data);
        self.receiver.up(data);
        let snapshot = EventData {
            timestamp: now,
            data: data.clone(),
        };
        *self.last_down.lock() = Some(snapshot.clone());
        *self.last_up.lock() = Some(snapshot);
    }

    /// Abort a press. Delivers a cancel event if the key was tracked.
    pub fn send_cancel(&self, data: &KeyData) {
        let code = data.code;
        if self.pressed.remove(code).is_none() {
            trace!(code, "key_cancel_untracked");
            return;
        }
        trace!(code, "key_cancel");
        self.receiver.cancel(data);
    }

    /// Returns true while `code` is held down.
    pub fn is_pressed(&self, code: i32) -> bool {
        self.pressed.contains(code)
    }

    /// Number of keys currently held down.
    pub fn pressed_count(&self) -> usize {
        self.pressed.len()
    }

    /// Returns true if the last delivered down was for the same code and happened less than
    /// `max_diff` ago.
    pub fn is_consecutive_down(&self, data: &KeyData, max_diff: Duration) -> bool {
        self.last_down
            .lock()
            .as_ref()
            .is_some_and(|last| last.is_consecutive(data, max_diff))
    }

    /// Returns true if the last delivered up was for the same code and happened less than
    /// `max_diff` ago.
    pub fn is_consecutive_up(&self, data: &KeyData, max_diff: Duration) -> bool {
        self.last_up
            .lock()
            .as_ref()
            .is_some_and(|last| last.is_consecutive(data, max_diff))
    }

    /// The last delivered down event, if any.
    pub fn last_down(&self) -> Option<EventData> {
        self.last_down.lock().clone()
    }

    /// The last delivered up event, if any.
    pub fn last_up(&self) -> Option<EventData> {
        self.last_up.lock().clone()
    }

    /// Detach the receiver and cancel every delay task.
    ///
    /// Safe to call repeatedly. The dispatcher stays usable afterwards but delivers nothing
    /// until a new receiver is installed, and new presses no longer time out.
    pub fn close(&self) {
        self.receiver.set(None);
        self.root.cancel();
        let drained = self.pressed.drain();
        self.tasks.close();
        debug!(dropped_presses = drained.len(), "dispatcher_closed");
    }

    /// [`close`](Self::close), then wait briefly for all delay tasks to finish.
    pub async fn shutdown(&self) {
        self.close();
        if tokio::time::timeout(Duration::from_millis(STOP_WAIT_TIMEOUT_MS), self.tasks.wait())
            .await
            .is_err()
        {
            debug!(pending = self.tasks.len(), "dispatcher_shutdown_timeout");
        }
    }
}

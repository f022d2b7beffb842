//! Per-press delay task: long-press detection followed by optional auto-repeat.
//!
//! Each key-down starts one [`DelayTask`]. It waits for the long-press threshold, offers the
//! press to the long-press handler and, if that declines and the key is repeatable, fires
//! repeat ticks until its token is cancelled. The token is cancelled when the press leaves the
//! registry; every suspension point and every action checks it first.

use std::{sync::Arc, time::Duration};

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{
    DeleteLongPress, KeyCode, KeyData, receiver::ReceiverSlot, registry::PressedKeys,
};

/// Base interval between repeat ticks.
pub const REPEAT_BASE_DELAY_MS: u64 = 50;

/// Caller-supplied handler run on the delay task. Returning true consumes the press.
pub type PressHandler = Box<dyn FnMut() -> bool + Send>;

/// Long-press threshold for `code` given the configured base delay.
///
/// Keys that are routinely held a little longer during normal typing get a longer threshold:
/// 2.5x for the space bars and shift, 2x for language switch.
pub fn long_press_delay(base: Duration, code: i32) -> Duration {
    match code {
        KeyCode::SPACE | KeyCode::CJK_SPACE | KeyCode::SHIFT => base * 5 / 2,
        KeyCode::LANGUAGE_SWITCH => base * 2,
        _ => base,
    }
}

/// Interval between repeat ticks for the effective repeat code.
pub fn repeat_delay(code: i32) -> Duration {
    let base = Duration::from_millis(REPEAT_BASE_DELAY_MS);
    match code {
        KeyCode::DELETE_WORD | KeyCode::FORWARD_DELETE_WORD => base * 5,
        _ => base,
    }
}

/// Moment `delay` after `start`, clamped to about thirty years out.
pub(crate) fn deadline_after(start: Instant, delay: Duration) -> Instant {
    start
        .checked_add(delay)
        .unwrap_or_else(|| start + Duration::from_secs(86_400 * 365 * 30))
}

/// Key data delivered on repeat ticks for a held `data`.
pub fn repeat_data(data: &KeyData, delete: DeleteLongPress) -> KeyData {
    let word_code = match (data.code, delete) {
        (KeyCode::DELETE, DeleteLongPress::Word) => KeyCode::DELETE_WORD,
        (KeyCode::FORWARD_DELETE, DeleteLongPress::Word) => KeyCode::FORWARD_DELETE_WORD,
        _ => return data.clone(),
    };
    KeyData {
        code: word_code,
        label: data.label.clone(),
    }
}

/// Repeat parameters resolved at key-down.
pub(crate) struct RepeatPlan {
    /// Key data delivered on each accepted tick.
    pub(crate) data: KeyData,
    /// Tick period.
    pub(crate) interval: Duration,
}

impl RepeatPlan {
    /// Resolve the repeat key and interval for a held `data`.
    pub(crate) fn new(data: &KeyData, delete: DeleteLongPress) -> Self {
        let data = repeat_data(data, delete);
        let interval = repeat_delay(data.code);
        Self { data, interval }
    }
}

/// Everything a delay task needs, captured before it first suspends.
pub(crate) struct DelayTask {
    /// Code of the held key.
    pub(crate) code: i32,
    /// Cancelled when the press leaves the registry.
    pub(crate) token: CancellationToken,
    /// Moment the long-press threshold passes.
    pub(crate) deadline: Instant,
    /// Present only for repeatable keys.
    pub(crate) repeat: Option<RepeatPlan>,
    /// Offered the press once the deadline passes.
    pub(crate) on_long_press: PressHandler,
    /// Asked on every repeat tick.
    pub(crate) on_repeat: PressHandler,
    /// Registry the press lives in.
    pub(crate) pressed: Arc<PressedKeys>,
    /// Where repeat events go.
    pub(crate) receiver: ReceiverSlot,
}

impl DelayTask {
    /// Drive the press until it is consumed, declined for good or released.
    pub(crate) async fn run(mut self) {
        let code = self.code;
        trace!(
            code,
            remaining_ms = self.deadline.saturating_duration_since(Instant::now()).as_millis(),
            "delay_start"
        );

        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                trace!(code, "delay_cancelled_waiting");
                return;
            }
            _ = time::sleep_until(self.deadline) => {}
        }

        if (self.on_long_press)() {
            if self.pressed.block(code, &self.token) {
                debug!(code, "long_press_fired");
            }
            return;
        }

        let Some(plan) = self.repeat.take() else {
            trace!(code, "long_press_declined");
            return;
        };
        debug!(
            code,
            repeat_code = plan.data.code,
            interval_ms = plan.interval.as_millis(),
            "repeat_start"
        );

        let mut ticker = time::interval(plan.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    trace!(code, "repeat_cancelled");
                    return;
                }
                _ = ticker.tick() => {
                    if !self.repeat_tick(&plan) {
                        return;
                    }
                }
            }
        }
    }

    /// One repeat tick. Returns false once the press turns out to be released.
    fn repeat_tick(&mut self, plan: &RepeatPlan) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        if !(self.on_repeat)() {
            return true;
        }
        if !self.pressed.block(self.code, &self.token) {
            trace!(code = self.code, "repeat_after_release");
            return false;
        }
        trace!(code = self.code, repeat_code = plan.data.code, "repeat_tick");
        self.receiver.repeat(&plan.data);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_press_scaling() {
        let base = Duration::from_millis(300);
        assert_eq!(long_press_delay(base, KeyCode::SPACE), Duration::from_millis(750));
        assert_eq!(long_press_delay(base, KeyCode::CJK_SPACE), Duration::from_millis(750));
        assert_eq!(long_press_delay(base, KeyCode::SHIFT), Duration::from_millis(750));
        assert_eq!(
            long_press_delay(base, KeyCode::LANGUAGE_SWITCH),
            Duration::from_millis(600)
        );
        assert_eq!(long_press_delay(base, 'a' as i32), base);
    }

    #[test]
    fn deadline_clamps_huge_delays() {
        let start = Instant::now();
        assert_eq!(
            deadline_after(start, Duration::from_millis(300)),
            start + Duration::from_millis(300)
        );
        assert!(deadline_after(start, Duration::from_millis(u64::MAX)) > start);
    }

    #[test]
    fn word_deletes_repeat_slower() {
        assert_eq!(repeat_delay(KeyCode::DELETE), Duration::from_millis(50));
        assert_eq!(repeat_delay(KeyCode::DELETE_WORD), Duration::from_millis(250));
        assert_eq!(
            repeat_delay(KeyCode::FORWARD_DELETE_WORD),
            Duration::from_millis(250)
        );
        assert_eq!(repeat_delay(KeyCode::ARROW_LEFT), Duration::from_millis(50));
    }

    #[test]
    fn delete_substitution_follows_setting() {
        let delete = KeyData::with_label(KeyCode::DELETE, "del");
        let forward = KeyData::new(KeyCode::FORWARD_DELETE);
        let arrow = KeyData::new(KeyCode::ARROW_UP);

        assert_eq!(repeat_data(&delete, DeleteLongPress::Character), delete);
        assert_eq!(
            repeat_data(&delete, DeleteLongPress::Word),
            KeyData::with_label(KeyCode::DELETE_WORD, "del")
        );
        assert_eq!(
            repeat_data(&forward, DeleteLongPress::Word).code,
            KeyCode::FORWARD_DELETE_WORD
        );
        assert_eq!(repeat_data(&arrow, DeleteLongPress::Word), arrow);
    }

    #[test]
    fn plan_combines_substitution_and_interval() {
        let plan = RepeatPlan::new(&KeyData::new(KeyCode::DELETE), DeleteLongPress::Word);
        assert_eq!(plan.data.code, KeyCode::DELETE_WORD);
        assert_eq!(plan.interval, Duration::from_millis(250));
    }
}

use std::collections::{HashMap, hash_map::Entry};

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// State for one currently pressed key code.
pub(crate) struct PressedKeyInfo {
    /// When the press started.
    pub(crate) down_timestamp: Instant,
    /// Cancels the delay task started for this press.
    token: CancellationToken,
    /// Set once a long-press or repeat consumed this press; the release is then suppressed.
    pub(crate) blocked: bool,
}

/// Registry of pressed keys: the single source of truth for "is this key down".
///
/// Every operation takes the lock for the map operation only. Removing a record requests
/// cancellation of its delay task before the lock is released, so a task that still observes
/// its token as live while holding the lock knows its record is present.
#[derive(Default)]
pub(crate) struct PressedKeys {
    /// Press records keyed by code.
    entries: Mutex<HashMap<i32, PressedKeyInfo>>,
}

impl PressedKeys {
    /// Insert a record for `code` owning `token`. Returns false if `code` is already pressed.
    pub(crate) fn try_insert(&self, code: i32, token: CancellationToken) -> bool {
        match self.entries.lock().entry(code) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(PressedKeyInfo {
                    down_timestamp: Instant::now(),
                    token,
                    blocked: false,
                });
                true
            }
        }
    }

    /// Remove the record for `code`, cancelling its delay task.
    pub(crate) fn remove(&self, code: i32) -> Option<PressedKeyInfo> {
        let mut entries = self.entries.lock();
        let info = entries.remove(&code)?;
        info.token.cancel();
        Some(info)
    }

    /// Remove every record, cancelling all delay tasks.
    pub(crate) fn drain(&self) -> Vec<(i32, PressedKeyInfo)> {
        let mut entries = self.entries.lock();
        let drained: Vec<_> = entries.drain().collect();
        for (_, info) in &drained {
            info.token.cancel();
        }
        drained
    }

    /// Mark the live press owning `token` as blocked.
    ///
    /// Returns false without touching anything if the press was already released.
    pub(crate) fn block(&self, code: i32, token: &CancellationToken) -> bool {
        let mut entries = self.entries.lock();
        if token.is_cancelled() {
            return false;
        }
        match entries.get_mut(&code) {
            Some(info) => {
                info.blocked = true;
                true
            }
            None => false,
        }
    }

    /// Returns true while `code` is recorded.
    pub(crate) fn contains(&self, code: i32) -> bool {
        self.entries.lock().contains_key(&code)
    }

    /// Number of recorded presses.
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_unique_per_code() {
        let keys = PressedKeys::default();
        assert!(keys.try_insert(1, CancellationToken::new()));
        assert!(!keys.try_insert(1, CancellationToken::new()));
        assert!(keys.try_insert(2, CancellationToken::new()));
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(1));
    }

    #[test]
    fn remove_cancels_token() {
        let keys = PressedKeys::default();
        let token = CancellationToken::new();
        keys.try_insert(7, token.clone());
        let info = keys.remove(7).expect("record");
        assert!(token.is_cancelled());
        assert!(!info.blocked);
        assert!(keys.remove(7).is_none());
        assert!(!keys.contains(7));
    }

    #[test]
    fn block_after_release_is_refused() {
        let keys = PressedKeys::default();
        let token = CancellationToken::new();
        keys.try_insert(3, token.clone());
        assert!(keys.block(3, &token));
        assert!(keys.remove(3).expect("record").blocked);

        // A new press for the same code must not be blocked through the old token.
        let fresh = CancellationToken::new();
        keys.try_insert(3, fresh);
        assert!(!keys.block(3, &token));
        assert!(!keys.remove(3).expect("record").blocked);
    }

    #[test]
    fn drain_empties_and_cancels() {
        let keys = PressedKeys::default();
        let tokens: Vec<_> = (0..4).map(|_| CancellationToken::new()).collect();
        for (code, token) in tokens.iter().enumerate() {
            keys.try_insert(code as i32, token.clone());
        }
        assert_eq!(keys.drain().len(), 4);
        assert_eq!(keys.len(), 0);
        assert!(tokens.iter().all(CancellationToken::is_cancelled));
    }
}

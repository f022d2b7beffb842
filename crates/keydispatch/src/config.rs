//! Configuration consumed by the dispatcher.
//!
//! The dispatcher reads its timing and delete behavior through [`ConfigProvider`] on every
//! key-down, so changes made through [`LiveConfig`] apply to the next press.

use std::{fs, path::Path, time::Duration};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Default long-press threshold.
pub const DEFAULT_LONG_PRESS_DELAY_MS: u64 = 300;

/// What holding a delete key repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeleteLongPress {
    /// Repeat single-character deletes.
    #[default]
    Character,
    /// Repeat whole-word deletes.
    Word,
}

/// Read-only access to the settings the dispatcher depends on.
pub trait ConfigProvider: Send + Sync {
    /// Base long-press threshold before per-key scaling.
    fn long_press_delay(&self) -> Duration;
    /// Configured behavior for a held delete key.
    fn delete_long_press(&self) -> DeleteLongPress;
}

/// Plain settings values, loadable from RON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base long-press threshold in milliseconds.
    pub long_press_delay_ms: u64,
    /// Behavior for a held delete key.
    pub delete_long_press: DeleteLongPress,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            long_press_delay_ms: DEFAULT_LONG_PRESS_DELAY_MS,
            delete_long_press: DeleteLongPress::default(),
        }
    }
}

impl Settings {
    /// Parse settings from a RON string. Missing fields take their defaults.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a RON settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let settings = Self::from_ron(&text)?;
        debug!(path = %path.display(), ?settings, "settings_loaded");
        Ok(settings)
    }
}

impl ConfigProvider for Settings {
    fn long_press_delay(&self) -> Duration {
        Duration::from_millis(self.long_press_delay_ms)
    }

    fn delete_long_press(&self) -> DeleteLongPress {
        self.delete_long_press
    }
}

/// Settings that can be changed while a dispatcher is running.
#[derive(Debug, Default)]
pub struct LiveConfig {
    inner: RwLock<Settings>,
}

impl LiveConfig {
    /// Wrap an initial set of settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Copy of the current settings.
    pub fn snapshot(&self) -> Settings {
        self.inner.read().clone()
    }

    /// Replace all settings at once.
    pub fn replace(&self, settings: Settings) {
        *self.inner.write() = settings;
    }

    /// Change the base long-press threshold. Delays beyond `u64::MAX` milliseconds saturate.
    pub fn set_long_press_delay(&self, delay: Duration) {
        self.inner.write().long_press_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    }

    /// Change the delete-key long-press behavior.
    pub fn set_delete_long_press(&self, behavior: DeleteLongPress) {
        self.inner.write().delete_long_press = behavior;
    }
}

impl ConfigProvider for LiveConfig {
    fn long_press_delay(&self) -> Duration {
        self.inner.read().long_press_delay()
    }

    fn delete_long_press(&self) -> DeleteLongPress {
        self.inner.read().delete_long_press
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ron_yields_defaults() {
        let settings = Settings::from_ron("()").expect("parse");
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.long_press_delay(),
            Duration::from_millis(DEFAULT_LONG_PRESS_DELAY_MS)
        );
    }

    #[test]
    fn parses_all_fields() {
        let settings =
            Settings::from_ron("(long_press_delay_ms: 450, delete_long_press: Word)").expect("parse");
        assert_eq!(settings.long_press_delay_ms, 450);
        assert_eq!(settings.delete_long_press, DeleteLongPress::Word);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Settings::from_ron("(repeat_rate: 10)").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Settings::load(Path::new("/nonexistent/keydispatch/settings.ron")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn live_config_updates_are_visible() {
        let live = LiveConfig::default();
        assert_eq!(live.delete_long_press(), DeleteLongPress::Character);
        live.set_delete_long_press(DeleteLongPress::Word);
        live.set_long_press_delay(Duration::from_millis(120));
        assert_eq!(live.delete_long_press(), DeleteLongPress::Word);
        assert_eq!(live.long_press_delay(), Duration::from_millis(120));
        live.replace(Settings::default());
        assert_eq!(live.snapshot(), Settings::default());
    }

    #[test]
    fn oversized_delay_saturates() {
        let live = LiveConfig::default();
        live.set_long_press_delay(Duration::MAX);
        assert_eq!(live.snapshot().long_press_delay_ms, u64::MAX);
        assert_eq!(live.long_press_delay(), Duration::from_millis(u64::MAX));
    }
}

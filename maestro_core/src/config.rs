use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing knobs for the engine. Every value here was tuned empirically
/// against the target application and may not transfer to other versions,
/// so they are defaults, not constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gap between a key's down and up events.
    pub key_hold_ms: u64,
    /// Gap between characters when typing text into the target.
    pub inter_char_ms: u64,
    /// Wait after expanding a menu before re-enumerating its children.
    pub menu_settle_ms: u64,
    /// Poll interval while waiting for a dialog window to appear.
    pub dialog_poll_ms: u64,
    /// Give up waiting for a dialog window after this long.
    pub dialog_timeout_ms: u64,
    /// Give up waiting for a post-import alert after this long.
    pub alert_timeout_ms: u64,
    /// Poll interval while waiting for the target process to appear.
    pub connect_poll_ms: u64,
    /// Number of connect polls before reporting a launch timeout.
    pub connect_max_polls: u32,
    /// Settle after opening the go-to-folder sheet and after typing a path.
    pub path_settle_ms: u64,
    /// Settle after confirming a path before the dialog reacts.
    pub post_enter_settle_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_hold_ms: 40,
            inter_char_ms: 10,
            menu_settle_ms: 150,
            dialog_poll_ms: 100,
            dialog_timeout_ms: 5_000,
            alert_timeout_ms: 5_000,
            connect_poll_ms: 500,
            connect_max_polls: 40,
            path_settle_ms: 500,
            post_enter_settle_ms: 1_000,
        }
    }
}

impl EngineConfig {
    pub fn key_hold(&self) -> Duration {
        Duration::from_millis(self.key_hold_ms)
    }

    pub fn inter_char(&self) -> Duration {
        Duration::from_millis(self.inter_char_ms)
    }

    pub fn menu_settle(&self) -> Duration {
        Duration::from_millis(self.menu_settle_ms)
    }

    pub fn dialog_poll(&self) -> Duration {
        Duration::from_millis(self.dialog_poll_ms)
    }

    pub fn dialog_timeout(&self) -> Duration {
        Duration::from_millis(self.dialog_timeout_ms)
    }

    pub fn alert_timeout(&self) -> Duration {
        Duration::from_millis(self.alert_timeout_ms)
    }

    pub fn connect_poll(&self) -> Duration {
        Duration::from_millis(self.connect_poll_ms)
    }

    pub fn path_settle(&self) -> Duration {
        Duration::from_millis(self.path_settle_ms)
    }

    pub fn post_enter_settle(&self) -> Duration {
        Duration::from_millis(self.post_enter_settle_ms)
    }
}

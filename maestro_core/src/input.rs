use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::keymap::{self, KeyCommand, Modifiers};
use log::{debug, warn};
use std::sync::Arc;

/// The one primitive an OS backend must provide: emit a single key
/// down or up event into the host environment. Non-idempotent and
/// order-dependent; the sequencer is the only caller.
pub trait InputPort: Send + Sync {
    fn key_event(&self, key: KeyCommand, down: bool) -> Result<(), EngineError>;
}

/// Turns logical key requests into timed down/up pairs. Each press is
/// delivered as a down event followed by an up event separated by the
/// configured hold delay, so the receiving application sees discrete
/// presses rather than a held key.
pub struct KeySequencer {
    port: Arc<dyn InputPort>,
    config: EngineConfig,
}

impl KeySequencer {
    pub fn new(port: Arc<dyn InputPort>, config: EngineConfig) -> Self {
        Self { port, config }
    }

    /// Presses a single symbol with the given modifiers. Unmapped
    /// symbols are skipped with a warning; that is a recoverable
    /// per-character condition, not a failure.
    pub async fn send_key(&self, symbol: &str, modifiers: Modifiers) -> Result<(), EngineError> {
        let Some(key) = keymap::lookup(symbol, modifiers) else {
            warn!("no key mapping for symbol {symbol:?}, skipping");
            return Ok(());
        };
        debug!("key {:?} mods {:?}", key.code, key.modifiers);
        self.port.key_event(key, true)?;
        tokio::time::sleep(self.config.key_hold()).await;
        self.port.key_event(key, false)?;
        Ok(())
    }

    /// Types text character by character with a small inter-character
    /// delay to avoid event loss in the receiving application's queue.
    pub async fn send_text(&self, text: &str) -> Result<(), EngineError> {
        let mut buf = [0u8; 4];
        for c in text.chars() {
            self.send_key(c.encode_utf8(&mut buf), Modifiers::NONE)
                .await?;
            tokio::time::sleep(self.config.inter_char()).await;
        }
        Ok(())
    }
}

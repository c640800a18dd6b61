use maestro_core::config::EngineConfig;
use maestro_core::error::EngineError;
use maestro_core::input::{InputPort, KeySequencer};
use maestro_core::keymap::{self, KeyCommand, Modifiers};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingPort {
    events: Mutex<Vec<(u16, Modifiers, bool)>>,
}

impl RecordingPort {
    fn events(&self) -> Vec<(u16, Modifiers, bool)> {
        self.events.lock().unwrap().clone()
    }
}

impl InputPort for RecordingPort {
    fn key_event(&self, key: KeyCommand, down: bool) -> Result<(), EngineError> {
        self.events
            .lock()
            .unwrap()
            .push((key.code.0, key.modifiers, down));
        Ok(())
    }
}

fn sequencer() -> (Arc<RecordingPort>, KeySequencer) {
    let port = Arc::new(RecordingPort::default());
    let sequencer = KeySequencer::new(port.clone(), EngineConfig::default());
    (port, sequencer)
}

#[tokio::test(start_paused = true)]
async fn a_press_is_one_down_then_one_up() {
    let (port, sequencer) = sequencer();
    sequencer.send_key("a", Modifiers::cmd()).await.unwrap();

    let events = port.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], (0, Modifiers::cmd(), true));
    assert_eq!(events[1], (0, Modifiers::cmd(), false));
}

#[tokio::test(start_paused = true)]
async fn typed_text_never_interleaves_presses() {
    let (port, sequencer) = sequencer();
    sequencer.send_text("abc").await.unwrap();

    let events = port.events();
    assert_eq!(events.len(), 6);
    for pair in events.chunks(2) {
        assert_eq!(pair[0].0, pair[1].0);
        assert!(pair[0].2, "down must come first");
        assert!(!pair[1].2, "up must follow its own down");
    }
}

#[tokio::test(start_paused = true)]
async fn shifted_characters_imply_shift() {
    let (port, sequencer) = sequencer();
    sequencer.send_text("!A").await.unwrap();

    let events = port.events();
    // '!' is shift+'1', 'A' is shift+'a'.
    assert_eq!(events[0].0, 18);
    assert!(events[0].1.shift);
    assert_eq!(events[2].0, 0);
    assert!(events[2].1.shift);
}

#[tokio::test(start_paused = true)]
async fn unmapped_symbols_are_skipped_not_fatal() {
    let (port, sequencer) = sequencer();
    sequencer.send_key("é", Modifiers::NONE).await.unwrap();
    assert!(port.events().is_empty());

    sequencer.send_text("aé b").await.unwrap();
    // 'a', ' ' and 'b' still arrive as down/up pairs.
    assert_eq!(port.events().len(), 6);
}

#[test]
fn named_keys_resolve_to_their_codes() {
    let ret = keymap::lookup("return", Modifiers::NONE).unwrap();
    assert_eq!(ret.code.0, 36);
    let down = keymap::lookup("down", Modifiers::cmd()).unwrap();
    assert_eq!(down.code.0, 125);
    assert!(down.modifiers.command);
    assert!(keymap::lookup("hyper", Modifiers::NONE).is_none());
}

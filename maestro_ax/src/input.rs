use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation, CGKeyCode};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use maestro_core::error::EngineError;
use maestro_core::input::InputPort;
use maestro_core::keymap::KeyCommand;

/// Posts keyboard events into the HID event tap. Inherently
/// non-idempotent; the sequencer owns ordering and pacing.
pub struct CgInput;

impl InputPort for CgInput {
    fn key_event(&self, key: KeyCommand, down: bool) -> Result<(), EngineError> {
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .map_err(|_| EngineError::Input("could not create event source".to_string()))?;
        let event = CGEvent::new_keyboard_event(source, key.code.0 as CGKeyCode, down)
            .map_err(|_| EngineError::Input("could not create keyboard event".to_string()))?;

        let mut flags = CGEventFlags::empty();
        if key.modifiers.command {
            flags |= CGEventFlags::CGEventFlagCommand;
        }
        if key.modifiers.shift {
            flags |= CGEventFlags::CGEventFlagShift;
        }
        if key.modifiers.option {
            flags |= CGEventFlags::CGEventFlagAlternate;
        }
        if key.modifiers.control {
            flags |= CGEventFlags::CGEventFlagControl;
        }
        event.set_flags(flags);
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

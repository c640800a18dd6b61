pub mod config;
pub mod error;
pub mod input;
pub mod intent;
pub mod keymap;
pub mod lifecycle;
pub mod orchestrator;
pub mod resolver;
pub mod status;
pub mod uitree;

pub use config::EngineConfig;
pub use error::EngineError;
pub use input::{InputPort, KeySequencer};
pub use intent::{Intent, PlaybackAction, TrackTarget};
pub use keymap::{KeyCode, KeyCommand, Modifiers};
pub use lifecycle::{ConnectionState, Lifecycle, ProcessHandle, TargetApp};
pub use orchestrator::{EngineHandles, Orchestrator};
pub use resolver::MenuPath;
pub use status::{EngineStatus, StatusEvent};
pub use uitree::{UiNode, UiRole, UiTree};

//! In-memory stand-ins for the live backend, so workflows can be
//! exercised end to end without a target application or an input tap.

use log::info;
use maestro_core::error::EngineError;
use maestro_core::input::InputPort;
use maestro_core::keymap::KeyCommand;
use maestro_core::lifecycle::{ProcessHandle, TargetApp};
use maestro_core::uitree::{UiNode, UiRole, UiTree};
use maestro_core::{EngineConfig, EngineHandles, Orchestrator};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn engine(config: EngineConfig) -> (Orchestrator, EngineHandles) {
    Orchestrator::new(
        Arc::new(FakeTree::daw_like()),
        Arc::new(FakeTarget),
        Arc::new(LogPort),
        config,
    )
}

struct LogPort;

impl InputPort for LogPort {
    fn key_event(&self, key: KeyCommand, down: bool) -> Result<(), EngineError> {
        info!(
            "key {} code {} mods {:?}",
            if down { "down" } else { "up" },
            key.code.0,
            key.modifiers
        );
        Ok(())
    }
}

struct FakeTarget;

impl TargetApp for FakeTarget {
    fn find_running(&self) -> Option<ProcessHandle> {
        Some(ProcessHandle(4242))
    }
    fn request_launch(&self) -> Result<(), EngineError> {
        Ok(())
    }
    fn is_alive(&self, _handle: ProcessHandle) -> bool {
        true
    }
    fn accessibility_trusted(&self) -> bool {
        true
    }
    fn activate_process(&self, _handle: ProcessHandle) -> Result<(), EngineError> {
        Ok(())
    }
    fn activate_scripting(&self, _handle: ProcessHandle) -> Result<(), EngineError> {
        Ok(())
    }
    fn activate_accessibility(&self, _handle: ProcessHandle) -> Result<(), EngineError> {
        Ok(())
    }
}

struct Node {
    label: Option<String>,
    role: UiRole,
    children: Vec<u64>,
}

struct State {
    nodes: HashMap<u64, Node>,
    windows: Vec<u64>,
    root: u64,
    next: u64,
}

impl State {
    fn add(&mut self, parent: Option<u64>, label: Option<&str>, role: UiRole) -> u64 {
        self.next += 1;
        let id = self.next;
        self.nodes.insert(
            id,
            Node {
                label: label.map(str::to_string),
                role,
                children: Vec::new(),
            },
        );
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.push(id);
            }
        }
        id
    }
}

/// A mutable fake UI tree shaped like the target's: a menu bar with the
/// menus the workflows drive, and a main window with a tempo readout
/// and track headers. Pressing menu items reveals the same dialogs the
/// live application would.
struct FakeTree {
    state: Mutex<State>,
}

impl FakeTree {
    fn daw_like() -> Self {
        let mut s = State {
            nodes: HashMap::new(),
            windows: Vec::new(),
            root: 0,
            next: 0,
        };
        let root = s.add(None, None, UiRole::Application);
        s.root = root;

        let bar = s.add(Some(root), None, UiRole::MenuBar);
        let file = s.add(Some(bar), Some("File"), UiRole::MenuBarItem);
        let file_menu = s.add(Some(file), None, UiRole::Menu);
        let import = s.add(Some(file_menu), Some("Import"), UiRole::MenuItem);
        let import_menu = s.add(Some(import), None, UiRole::Menu);
        s.add(Some(import_menu), Some("MIDI File…"), UiRole::MenuItem);

        let navigate = s.add(Some(bar), Some("Navigate"), UiRole::MenuBarItem);
        let navigate_menu = s.add(Some(navigate), None, UiRole::Menu);
        s.add(Some(navigate_menu), Some("Go to Position…"), UiRole::MenuItem);

        let project = s.add(Some(bar), Some("Project"), UiRole::MenuBarItem);
        let project_menu = s.add(Some(project), None, UiRole::Menu);
        let key = s.add(Some(project_menu), Some("Key Signature"), UiRole::MenuItem);
        let key_menu = s.add(Some(key), None, UiRole::Menu);
        for name in ["C major", "A minor", "D minor", "E minor"] {
            s.add(Some(key_menu), Some(name), UiRole::MenuItem);
        }

        let window = s.add(Some(root), Some("Untitled — Tracks"), UiRole::Window);
        s.windows.push(window);
        s.add(Some(window), Some("120"), UiRole::StaticText);
        let headers = s.add(Some(window), None, UiRole::Group);
        s.add(Some(headers), Some("Audio 1"), UiRole::StaticText);
        s.add(Some(headers), Some("Inst 1"), UiRole::StaticText);

        FakeTree {
            state: Mutex::new(s),
        }
    }
}

impl UiTree for FakeTree {
    fn application_root(&self) -> Result<UiNode, EngineError> {
        Ok(UiNode(self.state.lock().unwrap().root))
    }

    fn windows(&self) -> Result<Vec<UiNode>, EngineError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .windows
            .iter()
            .map(|id| UiNode(*id))
            .collect())
    }

    fn children(&self, node: UiNode) -> Result<Vec<UiNode>, EngineError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .nodes
            .get(&node.0)
            .map(|n| n.children.iter().map(|id| UiNode(*id)).collect())
            .unwrap_or_default())
    }

    fn label(&self, node: UiNode) -> Option<String> {
        self.state.lock().unwrap().nodes.get(&node.0)?.label.clone()
    }

    fn role(&self, node: UiNode) -> UiRole {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(&node.0)
            .map(|n| n.role)
            .unwrap_or(UiRole::Other)
    }

    fn press(&self, node: UiNode) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let (label, role) = match state.nodes.get(&node.0) {
            Some(n) => (n.label.clone().unwrap_or_default(), n.role),
            None => return Err(EngineError::NotConnected),
        };
        info!("press {label:?} ({role:?})");

        match (label.as_str(), role) {
            ("MIDI File…", _) => {
                let dialog = state.add(None, Some("Import"), UiRole::Window);
                state.windows.push(dialog);
                state.add(Some(dialog), Some("Import"), UiRole::Button);
            }
            ("Import", UiRole::Button) => {
                let alert = state.add(None, None, UiRole::Alert);
                state.windows.push(alert);
                state.add(Some(alert), Some("Import Tempo"), UiRole::Button);
                state.add(Some(alert), Some("OK"), UiRole::Button);
            }
            ("Import Tempo", _) | ("OK", _) => {
                let alerts: Vec<u64> = state
                    .windows
                    .iter()
                    .copied()
                    .filter(|id| {
                        state
                            .nodes
                            .get(id)
                            .is_some_and(|n| n.role == UiRole::Alert)
                    })
                    .collect();
                state.windows.retain(|id| !alerts.contains(id));
            }
            _ => {}
        }
        Ok(())
    }
}

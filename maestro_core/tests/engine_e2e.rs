use maestro_core::config::EngineConfig;
use maestro_core::error::EngineError;
use maestro_core::input::InputPort;
use maestro_core::keymap::KeyCommand;
use maestro_core::lifecycle::{ProcessHandle, TargetApp};
use maestro_core::orchestrator::{EngineHandles, Orchestrator};
use maestro_core::status::StatusEvent;
use maestro_core::uitree::{UiNode, UiRole, UiTree};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

struct RecordingPort {
    events: Mutex<Vec<(u16, bool)>>,
}

impl RecordingPort {
    fn new() -> Arc<Self> {
        Arc::new(RecordingPort {
            events: Mutex::new(Vec::new()),
        })
    }

    fn codes(&self) -> Vec<u16> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, down)| *down)
            .map(|(code, _)| *code)
            .collect()
    }
}

impl InputPort for RecordingPort {
    fn key_event(&self, key: KeyCommand, down: bool) -> Result<(), EngineError> {
        self.events.lock().unwrap().push((key.code.0, down));
        Ok(())
    }
}

/// Target that starts stopped and comes up once a launch is requested.
struct LaunchableTarget {
    launched: AtomicBool,
    initially_running: bool,
}

impl LaunchableTarget {
    fn stopped() -> Arc<Self> {
        Arc::new(LaunchableTarget {
            launched: AtomicBool::new(false),
            initially_running: false,
        })
    }

    fn running() -> Arc<Self> {
        Arc::new(LaunchableTarget {
            launched: AtomicBool::new(false),
            initially_running: true,
        })
    }
}

impl TargetApp for LaunchableTarget {
    fn find_running(&self) -> Option<ProcessHandle> {
        if self.initially_running || self.launched.load(Ordering::SeqCst) {
            Some(ProcessHandle(99))
        } else {
            None
        }
    }

    fn request_launch(&self) -> Result<(), EngineError> {
        self.launched.store(true, Ordering::SeqCst);
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

/// Mutable project-window fake: pressing the import menu item reveals
/// the Import dialog, pressing its button raises the tempo alert, and
/// accepting the alert dismisses it.
struct ProjectTree {
    root: u64,
    state: Mutex<State>,
    pressed: Mutex<Vec<String>>,
}

impl ProjectTree {
    fn new() -> Arc<Self> {
        let mut s = State {
            nodes: HashMap::new(),
            windows: Vec::new(),
            next: 0,
        };
        let root = s.add(None, None, UiRole::Application);
        let bar = s.add(Some(root), None, UiRole::MenuBar);

        let file = s.add(Some(bar), Some("File"), UiRole::MenuBarItem);
        let file_menu = s.add(Some(file), None, UiRole::Menu);
        let import = s.add(Some(file_menu), Some("Import"), UiRole::MenuItem);
        let import_menu = s.add(Some(import), None, UiRole::Menu);
        s.add(Some(import_menu), Some("MIDI File…"), UiRole::MenuItem);

        let navigate = s.add(Some(bar), Some("Navigate"), UiRole::MenuBarItem);
        let navigate_menu = s.add(Some(navigate), None, UiRole::Menu);
        s.add(Some(navigate_menu), Some("Go to Position…"), UiRole::MenuItem);

        let window = s.add(Some(root), Some("Untitled — Tracks"), UiRole::Window);
        s.windows.push(window);
        s.add(Some(window), Some("120"), UiRole::StaticText);
        s.add(Some(window), Some("C major"), UiRole::StaticText);
        let headers = s.add(Some(window), None, UiRole::Group);
        s.add(Some(headers), Some("Drums"), UiRole::StaticText);
        s.add(Some(headers), Some("Bass"), UiRole::StaticText);

        Arc::new(ProjectTree {
            root,
            state: Mutex::new(s),
            pressed: Mutex::new(Vec::new()),
        })
    }

    fn pressed(&self) -> Vec<String> {
        self.pressed.lock().unwrap().clone()
    }
}

impl UiTree for ProjectTree {
    fn application_root(&self) -> Result<UiNode, EngineError> {
        Ok(UiNode(self.root))
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
        let label = state
            .nodes
            .get(&node.0)
            .and_then(|n| n.label.clone())
            .unwrap_or_default();
        self.pressed.lock().unwrap().push(label.clone());

        match label.as_str() {
            "MIDI File…" => {
                let dialog = state.add(None, Some("Import"), UiRole::Window);
                state.windows.push(dialog);
                state.add(Some(dialog), Some("Import"), UiRole::Button);
            }
            "Import" if state.windows.iter().any(|id| {
                state.nodes.get(id).is_some_and(|n| n.label.as_deref() == Some("Import"))
            }) =>
            {
                let alert = state.add(None, None, UiRole::Alert);
                state.windows.push(alert);
                state.add(Some(alert), Some("Import Tempo"), UiRole::Button);
                state.add(Some(alert), Some("OK"), UiRole::Button);
            }
            "Import Tempo" | "OK" => {
                let alerts: Vec<u64> = state
                    .windows
                    .iter()
                    .copied()
                    .filter(|id| {
                        state.nodes.get(id).is_some_and(|n| n.role == UiRole::Alert)
                    })
                    .collect();
                state.windows.retain(|id| !alerts.contains(id));
            }
            _ => {}
        }
        Ok(())
    }
}

fn engine(
    tree: Arc<ProjectTree>,
    target: Arc<LaunchableTarget>,
    port: Arc<RecordingPort>,
) -> (Orchestrator, EngineHandles) {
    Orchestrator::new(tree, target, port, EngineConfig::default())
}

fn drain(handles: &mut EngineHandles) -> Vec<StatusEvent> {
    let mut events = Vec::new();
    while let Ok(event) = handles.events.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn play_launches_the_stopped_target_first() {
    let tree = ProjectTree::new();
    let port = RecordingPort::new();
    let (mut engine, mut handles) = engine(tree, LaunchableTarget::stopped(), port.clone());

    let status = engine.run_command("play", true).await;
    assert_eq!(status, "Playback started");

    let events = drain(&mut handles);
    let labels: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            StatusEvent::Step { label, .. } => Some(label.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        labels,
        vec!["check-permissions", "launch", "activate", "start-playback"]
    );

    let progress: Vec<f32> = events
        .iter()
        .filter_map(|e| match e {
            StatusEvent::Step { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect();
    assert!(progress.windows(2).all(|w| w[0] < w[1]));

    assert_eq!(
        events.last(),
        Some(&StatusEvent::Finished {
            message: "Playback started".to_string()
        })
    );

    let snapshot = handles.status.borrow().clone();
    assert!(snapshot.connected);
    assert_eq!(snapshot.progress, 1.0);
    assert!(snapshot.last_error.is_none());

    // Space bar, nothing else.
    assert_eq!(port.codes(), vec![49]);
}

#[tokio::test(start_paused = true)]
async fn unknown_commands_fail_with_a_terminal_error() {
    let tree = ProjectTree::new();
    let (mut engine, mut handles) = engine(tree, LaunchableTarget::running(), RecordingPort::new());

    let status = engine.run_command("qwerty zz", false).await;
    assert_eq!(status, "Error: unknown command: qwerty zz");

    let events = drain(&mut handles);
    assert_eq!(
        events.last(),
        Some(&StatusEvent::Failed {
            message: "Error: unknown command: qwerty zz".to_string()
        })
    );
    assert!(handles.status.borrow().last_error.is_some());
}

#[tokio::test(start_paused = true)]
async fn import_midi_walks_the_whole_dialog() {
    let path = std::env::temp_dir().join("maestro_import_test.mid");
    std::fs::write(&path, b"MThd").unwrap();
    let path = path.to_string_lossy().to_string();

    let tree = ProjectTree::new();
    let port = RecordingPort::new();
    let (mut engine, _handles) = engine(tree.clone(), LaunchableTarget::running(), port.clone());

    let status = engine.run_command(&format!("import midi {path}"), false).await;
    assert_eq!(status, format!("MIDI file {path} imported"));

    let pressed = tree.pressed();
    assert_eq!(
        pressed,
        vec!["File", "Import", "MIDI File…", "Import", "Import Tempo"]
    );

    // The alert was dismissed.
    let alerts = tree
        .windows()
        .unwrap()
        .into_iter()
        .filter(|w| tree.role(*w) == UiRole::Alert)
        .count();
    assert_eq!(alerts, 0);

    // Select-last-track (cmd down = 125), go-to-folder (shift+cmd G =
    // code 5), select-all (cmd A = 0) and clear (backspace = 51) all
    // happened in order before the path was typed.
    let codes = port.codes();
    let down = codes.iter().position(|c| *c == 125).unwrap();
    let g = codes.iter().position(|c| *c == 5).unwrap();
    let a = codes.iter().position(|c| *c == 0).unwrap();
    let backspace = codes.iter().position(|c| *c == 51).unwrap();
    assert!(down < g && g < a && a < backspace);
}

#[tokio::test(start_paused = true)]
async fn importing_a_missing_file_fails_before_touching_the_target() {
    let tree = ProjectTree::new();
    let (mut engine, _handles) =
        engine(tree.clone(), LaunchableTarget::running(), RecordingPort::new());

    let status = engine
        .run_command("import midi /nonexistent/nope.mid", false)
        .await;
    assert_eq!(status, "Error: file not found: /nonexistent/nope.mid");
    assert!(tree.pressed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn set_tempo_types_into_the_readout() {
    let tree = ProjectTree::new();
    let port = RecordingPort::new();
    let (mut engine, _handles) = engine(tree.clone(), LaunchableTarget::running(), port.clone());

    let status = engine.run_command("set tempo 128", false).await;
    assert_eq!(status, "Tempo set to 128 BPM");

    // The readout was pressed, then 1 2 8 return were typed.
    assert!(tree.pressed().contains(&"120".to_string()));
    assert_eq!(port.codes(), vec![18, 19, 28, 36]);
}

#[tokio::test(start_paused = true)]
async fn navigate_opens_the_position_box_and_types_the_bar() {
    let tree = ProjectTree::new();
    let port = RecordingPort::new();
    let (mut engine, _handles) = engine(tree.clone(), LaunchableTarget::running(), port.clone());

    let status = engine.run_command("go to bar 16", false).await;
    assert_eq!(status, "Moved to bar 16");

    assert_eq!(tree.pressed(), vec!["Navigate", "Go to Position…"]);
    // '1' '6' return.
    assert_eq!(port.codes(), vec![18, 22, 36]);
}

#[tokio::test(start_paused = true)]
async fn set_key_falls_back_to_the_readout_when_the_menu_is_missing() {
    let tree = ProjectTree::new();
    let port = RecordingPort::new();
    let (mut engine, _handles) = engine(tree.clone(), LaunchableTarget::running(), port.clone());

    // The fake has no Project menu, so the menu path fails and the
    // key-signature readout in the main window takes over.
    let status = engine.run_command("set key D minor", false).await;
    assert_eq!(status, "Key set to D minor");

    assert_eq!(tree.pressed(), vec!["C major"]);
    // D space m i n o r, then return.
    assert_eq!(port.codes(), vec![2, 49, 46, 34, 45, 31, 15, 36]);
}

#[tokio::test(start_paused = true)]
async fn select_track_by_name_presses_the_header() {
    let tree = ProjectTree::new();
    let port = RecordingPort::new();
    let (mut engine, _handles) = engine(tree.clone(), LaunchableTarget::running(), port.clone());

    let status = engine.run_command("select track Drums", false).await;
    assert_eq!(status, "Track 'Drums' selected");
    assert_eq!(tree.pressed(), vec!["Drums"]);
    assert!(port.codes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn selecting_an_unknown_track_name_fails() {
    let tree = ProjectTree::new();
    let (mut engine, _handles) =
        engine(tree.clone(), LaunchableTarget::running(), RecordingPort::new());

    let status = engine.run_command("select track Zither", false).await;
    assert!(
        status.starts_with("Error: no element matching 'Zither'"),
        "unexpected status {status:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn new_track_confirms_the_default_type() {
    let tree = ProjectTree::new();
    let port = RecordingPort::new();
    let (mut engine, _handles) = engine(tree, LaunchableTarget::running(), port.clone());

    let status = engine.run_command("new track", false).await;
    assert_eq!(status, "Track created");
    // option+cmd N, then return.
    assert_eq!(port.codes(), vec![45, 36]);
}

#[tokio::test(start_paused = true)]
async fn replace_region_cycles_the_selection() {
    let tree = ProjectTree::new();
    let port = RecordingPort::new();
    let (mut engine, _handles) = engine(tree, LaunchableTarget::running(), port.clone());

    let status = engine.run_command("replace region", false).await;
    assert_eq!(status, "Cycle region replaced with selection");
    // cmd A, cmd L.
    assert_eq!(port.codes(), vec![0, 37]);
}

#[tokio::test(start_paused = true)]
async fn abort_stops_a_workflow_before_its_first_step() {
    let tree = ProjectTree::new();
    let port = RecordingPort::new();
    let (mut engine, handles) = engine(tree, LaunchableTarget::running(), port.clone());

    handles.abort.send(true).unwrap();
    let status = engine.run_command("play", false).await;
    assert_eq!(status, "Error: aborted");
    assert!(port.codes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn help_needs_no_target_at_all() {
    let tree = ProjectTree::new();
    let (mut engine, _handles) = engine(tree, LaunchableTarget::stopped(), RecordingPort::new());

    let status = engine.run_command("help", false).await;
    assert!(status.starts_with("commands:"));
}

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::input::{InputPort, KeySequencer};
use crate::intent::{self, Intent, PlaybackAction, TrackTarget};
use crate::keymap::Modifiers;
use crate::lifecycle::{Lifecycle, TargetApp};
use crate::resolver::{self, MenuPath};
use crate::status::{EngineStatus, StatusEvent};
use crate::uitree::{UiNode, UiRole, UiTree};
use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

const HELP_TEXT: &str = "commands: go to bar <n> | select track <n|name> | replace region | \
import midi <path> | new track | set tempo <bpm> | set key <key> | play | stop | help";

/// One workflow step: a human-readable label reported before the step
/// runs, and the operation to perform.
struct Step {
    label: String,
    op: Op,
}

impl Step {
    fn new(label: impl Into<String>, op: Op) -> Self {
        Step {
            label: label.into(),
            op,
        }
    }
}

/// Primitive operations a workflow script is assembled from. Scripts
/// are data; a single loop in `execute` runs them.
enum Op {
    CheckPermissions,
    Connect { launch: bool },
    Activate,
    EnsureFile(String),
    Menu(MenuPath),
    Key { symbol: &'static str, modifiers: Modifiers },
    KeyRepeat { symbol: &'static str, count: u32 },
    TypeText(String),
    WaitWindow(String),
    PressButton { window: String, button: String },
    AcceptAlert { buttons: Vec<&'static str> },
    Settle(Duration),
    SetTempo(u32),
    SetKey(String),
    SelectTrackByName(String),
    ShowHelp,
}

/// Channels handed to the embedding layer: the progress event stream,
/// the polled status snapshot, and the between-steps abort flag.
pub struct EngineHandles {
    pub events: mpsc::UnboundedReceiver<StatusEvent>,
    pub status: watch::Receiver<EngineStatus>,
    pub abort: watch::Sender<bool>,
}

/// Sequences multi-step workflows against the live target: one command
/// is fully executed before the next is accepted, and a failure at any
/// step aborts the remainder with no rollback.
pub struct Orchestrator {
    tree: Arc<dyn UiTree>,
    lifecycle: Lifecycle,
    sequencer: KeySequencer,
    config: EngineConfig,
    events: mpsc::UnboundedSender<StatusEvent>,
    status: watch::Sender<EngineStatus>,
    abort: watch::Receiver<bool>,
}

impl Orchestrator {
    pub fn new(
        tree: Arc<dyn UiTree>,
        target: Arc<dyn TargetApp>,
        port: Arc<dyn InputPort>,
        config: EngineConfig,
    ) -> (Self, EngineHandles) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(EngineStatus::default());
        let (abort_tx, abort_rx) = watch::channel(false);

        let orchestrator = Orchestrator {
            tree,
            lifecycle: Lifecycle::new(target, &config),
            sequencer: KeySequencer::new(port, config.clone()),
            config,
            events: events_tx,
            status: status_tx,
            abort: abort_rx,
        };
        let handles = EngineHandles {
            events: events_rx,
            status: status_rx,
            abort: abort_tx,
        };
        (orchestrator, handles)
    }

    /// Parses and executes one text command, returning the terminal
    /// status string. Failures read `"Error: <reason>"`.
    pub async fn run_command(&mut self, text: &str, launch: bool) -> String {
        let result = match intent::parse(text) {
            Ok(intent) => self.execute(intent, launch).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(message) => {
                let _ = self.events.send(StatusEvent::Finished {
                    message: message.clone(),
                });
                self.publish("done", 1.0, None);
                message
            }
            Err(e) => {
                let message = format!("Error: {e}");
                let _ = self.events.send(StatusEvent::Failed {
                    message: message.clone(),
                });
                self.publish("failed", 1.0, Some(message.clone()));
                message
            }
        }
    }

    /// Runs the workflow for `intent`. Progress is reported before each
    /// step as a monotonically increasing fraction; the first hard
    /// failure aborts the remaining steps, leaving the target in
    /// whatever intermediate state the completed steps produced.
    pub async fn execute(&mut self, intent: Intent, launch: bool) -> Result<String, EngineError> {
        let (steps, done) = script(intent, launch, &self.config)?;
        let total = steps.len() as f32;

        for (i, step) in steps.iter().enumerate() {
            if *self.abort.borrow() {
                warn!("abort requested, not starting step {:?}", step.label);
                return Err(EngineError::Aborted);
            }
            let progress = i as f32 / total;
            let _ = self.events.send(StatusEvent::Step {
                label: step.label.clone(),
                progress,
            });
            self.publish(&step.label, progress, None);
            self.run_op(&step.op).await?;
        }
        Ok(done)
    }

    async fn run_op(&mut self, op: &Op) -> Result<(), EngineError> {
        // Everything that touches the target re-checks the handle first;
        // a vanished process is detected here, not by a health check.
        match op {
            Op::CheckPermissions
            | Op::Connect { .. }
            | Op::EnsureFile(_)
            | Op::Settle(_)
            | Op::ShowHelp => {}
            _ => {
                self.lifecycle.live_handle()?;
            }
        }

        match op {
            Op::CheckPermissions => self.lifecycle.check_permissions(),
            Op::Connect { launch } => self.lifecycle.connect(*launch).await.map(|_| ()),
            Op::Activate => self.lifecycle.ensure_active(),
            Op::EnsureFile(path) => {
                if Path::new(path).exists() {
                    Ok(())
                } else {
                    Err(EngineError::FileNotFound(path.clone()))
                }
            }
            Op::Menu(path) => resolver::activate(self.tree.as_ref(), &self.config, path).await,
            Op::Key { symbol, modifiers } => self.sequencer.send_key(symbol, *modifiers).await,
            Op::KeyRepeat { symbol, count } => {
                for _ in 0..*count {
                    self.sequencer.send_key(symbol, Modifiers::NONE).await?;
                }
                Ok(())
            }
            Op::TypeText(text) => self.sequencer.send_text(text).await,
            Op::WaitWindow(title) => {
                resolver::wait_for_window(self.tree.as_ref(), &self.config, title)
                    .await
                    .map(|_| ())
            }
            Op::PressButton { window, button } => {
                let w = resolver::wait_for_window(self.tree.as_ref(), &self.config, window).await?;
                let path = MenuPath::new([button.clone()]);
                resolver::activate_from(self.tree.as_ref(), &self.config, w, &path).await
            }
            Op::AcceptAlert { buttons } => self.accept_alert(buttons).await,
            Op::Settle(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            Op::SetTempo(bpm) => self.set_tempo(*bpm).await,
            Op::SetKey(key) => self.set_key(key).await,
            Op::SelectTrackByName(name) => self.select_track_by_name(name),
            Op::ShowHelp => Ok(()),
        }
    }

    /// The main project window: the one whose title names the track
    /// area, falling back to the frontmost window.
    fn main_window(&self) -> Result<UiNode, EngineError> {
        let windows = self.tree.windows()?;
        windows
            .iter()
            .copied()
            .find(|w| {
                self.tree
                    .label(*w)
                    .is_some_and(|title| title.contains("Tracks"))
            })
            .or_else(|| windows.first().copied())
            .ok_or(EngineError::NotConnected)
    }

    /// Sets the tempo through the transport readout, falling back to
    /// the menu when no readout can be found.
    async fn set_tempo(&mut self, bpm: u32) -> Result<(), EngineError> {
        let window = self.main_window()?;
        let readout = resolver::find_descendant(self.tree.as_ref(), window, &|role, label| {
            role == UiRole::StaticText
                && label.is_some_and(|text| {
                    let lower = text.to_ascii_lowercase();
                    lower.contains("bpm")
                        || (!text.is_empty()
                            && text.chars().all(|c| c.is_ascii_digit() || c == '.'))
                })
        })?;

        if let Some(node) = readout {
            debug!("tempo readout found, typing {bpm}");
            self.tree.press(node)?;
            tokio::time::sleep(self.config.menu_settle()).await;
            self.sequencer.send_text(&bpm.to_string()).await?;
            self.sequencer.send_key("return", Modifiers::NONE).await?;
            return Ok(());
        }

        debug!("no tempo readout, falling back to the menu");
        let path = MenuPath::new(vec![
            "Project".to_string(),
            "Tempo".to_string(),
            format!("{bpm} BPM"),
        ]);
        resolver::activate(self.tree.as_ref(), &self.config, &path).await
    }

    /// Sets the key signature through the menu, falling back to the
    /// key readout in the main window.
    async fn set_key(&mut self, key: &str) -> Result<(), EngineError> {
        let path = MenuPath::new(vec![
            "Project".to_string(),
            "Key Signature".to_string(),
            key.to_string(),
        ]);
        match resolver::activate(self.tree.as_ref(), &self.config, &path).await {
            Ok(()) => return Ok(()),
            Err(e) => debug!("key menu path failed ({e}), trying the readout"),
        }

        let window = self.main_window()?;
        let readout = resolver::find_descendant(self.tree.as_ref(), window, &|role, label| {
            role == UiRole::StaticText
                && label.is_some_and(|text| {
                    let lower = text.to_ascii_lowercase();
                    lower.contains("major") || lower.contains("minor")
                })
        })?;
        let Some(node) = readout else {
            return Err(EngineError::ResolutionFailed {
                segment: key.to_string(),
                siblings: Vec::new(),
            });
        };
        self.tree.press(node)?;
        tokio::time::sleep(self.config.menu_settle()).await;
        self.sequencer.send_text(key).await?;
        self.sequencer.send_key("return", Modifiers::NONE).await
    }

    fn select_track_by_name(&self, name: &str) -> Result<(), EngineError> {
        let window = self.main_window()?;
        let header = resolver::find_descendant(self.tree.as_ref(), window, &|_, label| {
            label == Some(name)
        })?;
        match header {
            Some(node) => self.tree.press(node),
            None => Err(EngineError::ResolutionFailed {
                segment: name.to_string(),
                siblings: Vec::new(),
            }),
        }
    }

    /// Presses the first expected button on the post-import alert. The
    /// alert is optional; some target versions never raise one.
    async fn accept_alert(&mut self, buttons: &[&'static str]) -> Result<(), EngineError> {
        let Some(alert) = resolver::wait_for_alert(self.tree.as_ref(), &self.config).await? else {
            debug!("no alert appeared, continuing");
            return Ok(());
        };
        for button in buttons {
            let path = MenuPath::new([button.to_string()]);
            if resolver::activate_from(self.tree.as_ref(), &self.config, alert, &path)
                .await
                .is_ok()
            {
                return Ok(());
            }
        }
        warn!("alert present but none of {buttons:?} found, continuing");
        Ok(())
    }

    fn publish(&self, step: &str, progress: f32, last_error: Option<String>) {
        let _ = self.status.send(EngineStatus {
            connected: self.lifecycle.state().is_connected(),
            current_step: step.to_string(),
            progress,
            last_error,
        });
    }
}

/// Standard opening for every workflow that drives the target.
fn prologue(launch: bool) -> Vec<Step> {
    vec![
        Step::new("check-permissions", Op::CheckPermissions),
        Step::new(
            if launch { "launch" } else { "connect" },
            Op::Connect { launch },
        ),
        Step::new("activate", Op::Activate),
    ]
}

/// Compiles an intent into its workflow script and final status line.
fn script(
    intent: Intent,
    launch: bool,
    config: &EngineConfig,
) -> Result<(Vec<Step>, String), EngineError> {
    let script = match intent {
        Intent::Playback {
            action: PlaybackAction::Start,
        } => {
            let mut steps = prologue(launch);
            steps.push(Step::new(
                "start-playback",
                Op::Key {
                    symbol: "space",
                    modifiers: Modifiers::NONE,
                },
            ));
            (steps, "Playback started".to_string())
        }
        Intent::Playback {
            action: PlaybackAction::Stop,
        } => {
            let mut steps = prologue(launch);
            steps.push(Step::new(
                "stop-playback",
                Op::Key {
                    symbol: "space",
                    modifiers: Modifiers::NONE,
                },
            ));
            (steps, "Playback stopped".to_string())
        }
        Intent::Navigate { bar } => {
            let mut steps = prologue(launch);
            steps.push(Step::new(
                "open-position-box",
                Op::Menu(MenuPath::new(["Navigate", "Go to Position…"])),
            ));
            steps.push(Step::new("type-position", Op::TypeText(bar.to_string())));
            steps.push(Step::new(
                "confirm",
                Op::Key {
                    symbol: "return",
                    modifiers: Modifiers::NONE,
                },
            ));
            (steps, format!("Moved to bar {bar}"))
        }
        Intent::SelectTrack {
            target: TrackTarget::Index(index),
        } => {
            let mut steps = prologue(launch);
            steps.push(Step::new(
                "first-track",
                Op::Key {
                    symbol: "up",
                    modifiers: Modifiers::cmd(),
                },
            ));
            steps.push(Step::new(
                "step-to-track",
                Op::KeyRepeat {
                    symbol: "down",
                    count: index.saturating_sub(1),
                },
            ));
            (steps, format!("Track {index} selected"))
        }
        Intent::SelectTrack {
            target: TrackTarget::Name(name),
        } => {
            let mut steps = prologue(launch);
            steps.push(Step::new(
                "find-track",
                Op::SelectTrackByName(name.clone()),
            ));
            (steps, format!("Track '{name}' selected"))
        }
        Intent::ReplaceRegion => {
            let mut steps = prologue(launch);
            steps.push(Step::new(
                "select-regions",
                Op::Key {
                    symbol: "a",
                    modifiers: Modifiers::cmd(),
                },
            ));
            steps.push(Step::new(
                "cycle-selection",
                Op::Key {
                    symbol: "l",
                    modifiers: Modifiers::cmd(),
                },
            ));
            (steps, "Cycle region replaced with selection".to_string())
        }
        Intent::ImportMidi { path } => {
            let mut steps = vec![Step::new("check-file", Op::EnsureFile(path.clone()))];
            steps.extend(prologue(launch));
            // Imported regions land on the selected track; park the
            // selection on the last track before opening the dialog.
            steps.push(Step::new(
                "select-last-track",
                Op::Key {
                    symbol: "down",
                    modifiers: Modifiers::cmd(),
                },
            ));
            steps.push(Step::new(
                "open-import-dialog",
                Op::Menu(MenuPath::new(["File", "Import", "MIDI File…"])),
            ));
            steps.push(Step::new(
                "wait-import-window",
                Op::WaitWindow("Import".to_string()),
            ));
            steps.push(Step::new(
                "open-goto-folder",
                Op::Key {
                    symbol: "g",
                    modifiers: Modifiers::cmd_shift(),
                },
            ));
            steps.push(Step::new("settle-sheet", Op::Settle(config.path_settle())));
            steps.push(Step::new(
                "select-existing-path",
                Op::Key {
                    symbol: "a",
                    modifiers: Modifiers::cmd(),
                },
            ));
            steps.push(Step::new(
                "clear-path",
                Op::Key {
                    symbol: "backspace",
                    modifiers: Modifiers::NONE,
                },
            ));
            steps.push(Step::new("type-path", Op::TypeText(path.clone())));
            steps.push(Step::new("settle-path", Op::Settle(config.path_settle())));
            steps.push(Step::new(
                "confirm-path",
                Op::Key {
                    symbol: "return",
                    modifiers: Modifiers::NONE,
                },
            ));
            steps.push(Step::new(
                "settle-import",
                Op::Settle(config.post_enter_settle()),
            ));
            steps.push(Step::new(
                "press-import",
                Op::PressButton {
                    window: "Import".to_string(),
                    button: "Import".to_string(),
                },
            ));
            steps.push(Step::new(
                "import-tempo",
                Op::AcceptAlert {
                    buttons: vec!["Import Tempo", "OK"],
                },
            ));
            (steps, format!("MIDI file {path} imported"))
        }
        Intent::NewTrack => {
            let mut steps = prologue(launch);
            steps.push(Step::new(
                "new-track",
                Op::Key {
                    symbol: "n",
                    modifiers: Modifiers::cmd_option(),
                },
            ));
            steps.push(Step::new(
                "confirm",
                Op::Key {
                    symbol: "return",
                    modifiers: Modifiers::NONE,
                },
            ));
            (steps, "Track created".to_string())
        }
        Intent::SetTempo { bpm } => {
            let mut steps = prologue(launch);
            steps.push(Step::new("set-tempo", Op::SetTempo(bpm)));
            (steps, format!("Tempo set to {bpm} BPM"))
        }
        Intent::SetKey { key } => {
            let mut steps = prologue(launch);
            steps.push(Step::new("set-key", Op::SetKey(key.clone())));
            (steps, format!("Key set to {key}"))
        }
        Intent::Help => (
            vec![Step::new("help", Op::ShowHelp)],
            HELP_TEXT.to_string(),
        ),
        Intent::Unknown { text } => return Err(EngineError::UnknownCommand(text)),
    };
    Ok(script)
}

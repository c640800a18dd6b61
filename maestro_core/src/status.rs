use serde::Serialize;

/// One event in a workflow's progress stream. `Step` is emitted before
/// each step begins; exactly one terminal event follows, carrying the
/// final user-readable status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum StatusEvent {
    Step { label: String, progress: f32 },
    Finished { message: String },
    Failed { message: String },
}

impl StatusEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusEvent::Finished { .. } | StatusEvent::Failed { .. })
    }
}

/// Snapshot polled by a presentation layer: a connection flag, the
/// current step, a progress fraction, and the last error string.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStatus {
    pub connected: bool,
    pub current_step: String,
    pub progress: f32,
    pub last_error: Option<String>,
}

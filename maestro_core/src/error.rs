use thiserror::Error;

/// Engine failures. Everything the orchestrator surfaces to the user goes
/// through `Display` here, prefixed with `"Error: "` in the terminal status.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("not connected to the target application")]
    NotConnected,

    #[error("timed out waiting for the target application to appear")]
    LaunchTimeout,

    /// Soft: logged by the lifecycle manager and never aborts a workflow.
    #[error("could not bring the target application to the foreground")]
    ActivationFailed,

    #[error("no element matching '{segment}' (found: {})", .siblings.join(", "))]
    ResolutionFailed {
        segment: String,
        siblings: Vec<String>,
    },

    #[error("missing required parameter: {0}")]
    ParameterMissing(&'static str),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("accessibility permission denied")]
    PermissionDenied,

    #[error("input synthesis failed: {0}")]
    Input(String),

    #[error("aborted")]
    Aborted,
}

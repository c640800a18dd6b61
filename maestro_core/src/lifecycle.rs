use crate::config::EngineConfig;
use crate::error::EngineError;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Opaque handle to the running target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected(ProcessHandle),
    Activating(ProcessHandle),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connected(_) | ConnectionState::Activating(_)
        )
    }
}

/// Process-control seam over the target application. Activation is
/// split into three independent strategies because any single one can
/// silently fail depending on the target's state.
pub trait TargetApp: Send + Sync {
    fn find_running(&self) -> Option<ProcessHandle>;

    /// Asks the OS to open the target application. Discovery still goes
    /// through the normal connect polling afterwards.
    fn request_launch(&self) -> Result<(), EngineError>;

    fn is_alive(&self, handle: ProcessHandle) -> bool;

    /// Whether this process is trusted to drive the accessibility API.
    fn accessibility_trusted(&self) -> bool;

    fn activate_process(&self, handle: ProcessHandle) -> Result<(), EngineError>;
    fn activate_scripting(&self, handle: ProcessHandle) -> Result<(), EngineError>;
    fn activate_accessibility(&self, handle: ProcessHandle) -> Result<(), EngineError>;
}

/// Owns the one piece of shared mutable engine state: the connection to
/// the target process. All other components re-fetch status through the
/// orchestrator rather than caching handles, because the target may
/// disappear between any two operations.
pub struct Lifecycle {
    target: Arc<dyn TargetApp>,
    state: ConnectionState,
    poll: Duration,
    max_polls: u32,
}

impl Lifecycle {
    pub fn new(target: Arc<dyn TargetApp>, config: &EngineConfig) -> Self {
        Self {
            target,
            state: ConnectionState::Disconnected,
            poll: config.connect_poll(),
            max_polls: config.connect_max_polls,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn check_permissions(&self) -> Result<(), EngineError> {
        if self.target.accessibility_trusted() {
            Ok(())
        } else {
            Err(EngineError::PermissionDenied)
        }
    }

    /// Connects to the target, optionally launching it first. A no-op
    /// returning the existing handle when already connected and alive.
    /// Exhausting the poll budget surfaces `LaunchTimeout` and leaves
    /// the state Disconnected.
    pub async fn connect(&mut self, launch: bool) -> Result<ProcessHandle, EngineError> {
        if let ConnectionState::Connected(handle) = self.state {
            if self.target.is_alive(handle) {
                debug!("already connected to pid {}", handle.0);
                return Ok(handle);
            }
            warn!("handle for pid {} is stale, reconnecting", handle.0);
            self.state = ConnectionState::Disconnected;
        }

        self.state = ConnectionState::Connecting;
        if launch && self.target.find_running().is_none() {
            info!("target not running, requesting launch");
            if let Err(e) = self.target.request_launch() {
                self.state = ConnectionState::Disconnected;
                return Err(e);
            }
        }

        for _ in 0..self.max_polls {
            if let Some(handle) = self.target.find_running() {
                info!("connected to target pid {}", handle.0);
                self.state = ConnectionState::Connected(handle);
                return Ok(handle);
            }
            tokio::time::sleep(self.poll).await;
        }

        self.state = ConnectionState::Disconnected;
        Err(EngineError::LaunchTimeout)
    }

    /// Returns the current handle after re-checking liveness. Stale
    /// handles are detected here, lazily, on the next use.
    pub fn live_handle(&mut self) -> Result<ProcessHandle, EngineError> {
        match self.state {
            ConnectionState::Connected(handle) | ConnectionState::Activating(handle) => {
                if self.target.is_alive(handle) {
                    Ok(handle)
                } else {
                    warn!("target pid {} disappeared", handle.0);
                    self.state = ConnectionState::Disconnected;
                    Err(EngineError::NotConnected)
                }
            }
            _ => Err(EngineError::NotConnected),
        }
    }

    /// Brings the target to the foreground, trying each strategy in
    /// order. Activation is unreliable but usually unnecessary for the
    /// next primitive to succeed, so total failure is logged and
    /// swallowed; only a missing connection is an error.
    pub fn ensure_active(&mut self) -> Result<(), EngineError> {
        let handle = self.live_handle()?;
        self.state = ConnectionState::Activating(handle);

        let activated = self
            .target
            .activate_process(handle)
            .or_else(|_| self.target.activate_scripting(handle))
            .or_else(|_| self.target.activate_accessibility(handle))
            .is_ok();
        if !activated {
            warn!("{}", EngineError::ActivationFailed);
        }

        self.state = ConnectionState::Connected(handle);
        Ok(())
    }
}

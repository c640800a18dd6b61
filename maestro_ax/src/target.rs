use crate::ffi;
use log::{debug, warn};
use maestro_core::error::EngineError;
use maestro_core::lifecycle::{ProcessHandle, TargetApp};
use std::process::Command;

/// Process control for the target application, addressed by bundle id
/// for launching and by process name for discovery.
pub struct MacTarget {
    bundle_id: String,
    process_name: String,
}

impl MacTarget {
    pub fn new(bundle_id: impl Into<String>, process_name: impl Into<String>) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            process_name: process_name.into(),
        }
    }
}

pub(crate) fn find_pid(process_name: &str) -> Option<u32> {
    let output = Command::new("pgrep")
        .args(["-x", process_name])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()?
        .trim()
        .parse()
        .ok()
}

impl TargetApp for MacTarget {
    fn find_running(&self) -> Option<ProcessHandle> {
        find_pid(&self.process_name).map(ProcessHandle)
    }

    fn request_launch(&self) -> Result<(), EngineError> {
        debug!("open -b {}", self.bundle_id);
        // A failed open request is not terminal; the connect polling
        // will surface the timeout if nothing appears.
        if let Err(e) = Command::new("open").args(["-b", &self.bundle_id]).status() {
            warn!("launch request failed: {e}");
        }
        Ok(())
    }

    fn is_alive(&self, handle: ProcessHandle) -> bool {
        Command::new("kill")
            .args(["-0", &handle.0.to_string()])
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn accessibility_trusted(&self) -> bool {
        ffi::process_trusted()
    }

    fn activate_process(&self, _handle: ProcessHandle) -> Result<(), EngineError> {
        let status = Command::new("open")
            .args(["-b", &self.bundle_id])
            .status()
            .map_err(|e| EngineError::Input(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(EngineError::ActivationFailed)
        }
    }

    fn activate_scripting(&self, _handle: ProcessHandle) -> Result<(), EngineError> {
        let script = format!("tell application id \"{}\" to activate", self.bundle_id);
        let status = Command::new("osascript")
            .args(["-e", &script])
            .status()
            .map_err(|e| EngineError::Input(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(EngineError::ActivationFailed)
        }
    }

    fn activate_accessibility(&self, handle: ProcessHandle) -> Result<(), EngineError> {
        let app =
            ffi::application_element(handle.0 as i32).ok_or(EngineError::ActivationFailed)?;
        let window = ffi::copy_attribute(&app, "AXMainWindow")
            .or_else(|| ffi::copy_attribute(&app, "AXFocusedWindow"))
            .ok_or(EngineError::ActivationFailed)?;
        ffi::perform_action(&window, "AXRaise").map_err(|_| EngineError::ActivationFailed)
    }
}

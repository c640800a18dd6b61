//! macOS backend for the automation engine: accessibility UI-tree
//! provider, CoreGraphics key synthesis, and process control. On other
//! targets this crate compiles to an empty shell; the engine runs
//! against fakes there.

#[cfg(target_os = "macos")]
mod ffi;
#[cfg(target_os = "macos")]
mod input;
#[cfg(target_os = "macos")]
mod target;
#[cfg(target_os = "macos")]
mod tree;

#[cfg(target_os = "macos")]
pub use input::CgInput;
#[cfg(target_os = "macos")]
pub use target::MacTarget;
#[cfg(target_os = "macos")]
pub use tree::AxTree;

use crate::error::EngineError;

/// Opaque handle to a position in the externally-owned UI tree. Valid
/// only for the duration of a single resolution; the tree mutates
/// asynchronously (menus open and close, windows appear and disappear),
/// so handles must never be cached across operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UiNode(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRole {
    Application,
    Window,
    Alert,
    MenuBar,
    MenuBarItem,
    Menu,
    MenuItem,
    Button,
    StaticText,
    Group,
    Other,
}

/// Capability seam over the target application's live UI tree. Every
/// method re-queries external state; implementations own the mapping
/// from `UiNode` ids to whatever the platform uses as element handles.
pub trait UiTree: Send + Sync {
    /// Root element of the target application.
    fn application_root(&self) -> Result<UiNode, EngineError>;

    /// Currently visible top-level windows, including sheets and alerts.
    fn windows(&self) -> Result<Vec<UiNode>, EngineError>;

    fn children(&self, node: UiNode) -> Result<Vec<UiNode>, EngineError>;

    fn label(&self, node: UiNode) -> Option<String>;

    fn role(&self, node: UiNode) -> UiRole;

    /// Triggers the node's primary action. The same primitive expands a
    /// menu, presses a button, and activates a menu item.
    fn press(&self, node: UiNode) -> Result<(), EngineError>;
}

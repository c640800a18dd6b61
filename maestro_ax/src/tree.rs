use crate::ffi;
use core_foundation::array::CFArray;
use core_foundation::base::CFType;
use core_foundation::string::CFString;
use log::debug;
use maestro_core::error::EngineError;
use maestro_core::uitree::{UiNode, UiRole, UiTree};
use std::collections::HashMap;
use std::sync::Mutex;

/// Accessibility-tree provider for the target application. `UiNode`
/// ids map to retained `AXUIElement` references held in a registry;
/// the registry is rebuilt on every `application_root` call, so
/// handles never outlive a single resolution.
pub struct AxTree {
    process_name: String,
    registry: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
    nodes: HashMap<u64, CFType>,
    next: u64,
}

impl Registry {
    fn insert(&mut self, element: CFType) -> UiNode {
        self.next += 1;
        self.nodes.insert(self.next, element);
        UiNode(self.next)
    }

    fn get(&self, node: UiNode) -> Option<CFType> {
        self.nodes.get(&node.0).cloned()
    }
}

impl AxTree {
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
            registry: Mutex::new(Registry::default()),
        }
    }

    fn app_element(&self) -> Result<CFType, EngineError> {
        let pid = crate::target::find_pid(&self.process_name).ok_or(EngineError::NotConnected)?;
        ffi::application_element(pid as i32).ok_or(EngineError::NotConnected)
    }

    fn element(&self, node: UiNode) -> Result<CFType, EngineError> {
        self.registry
            .lock()
            .map_err(|_| EngineError::NotConnected)?
            .get(node)
            .ok_or(EngineError::NotConnected)
    }

    fn register_array(&self, value: CFType) -> Result<Vec<UiNode>, EngineError> {
        let Some(array) = value.downcast_into::<CFArray<CFType>>() else {
            return Ok(Vec::new());
        };
        let mut registry = self.registry.lock().map_err(|_| EngineError::NotConnected)?;
        Ok(array
            .iter()
            .map(|item| registry.insert(item.clone()))
            .collect())
    }

    fn string_attribute(&self, node: UiNode, attribute: &str) -> Option<String> {
        let element = self.element(node).ok()?;
        let value = ffi::copy_attribute(&element, attribute)?;
        value
            .downcast_into::<CFString>()
            .map(|s| s.to_string())
    }
}

impl UiTree for AxTree {
    fn application_root(&self) -> Result<UiNode, EngineError> {
        let app = self.app_element()?;
        let mut registry = self.registry.lock().map_err(|_| EngineError::NotConnected)?;
        // Fresh resolution: previous handles are stale by definition.
        registry.nodes.clear();
        debug!("accessibility root rebuilt for {}", self.process_name);
        Ok(registry.insert(app))
    }

    fn windows(&self) -> Result<Vec<UiNode>, EngineError> {
        let app = self.app_element()?;
        match ffi::copy_attribute(&app, "AXWindows") {
            Some(value) => self.register_array(value),
            None => Ok(Vec::new()),
        }
    }

    fn children(&self, node: UiNode) -> Result<Vec<UiNode>, EngineError> {
        let element = self.element(node)?;
        match ffi::copy_attribute(&element, "AXChildren") {
            Some(value) => self.register_array(value),
            None => Ok(Vec::new()),
        }
    }

    fn label(&self, node: UiNode) -> Option<String> {
        self.string_attribute(node, "AXTitle")
            .filter(|t| !t.is_empty())
            .or_else(|| self.string_attribute(node, "AXValue"))
    }

    fn role(&self, node: UiNode) -> UiRole {
        let Some(role) = self.string_attribute(node, "AXRole") else {
            return UiRole::Other;
        };
        match role.as_str() {
            "AXApplication" => UiRole::Application,
            "AXWindow" => {
                // Alerts surface as windows described as "alert".
                if self.string_attribute(node, "AXDescription").as_deref() == Some("alert") {
                    UiRole::Alert
                } else {
                    UiRole::Window
                }
            }
            "AXSheet" => UiRole::Alert,
            "AXMenuBar" => UiRole::MenuBar,
            "AXMenuBarItem" => UiRole::MenuBarItem,
            "AXMenu" => UiRole::Menu,
            "AXMenuItem" => UiRole::MenuItem,
            "AXButton" => UiRole::Button,
            "AXStaticText" => UiRole::StaticText,
            "AXGroup" => UiRole::Group,
            _ => UiRole::Other,
        }
    }

    fn press(&self, node: UiNode) -> Result<(), EngineError> {
        let element = self.element(node)?;
        ffi::perform_action(&element, "AXPress")
            .map_err(|err| EngineError::Input(format!("AXPress failed: {err}")))
    }
}

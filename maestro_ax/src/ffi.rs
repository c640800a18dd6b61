//! Minimal raw bindings to the HIServices accessibility API. Everything
//! crossing this boundary is wrapped into `CFType` immediately.

use core_foundation::base::{CFType, CFTypeRef, TCFType};
use core_foundation::string::{CFString, CFStringRef};

pub type AxError = i32;

pub const AX_SUCCESS: AxError = 0;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXUIElementCreateApplication(pid: i32) -> CFTypeRef;
    fn AXUIElementCopyAttributeValue(
        element: CFTypeRef,
        attribute: CFStringRef,
        value: *mut CFTypeRef,
    ) -> AxError;
    fn AXUIElementPerformAction(element: CFTypeRef, action: CFStringRef) -> AxError;
    fn AXIsProcessTrusted() -> bool;
}

pub fn application_element(pid: i32) -> Option<CFType> {
    let raw = unsafe { AXUIElementCreateApplication(pid) };
    if raw.is_null() {
        None
    } else {
        Some(unsafe { CFType::wrap_under_create_rule(raw) })
    }
}

pub fn copy_attribute(element: &CFType, attribute: &str) -> Option<CFType> {
    let name = CFString::new(attribute);
    let mut value: CFTypeRef = std::ptr::null();
    let err = unsafe {
        AXUIElementCopyAttributeValue(
            element.as_CFTypeRef(),
            name.as_concrete_TypeRef(),
            &mut value,
        )
    };
    if err != AX_SUCCESS || value.is_null() {
        return None;
    }
    Some(unsafe { CFType::wrap_under_create_rule(value) })
}

pub fn perform_action(element: &CFType, action: &str) -> Result<(), AxError> {
    let name = CFString::new(action);
    let err =
        unsafe { AXUIElementPerformAction(element.as_CFTypeRef(), name.as_concrete_TypeRef()) };
    if err == AX_SUCCESS {
        Ok(())
    } else {
        Err(err)
    }
}

pub fn process_trusted() -> bool {
    unsafe { AXIsProcessTrusted() }
}

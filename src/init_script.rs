//! JavaScript injected into the hosted page
//!
//! - The bridge installer, run before any page script on every navigation
//! - One-line scripts the shell evaluates to call back into the page:
//!   ready/permission events and location updates

use crate::error::Result;
use crate::types::LocationFix;

const BRIDGE_SCRIPT: &str = include_str!("init_script/bridge.js");

pub const BRIDGE_READY_EVENT: &str = "android-bridge-ready";
pub const PERMISSION_GRANTED_EVENT: &str = "android-permission-granted";
pub const PERMISSION_DENIED_EVENT: &str = "android-permission-denied";

/// Bridge installer for the given global object name.
pub fn bridge_init_script(object_name: &str) -> String {
    // serde_json produces a quoted, escaped JS string literal
    let literal = serde_json::to_string(object_name).unwrap_or_else(|_| "\"AndroidBridge\"".to_string());
    BRIDGE_SCRIPT.replace("__BRIDGE_OBJECT__", &literal)
}

pub fn dispatch_event_script(event: &str) -> String {
    format!("window.dispatchEvent(new Event('{}'))", event)
}

pub fn permission_event_script(granted: bool) -> String {
    dispatch_event_script(if granted {
        PERMISSION_GRANTED_EVENT
    } else {
        PERMISSION_DENIED_EVENT
    })
}

pub fn location_update_script(fix: &LocationFix) -> Result<String> {
    let json = serde_json::to_string(fix)?;
    Ok(format!("window.onNativeLocationUpdate({})", json))
}

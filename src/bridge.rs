//! Device bridge: the native side of `window.AndroidBridge`.
//!
//! Location requests are single shot. Each call gets its own request id; the
//! first result for an id is delivered to page script and the id is retired, so
//! late or duplicate fixes are dropped.

use std::collections::HashSet;

use crate::color::Color;
use crate::init_script;
use crate::platform::Platform;
use crate::types::{BarStyle, LocationFix, LocationRequest};

/// Parse the arguments of `updateStatusBar`. `None` means the color was rejected
/// and nothing may change.
pub fn parse_status_bar(is_dark_mode: bool, hex_color: &str) -> Option<BarStyle> {
    match Color::parse(hex_color) {
        Ok(color) => Some(BarStyle::for_theme(color, is_dark_mode)),
        Err(e) => {
            log::debug!("[Bridge] updateStatusBar rejected: {}", e);
            None
        }
    }
}

#[derive(Default)]
pub struct DeviceBridge {
    next_request_id: u64,
    active_requests: HashSet<u64>,
}

impl DeviceBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_requests(&self) -> usize {
        self.active_requests.len()
    }

    /// Start a single-shot location request. Declines silently when the
    /// platform refuses it (no permission, no provider).
    pub fn request_native_location<P: Platform>(&mut self, platform: &P) -> Option<u64> {
        self.next_request_id += 1;
        let id = self.next_request_id;

        match platform.request_location_updates(id, &LocationRequest::single_accurate_fix()) {
            Ok(()) => {
                log::debug!("[Bridge] Location request {} issued", id);
                self.active_requests.insert(id);
                Some(id)
            }
            Err(e) => {
                log::info!("[Bridge] requestNativeLocation declined: {}", e);
                None
            }
        }
    }

    /// Deliver the result of request `id`. Returns whether page script was called.
    pub fn on_location_result<P: Platform>(&mut self, platform: &P, id: u64, fix: Option<LocationFix>) -> bool {
        if !self.active_requests.remove(&id) {
            log::debug!("[Bridge] Dropping result for retired location request {}", id);
            return false;
        }
        platform.remove_location_updates(id);

        let Some(fix) = fix else {
            log::info!("[Bridge] Location request {} finished without a fix", id);
            return false;
        };

        let script = match init_script::location_update_script(&fix) {
            Ok(script) => script,
            Err(e) => {
                log::warn!("[Bridge] Failed to serialize location fix: {}", e);
                return false;
            }
        };
        if let Err(e) = platform.evaluate_script(&script) {
            log::warn!("[Bridge] Failed to deliver location fix: {}", e);
            return false;
        }
        true
    }

    /// Apply an already validated bar style. UI failures are logged only; the
    /// caller was told `true` when the color parsed.
    pub fn apply_status_bar<P: Platform>(&self, platform: &P, style: BarStyle) {
        if let Err(e) = platform.apply_bar_style(style) {
            log::error!("[Bridge] Failed to update system bars to {}: {}", style.color, e);
        }
    }

    pub fn open_settings<P: Platform>(&self, platform: &P) {
        if let Err(e) = platform.open_app_settings() {
            log::warn!("[Bridge] Failed to open app settings: {}", e);
        }
    }

    /// Retire every outstanding request (host teardown).
    pub fn cancel_all<P: Platform>(&mut self, platform: &P) {
        for id in self.active_requests.drain() {
            platform.remove_location_updates(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::{Call, FakePlatform};

    fn fix() -> LocationFix {
        LocationFix {
            lat: 38.7,
            lng: -9.1,
            accuracy: 8.0,
            timestamp: 1_760_000_000_000,
        }
    }

    #[test]
    fn test_parse_status_bar() {
        let style = parse_status_bar(true, "#1E88E5").unwrap();
        assert_eq!(style.color.argb(), 0xFF1E88E5);
        assert!(!style.light_foreground);
        assert!(parse_status_bar(false, "white").unwrap().light_foreground);
        assert!(parse_status_bar(false, "#XYZXYZ").is_none());
        assert!(parse_status_bar(true, "").is_none());
    }

    #[test]
    fn test_location_request_parameters() {
        let platform = FakePlatform::default();
        let mut bridge = DeviceBridge::new();
        let id = bridge.request_native_location(&platform).unwrap();

        match &platform.calls()[0] {
            Call::RequestLocation(request_id, request) => {
                assert_eq!(*request_id, id);
                assert!(request.high_accuracy);
                assert!(request.wait_for_accurate_location);
                assert_eq!(request.max_updates, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_single_fix_is_delivered_once() {
        let platform = FakePlatform::default();
        let mut bridge = DeviceBridge::new();
        let id = bridge.request_native_location(&platform).unwrap();

        assert!(bridge.on_location_result(&platform, id, Some(fix())));
        assert!(!bridge.on_location_result(&platform, id, Some(fix())));

        let scripts = platform.scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].starts_with("window.onNativeLocationUpdate({\"lat\":38.7,"));
        assert_eq!(platform.count(|c| *c == Call::RemoveLocation(id)), 1);
        assert_eq!(bridge.active_requests(), 0);
    }

    #[test]
    fn test_declines_silently_without_location() {
        let platform = FakePlatform::default();
        platform.location_available.set(false);
        let mut bridge = DeviceBridge::new();

        assert_eq!(bridge.request_native_location(&platform), None);
        assert!(platform.scripts().is_empty());
        assert_eq!(bridge.active_requests(), 0);
    }

    #[test]
    fn test_empty_result_retires_request() {
        let platform = FakePlatform::default();
        let mut bridge = DeviceBridge::new();
        let id = bridge.request_native_location(&platform).unwrap();

        assert!(!bridge.on_location_result(&platform, id, None));
        assert!(platform.scripts().is_empty());
        assert_eq!(platform.count(|c| *c == Call::RemoveLocation(id)), 1);
        assert!(!bridge.on_location_result(&platform, id, Some(fix())));
    }

    #[test]
    fn test_concurrent_requests_are_independent() {
        let platform = FakePlatform::default();
        let mut bridge = DeviceBridge::new();
        let first = bridge.request_native_location(&platform).unwrap();
        let second = bridge.request_native_location(&platform).unwrap();
        assert_ne!(first, second);

        assert!(bridge.on_location_result(&platform, second, Some(fix())));
        assert!(bridge.on_location_result(&platform, first, Some(fix())));
        assert_eq!(platform.scripts().len(), 2);
    }

    #[test]
    fn test_status_bar_failure_is_swallowed() {
        let platform = FakePlatform::default();
        platform.ui_fails.set(true);
        let bridge = DeviceBridge::new();
        bridge.apply_status_bar(&platform, parse_status_bar(true, "#000000").unwrap());
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let platform = FakePlatform::default();
        let mut bridge = DeviceBridge::new();
        bridge.request_native_location(&platform);
        bridge.request_native_location(&platform);
        platform.clear();

        bridge.cancel_all(&platform);
        assert_eq!(platform.count(|c| matches!(c, Call::RemoveLocation(_))), 2);
        assert_eq!(bridge.active_requests(), 0);
    }
}

//! Seams between the shell and the OS.
//!
//! The shell drives the embedded browser, the system UI and device services only
//! through these traits. Every method is called on the UI-bound thread; an
//! implementation may assume it owns the view hierarchy for the duration of the call.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{
    BarStyle, BrowserSettings, CaptureTarget, ChooserIntent, LocationRequest, Permission, ProviderStatus,
};

/// The browser's pending file-input callback.
pub trait FileChooserCallback: Send {
    /// `None` cancels the input; `Some` selects the given URIs.
    fn resolve(self: Box<Self>, uris: Option<Vec<String>>);
}

/// The browser's pending geolocation prompt.
pub trait GeolocationCallback: Send {
    fn invoke(self: Box<Self>, origin: &str, allow: bool, retain: bool);
}

/// The embedded browser view
pub trait WebContent {
    fn configure(&self, settings: &BrowserSettings) -> Result<()>;
    fn load_url(&self, url: &str) -> Result<()>;
    fn reload(&self) -> Result<()>;
    fn evaluate_script(&self, script: &str) -> Result<()>;
    fn can_go_back(&self) -> bool;
    fn go_back(&self) -> Result<()>;
}

/// System chrome, dialogs and OS screens
pub trait SystemUi {
    fn apply_bar_style(&self, style: BarStyle) -> Result<()>;
    fn open_app_settings(&self) -> Result<()>;
    fn open_location_source_settings(&self) -> Result<()>;
    /// Modal offering to open location settings; the answer comes back as
    /// `ShellEvent::LocationServicesAnswer`.
    fn show_location_services_prompt(&self) -> Result<()>;
    fn set_offline_overlay(&self, visible: bool) -> Result<()>;
    /// Hand the back action to the platform default (closes the shell).
    fn default_back(&self) -> Result<()>;
}

/// Permissions, location, connectivity and content pickers
pub trait DeviceServices {
    fn has_permission(&self, permission: Permission) -> bool;
    /// Results come back as `ShellEvent::PermissionsResult`.
    fn request_permissions(&self, permissions: &[Permission]) -> Result<()>;

    /// Fixes come back as `ShellEvent::LocationResult` tagged with `id`.
    fn request_location_updates(&self, id: u64, request: &LocationRequest) -> Result<()>;
    fn remove_location_updates(&self, id: u64);
    fn location_providers(&self) -> ProviderStatus;

    fn is_network_reachable(&self) -> bool;
    /// Changes come back as `ShellEvent::ReachabilityChanged`.
    fn watch_network(&self) -> Result<()>;
    fn unwatch_network(&self);

    fn has_camera_handler(&self) -> bool;
    fn create_capture_target(&self) -> Result<CaptureTarget>;
    fn discard_capture_target(&self, target: &CaptureTarget);
    /// Result comes back as `ShellEvent::FileChooserResult`.
    fn launch_file_chooser(&self, intent: &ChooserIntent) -> Result<()>;
}

pub trait Platform: WebContent + SystemUi + DeviceServices {}

impl<T: WebContent + SystemUi + DeviceServices> Platform for T {}

/// Unique file name for a camera capture: `JPEG_<utc timestamp>_<random>.jpg`.
pub fn capture_file_name(now: DateTime<Utc>) -> String {
    format!("JPEG_{}_{:06}.jpg", now.format("%Y%m%d_%H%M%S"), rand::random_range(0..1_000_000u32))
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_capture_file_name() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).unwrap();
        let name = capture_file_name(now);
        assert!(name.starts_with("JPEG_20260309_140507_"), "{}", name);
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), "JPEG_20260309_140507_000000.jpg".len());
    }
}

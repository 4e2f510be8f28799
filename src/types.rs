//! Core data types for the shell
//!
//! This module contains the transient values passed between the shell and the platform:
//! - Location fixes and the single-shot location request
//! - OS permissions tracked by the permission coordinator
//! - System bar styling and browser settings
//! - File chooser requests and results

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// A single location sample, forwarded to page script as JSON
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: f32,
    /// UTC time of the fix in milliseconds since the epoch
    pub timestamp: i64,
}

/// Parameters handed to the platform location service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocationRequest {
    /// GPS-grade accuracy rather than balanced power
    pub high_accuracy: bool,
    pub interval_ms: u64,
    pub wait_for_accurate_location: bool,
    pub max_updates: u32,
}

impl LocationRequest {
    /// One high-accuracy fix, waiting for an accurate sample rather than a cached one.
    pub fn single_accurate_fix() -> Self {
        Self {
            high_accuracy: true,
            interval_ms: 0,
            wait_for_accurate_location: true,
            max_updates: 1,
        }
    }
}

/// OS permissions the shell asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Permission {
    FineLocation,
    Camera,
}

impl Permission {
    /// Everything requested on foreground start.
    pub const ALL: [Permission; 2] = [Permission::FineLocation, Permission::Camera];

    pub fn android_name(self) -> &'static str {
        match self {
            Permission::FineLocation => "android.permission.ACCESS_FINE_LOCATION",
            Permission::Camera => "android.permission.CAMERA",
        }
    }

    pub fn from_android_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.android_name() == name)
    }
}

/// Colors and icon contrast applied to both the status bar and the navigation bar
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarStyle {
    pub color: Color,
    /// Dark icons on a light bar
    pub light_foreground: bool,
}

impl BarStyle {
    pub fn for_theme(color: Color, is_dark_mode: bool) -> Self {
        Self {
            color,
            light_foreground: !is_dark_mode,
        }
    }
}

/// Capabilities enabled on the embedded browser
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserSettings {
    pub javascript: bool,
    pub dom_storage: bool,
    pub file_access: bool,
    pub content_access: bool,
    pub geolocation: bool,
    pub web_contents_debugging: bool,
}

impl BrowserSettings {
    pub fn for_hosted_app(debuggable: bool) -> Self {
        Self {
            javascript: true,
            dom_storage: true,
            file_access: true,
            content_access: true,
            geolocation: true,
            web_contents_debugging: debuggable,
        }
    }
}

/// What the page asked for when it opened a file input
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChooserParams {
    pub accept_types: Vec<String>,
    pub allow_multiple: bool,
}

/// Temporary file a camera app writes a capture into
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureTarget {
    pub path: PathBuf,
    /// URI handed to the camera and returned to the page
    pub uri: String,
}

/// The combined picker presented to the user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChooserIntent {
    pub accept_types: Vec<String>,
    pub allow_multiple: bool,
    pub capture: Option<CaptureTarget>,
}

/// What the picker activity returned
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChooserResult {
    pub confirmed: bool,
    pub uris: Vec<String>,
}

/// OS-level location provider switches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProviderStatus {
    pub gps: bool,
    pub network: bool,
}

impl ProviderStatus {
    pub fn any_enabled(self) -> bool {
        self.gps || self.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_fix_json_shape() {
        let fix = LocationFix {
            lat: 38.7223,
            lng: -9.1393,
            accuracy: 12.5,
            timestamp: 1_760_000_000_000,
        };
        let value = serde_json::to_value(fix).unwrap();
        assert_eq!(value["lat"], 38.7223);
        assert_eq!(value["lng"], -9.1393);
        assert_eq!(value["accuracy"], 12.5);
        assert_eq!(value["timestamp"], 1_760_000_000_000i64);
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_permission_names() {
        for permission in Permission::ALL {
            assert_eq!(Permission::from_android_name(permission.android_name()), Some(permission));
        }
        assert_eq!(Permission::from_android_name("android.permission.RECORD_AUDIO"), None);
    }

    #[test]
    fn test_bar_style_inverts_dark_mode() {
        let color = Color::from_argb(0xFF101010);
        assert!(!BarStyle::for_theme(color, true).light_foreground);
        assert!(BarStyle::for_theme(color, false).light_foreground);
    }
}

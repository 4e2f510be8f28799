//! Connectivity monitor and the location-services check.
//!
//! The offline overlay is visible exactly when the network is unreachable.
//! Recovering from an outage reloads the page once, since whatever loaded
//! during the outage is likely an error page; losing the network leaves the
//! page untouched.

use crate::platform::Platform;

#[derive(Default)]
pub struct ConnectivityMonitor {
    reachable: bool,
    watching: bool,
}

impl ConnectivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn start<P: Platform>(&mut self, platform: &P) {
        self.reachable = platform.is_network_reachable();
        log::info!("[Connectivity] Initial reachability: {}", self.reachable);
        set_overlay(platform, !self.reachable);

        if self.watching {
            return;
        }
        match platform.watch_network() {
            Ok(()) => self.watching = true,
            Err(e) => log::warn!("[Connectivity] Failed to watch network: {}", e),
        }
    }

    pub fn on_reachability_changed<P: Platform>(&mut self, platform: &P, reachable: bool) {
        if reachable == self.reachable {
            return;
        }
        self.reachable = reachable;

        if reachable {
            log::info!("[Connectivity] Network back, reloading");
            set_overlay(platform, false);
            if let Err(e) = platform.reload() {
                log::warn!("[Connectivity] Reload failed: {}", e);
            }
        } else {
            log::info!("[Connectivity] Network lost");
            set_overlay(platform, true);
        }
    }

    pub fn stop<P: Platform>(&mut self, platform: &P) {
        if self.watching {
            platform.unwatch_network();
            self.watching = false;
        }
    }
}

fn set_overlay<P: Platform>(platform: &P, visible: bool) {
    if let Err(e) = platform.set_offline_overlay(visible) {
        log::warn!("[Connectivity] Failed to toggle offline overlay: {}", e);
    }
}

/// Foreground check: prompt when every location provider is switched off at OS level.
/// Returns whether the prompt was shown.
pub fn check_location_services<P: Platform>(platform: &P) -> bool {
    if platform.location_providers().any_enabled() {
        return false;
    }
    log::info!("[Connectivity] Location services disabled, prompting");
    if let Err(e) = platform.show_location_services_prompt() {
        log::warn!("[Connectivity] Failed to show location services prompt: {}", e);
        return false;
    }
    true
}

pub fn on_location_services_answer<P: Platform>(platform: &P, open_settings: bool) {
    if !open_settings {
        return;
    }
    if let Err(e) = platform.open_location_source_settings() {
        log::warn!("[Connectivity] Failed to open location settings: {}", e);
    }
}

//! OS permission coordinator.
//!
//! Tracks fine location and camera through one request cycle per foreground
//! start: `Unrequested -> Pending -> Granted | Denied`. A permission that is
//! already pending is never requested twice; the eventual result is routed by
//! the shell to the waiting geolocation prompt and to page script.

use std::collections::HashMap;

use crate::platform::DeviceServices;
use crate::types::Permission;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Unrequested,
    Pending,
    Granted,
    Denied,
}

#[derive(Default)]
pub struct PermissionCoordinator {
    states: HashMap<Permission, PermissionState>,
}

impl PermissionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, permission: Permission) -> PermissionState {
        self.states
            .get(&permission)
            .copied()
            .unwrap_or(PermissionState::Unrequested)
    }

    /// Start a new request cycle: ask for every permission that is neither
    /// granted nor already pending. Returns what was requested.
    ///
    /// A pending request stays pending even if the OS already reports a grant,
    /// so its result still reaches the waiting prompt and page script.
    pub fn on_foreground_start<P: DeviceServices>(&mut self, platform: &P) -> Vec<Permission> {
        let mut missing = Vec::new();
        for permission in Permission::ALL {
            if self.state(permission) == PermissionState::Pending {
                continue;
            }
            if platform.has_permission(permission) {
                self.states.insert(permission, PermissionState::Granted);
            } else {
                self.states.insert(permission, PermissionState::Unrequested);
                missing.push(permission);
            }
        }
        self.request(platform, missing)
    }

    /// Ask for fine location on behalf of a geolocation prompt. Returns `false`
    /// when a request is already in flight.
    pub fn request_location<P: DeviceServices>(&mut self, platform: &P) -> bool {
        if self.state(Permission::FineLocation) == PermissionState::Pending {
            return false;
        }
        !self.request(platform, vec![Permission::FineLocation]).is_empty()
    }

    fn request<P: DeviceServices>(&mut self, platform: &P, permissions: Vec<Permission>) -> Vec<Permission> {
        if permissions.is_empty() {
            return permissions;
        }
        match platform.request_permissions(&permissions) {
            Ok(()) => {
                log::info!("[Permissions] Requested {:?}", permissions);
                for permission in &permissions {
                    self.states.insert(*permission, PermissionState::Pending);
                }
                permissions
            }
            Err(e) => {
                log::warn!("[Permissions] Failed to request {:?}: {}", permissions, e);
                Vec::new()
            }
        }
    }

    /// Record the user's decision. An empty result (dialog dismissed) denies
    /// everything pending. Returns the fine location outcome if it was decided.
    pub fn on_result(&mut self, results: &[(Permission, bool)]) -> Option<bool> {
        let decided: Vec<(Permission, bool)> = if results.is_empty() {
            Permission::ALL
                .into_iter()
                .filter(|p| self.state(*p) == PermissionState::Pending)
                .map(|p| (p, false))
                .collect()
        } else {
            results.to_vec()
        };

        let mut location = None;
        for (permission, granted) in decided {
            if self.state(permission) != PermissionState::Pending {
                log::debug!("[Permissions] Ignoring unrequested result for {:?}", permission);
                continue;
            }
            let state = if granted {
                PermissionState::Granted
            } else {
                PermissionState::Denied
            };
            log::info!("[Permissions] {:?} -> {:?}", permission, state);
            self.states.insert(permission, state);
            if permission == Permission::FineLocation {
                location = Some(granted);
            }
        }
        location
    }
}

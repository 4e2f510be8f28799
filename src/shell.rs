//! Single-threaded dispatch point.
//!
//! Platform callbacks arrive on whatever thread the OS uses (location, network,
//! IPC from page script). They are turned into [`ShellEvent`]s and sent through a
//! [`ShellHandle`]; the handle's waker asks the platform to run [`Shell::drain`]
//! on the UI-bound thread, which is the only place shell state is touched.
//!
//! Architecture: platform thread -> ShellHandle -> queue -> UI thread -> Shell

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::bridge::{self, DeviceBridge};
use crate::config::ShellConfig;
use crate::connectivity::{self, ConnectivityMonitor};
use crate::host::{BrowserHost, GeolocationPrompt};
use crate::init_script;
use crate::permissions::{PermissionCoordinator, PermissionState};
use crate::platform::{FileChooserCallback, GeolocationCallback, Platform};
use crate::types::{BarStyle, ChooserParams, ChooserResult, LocationFix, Permission};

/// Everything that can happen to the shell
pub enum ShellEvent {
    /// Host screen created; `deep_link` is the URI the activity was opened with
    Created {
        deep_link: Option<String>,
        language: String,
    },
    /// App came to the foreground
    Started,
    Resumed,
    Destroyed,

    PageStarted { url: String },
    PageFinished { url: String },
    BackPressed,

    FileChooserResult(ChooserResult),
    GeolocationPrompt {
        origin: String,
        callback: Box<dyn GeolocationCallback>,
    },
    PermissionsResult(Vec<(Permission, bool)>),
    LocationServicesAnswer { open_settings: bool },
    ReachabilityChanged(bool),

    /// Bridge calls from page script
    RequestLocation,
    LocationResult {
        request_id: u64,
        fix: Option<LocationFix>,
    },
    ApplyStatusBar(BarStyle),
    OpenSettings,
}

impl ShellEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ShellEvent::Created { .. } => "Created",
            ShellEvent::Started => "Started",
            ShellEvent::Resumed => "Resumed",
            ShellEvent::Destroyed => "Destroyed",
            ShellEvent::PageStarted { .. } => "PageStarted",
            ShellEvent::PageFinished { .. } => "PageFinished",
            ShellEvent::BackPressed => "BackPressed",
            ShellEvent::FileChooserResult(_) => "FileChooserResult",
            ShellEvent::GeolocationPrompt { .. } => "GeolocationPrompt",
            ShellEvent::PermissionsResult(_) => "PermissionsResult",
            ShellEvent::LocationServicesAnswer { .. } => "LocationServicesAnswer",
            ShellEvent::ReachabilityChanged(_) => "ReachabilityChanged",
            ShellEvent::RequestLocation => "RequestLocation",
            ShellEvent::LocationResult { .. } => "LocationResult",
            ShellEvent::ApplyStatusBar(_) => "ApplyStatusBar",
            ShellEvent::OpenSettings => "OpenSettings",
        }
    }
}

/// Schedules a drain on the UI thread.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Thread-safe entry point into the shell
#[derive(Clone)]
pub struct ShellHandle {
    sender: mpsc::UnboundedSender<ShellEvent>,
    waker: Waker,
}

impl ShellHandle {
    /// Queue an event from any thread. Returns `false` once the shell is gone.
    pub fn send(&self, event: ShellEvent) -> bool {
        let name = event.name();
        if self.sender.send(event).is_err() {
            log::debug!("[Shell] Dropping {} after shutdown", name);
            return false;
        }
        (self.waker)();
        true
    }

    pub fn request_native_location(&self) {
        self.send(ShellEvent::RequestLocation);
    }

    /// `updateStatusBar`: validation happens here, synchronously, so the caller
    /// learns about a bad color; the mutation itself is queued for the UI thread.
    pub fn update_status_bar(&self, is_dark_mode: bool, hex_color: &str) -> bool {
        match bridge::parse_status_bar(is_dark_mode, hex_color) {
            Some(style) => {
                self.send(ShellEvent::ApplyStatusBar(style));
                true
            }
            None => false,
        }
    }

    pub fn open_settings(&self) {
        self.send(ShellEvent::OpenSettings);
    }
}

pub struct Shell<P: Platform> {
    platform: P,
    host: BrowserHost,
    bridge: DeviceBridge,
    permissions: PermissionCoordinator,
    connectivity: ConnectivityMonitor,
    events: mpsc::UnboundedReceiver<ShellEvent>,
    destroyed: bool,
}

impl<P: Platform> Shell<P> {
    pub fn new(platform: P, config: ShellConfig, waker: Waker) -> (Self, ShellHandle) {
        let (sender, events) = mpsc::unbounded_channel();
        let shell = Self {
            platform,
            host: BrowserHost::new(config),
            bridge: DeviceBridge::new(),
            permissions: PermissionCoordinator::new(),
            connectivity: ConnectivityMonitor::new(),
            events,
            destroyed: false,
        };
        (shell, ShellHandle { sender, waker })
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn host(&self) -> &BrowserHost {
        &self.host
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    /// Torn down: a new shell has to be installed for the next hosting screen.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Process everything queued so far. Returns the number of events handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// File input from the browser, answered synchronously on the UI thread.
    pub fn show_file_chooser(&mut self, params: ChooserParams, callback: Box<dyn FileChooserCallback>) -> bool {
        if self.destroyed {
            callback.resolve(None);
            return false;
        }
        self.host.on_show_file_chooser(&self.platform, params, callback)
    }

    pub fn handle(&mut self, event: ShellEvent) {
        if self.destroyed {
            reject(event);
            return;
        }
        log::trace!("[Shell] {}", event.name());

        match event {
            ShellEvent::Created { deep_link, language } => {
                self.host.start(&self.platform, deep_link.as_deref(), &language);
                self.connectivity.start(&self.platform);
            }
            ShellEvent::Started => {
                self.permissions.on_foreground_start(&self.platform);
            }
            ShellEvent::Resumed => {
                connectivity::check_location_services(&self.platform);
            }
            ShellEvent::Destroyed => self.teardown(),

            ShellEvent::PageStarted { url } => self.host.on_page_started(&self.platform, &url),
            ShellEvent::PageFinished { url } => self.host.on_page_finished(&self.platform, &url),
            ShellEvent::BackPressed => self.host.on_back_pressed(&self.platform),

            ShellEvent::FileChooserResult(result) => self.host.on_file_chooser_result(&self.platform, result),
            ShellEvent::GeolocationPrompt { origin, callback } => {
                let prompt = self.host.on_geolocation_prompt(&self.platform, origin, callback);
                if prompt == GeolocationPrompt::AwaitingPermission {
                    self.await_location_permission();
                }
            }
            ShellEvent::PermissionsResult(results) => self.on_permissions_result(&results),
            ShellEvent::LocationServicesAnswer { open_settings } => {
                connectivity::on_location_services_answer(&self.platform, open_settings);
            }
            ShellEvent::ReachabilityChanged(reachable) => {
                self.connectivity.on_reachability_changed(&self.platform, reachable);
            }

            ShellEvent::RequestLocation => {
                self.bridge.request_native_location(&self.platform);
            }
            ShellEvent::LocationResult { request_id, fix } => {
                self.bridge.on_location_result(&self.platform, request_id, fix);
            }
            ShellEvent::ApplyStatusBar(style) => self.bridge.apply_status_bar(&self.platform, style),
            ShellEvent::OpenSettings => self.bridge.open_settings(&self.platform),
        }
    }

    /// Ask for location on behalf of the waiting prompt. When no request ends up
    /// in flight the prompt is answered now from the current OS state.
    fn await_location_permission(&mut self) {
        self.permissions.request_location(&self.platform);
        if self.permissions.state(Permission::FineLocation) != PermissionState::Pending {
            let granted = self.platform.has_permission(Permission::FineLocation);
            log::info!("[Shell] No location request in flight, answering prompt: {}", granted);
            self.host.resolve_geolocation(granted);
        }
    }

    fn on_permissions_result(&mut self, results: &[(Permission, bool)]) {
        let Some(granted) = self.permissions.on_result(results) else {
            return;
        };
        self.host.resolve_geolocation(granted);

        let script = init_script::permission_event_script(granted);
        if let Err(e) = self.platform.evaluate_script(&script) {
            log::warn!("[Shell] Failed to dispatch permission event: {}", e);
        }
    }

    fn teardown(&mut self) {
        log::info!("[Shell] Tearing down");
        self.destroyed = true;
        self.connectivity.stop(&self.platform);
        self.bridge.cancel_all(&self.platform);
        self.host.cancel_pending(&self.platform);
        self.events.close();
    }
}

/// Answer an event no shell can handle (not installed yet, or torn down):
/// browser callbacks resolve empty/denied instead of dangling.
pub fn reject(event: ShellEvent) {
    match event {
        ShellEvent::GeolocationPrompt { origin, callback } => callback.invoke(&origin, false, false),
        other => log::debug!("[Shell] Ignoring {} without a live shell", other.name()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::platform::testing::{Call, ChooserProbe, FakePlatform, GeolocationProbe};
    use crate::types::ProviderStatus;

    fn shell_with(platform: FakePlatform) -> (Shell<FakePlatform>, ShellHandle) {
        Shell::new(platform, ShellConfig::default(), Arc::new(|| {}))
    }

    fn created(platform: FakePlatform) -> (Shell<FakePlatform>, ShellHandle) {
        let (mut shell, handle) = shell_with(platform);
        shell.handle(ShellEvent::Created {
            deep_link: None,
            language: "es".to_string(),
        });
        shell.platform().clear();
        (shell, handle)
    }

    fn fix() -> LocationFix {
        LocationFix {
            lat: 40.4,
            lng: -3.7,
            accuracy: 5.0,
            timestamp: 1_760_000_000_000,
        }
    }

    #[test]
    fn test_handle_wakes_ui_thread() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let (mut shell, handle) = Shell::new(
            FakePlatform::default(),
            ShellConfig::default(),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        handle.open_settings();
        handle.request_native_location();
        assert_eq!(wakes.load(Ordering::SeqCst), 2);
        assert_eq!(shell.drain(), 2);
        assert_eq!(shell.platform().count(|c| *c == Call::OpenAppSettings), 1);
    }

    #[test]
    fn test_created_loads_locale_url_and_watches_network() {
        let (mut shell, _handle) = shell_with(FakePlatform::default());
        shell.handle(ShellEvent::Created {
            deep_link: None,
            language: "ja".to_string(),
        });
        let calls = shell.platform().calls();
        assert!(calls.contains(&Call::LoadUrl("https://local-app.getblips.app/en".to_string())));
        assert!(calls.contains(&Call::WatchNetwork));
        assert_eq!(shell.host().initial_url(), Some("https://local-app.getblips.app/en"));
    }

    #[test]
    fn test_invalid_color_changes_nothing() {
        let (mut shell, handle) = created(FakePlatform::default());
        for input in ["#12", "not-a-color", "#GG0000", "", "#1234567"] {
            assert!(!handle.update_status_bar(true, input));
        }
        assert_eq!(shell.drain(), 0);
        assert_eq!(shell.platform().count(|c| matches!(c, Call::BarStyle(_))), 0);
    }

    #[test]
    fn test_valid_color_applies_to_both_bars() {
        let (mut shell, handle) = created(FakePlatform::default());
        assert!(handle.update_status_bar(true, "#1E88E5"));
        assert!(handle.update_status_bar(false, "navy"));
        shell.drain();

        let styles: Vec<BarStyle> = shell
            .platform()
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::BarStyle(style) => Some(style),
                _ => None,
            })
            .collect();
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0].color.argb(), 0xFF1E88E5);
        assert!(!styles[0].light_foreground);
        assert_eq!(styles[1].color.argb(), 0xFF000080);
        assert!(styles[1].light_foreground);
    }

    #[test]
    fn test_status_bar_reports_true_when_ui_fails() {
        let platform = FakePlatform::default();
        platform.ui_fails.set(true);
        let (mut shell, handle) = created(platform);
        assert!(handle.update_status_bar(false, "#FFFFFF"));
        shell.drain();
        assert_eq!(shell.platform().count(|c| matches!(c, Call::BarStyle(_))), 0);
    }

    #[test]
    fn test_location_round_trip_is_single_shot() {
        let (mut shell, handle) = created(FakePlatform::default());
        handle.request_native_location();
        shell.drain();

        let id = shell
            .platform()
            .calls()
            .into_iter()
            .find_map(|c| match c {
                Call::RequestLocation(id, _) => Some(id),
                _ => None,
            })
            .unwrap();

        handle.send(ShellEvent::LocationResult {
            request_id: id,
            fix: Some(fix()),
        });
        handle.send(ShellEvent::LocationResult {
            request_id: id,
            fix: Some(fix()),
        });
        shell.drain();

        let updates: Vec<String> = shell
            .platform()
            .scripts()
            .into_iter()
            .filter(|s| s.starts_with("window.onNativeLocationUpdate("))
            .collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(shell.platform().count(|c| *c == Call::RemoveLocation(id)), 1);
    }

    #[test]
    fn test_second_chooser_request_resolves_first() {
        let (mut shell, _handle) = created(FakePlatform::default());
        let probe = ChooserProbe::default();

        assert!(shell.show_file_chooser(ChooserParams::default(), probe.callback(1)));
        assert!(shell.show_file_chooser(ChooserParams::default(), probe.callback(2)));
        assert_eq!(probe.results(), vec![(1, None)]);

        shell.handle(ShellEvent::FileChooserResult(ChooserResult {
            confirmed: true,
            uris: vec!["content://media/7".to_string()],
        }));
        assert_eq!(probe.results()[1], (2, Some(vec!["content://media/7".to_string()])));
    }

    #[test]
    fn test_reachability_transitions() {
        let platform = FakePlatform::default();
        platform.reachable.set(false);
        let (mut shell, handle) = created(platform);

        handle.send(ShellEvent::ReachabilityChanged(true));
        shell.drain();
        assert_eq!(shell.platform().calls(), vec![Call::Overlay(false), Call::Reload]);

        shell.platform().clear();
        handle.send(ShellEvent::ReachabilityChanged(false));
        shell.drain();
        assert_eq!(shell.platform().calls(), vec![Call::Overlay(true)]);
        assert!(!shell.connectivity().is_reachable());
    }

    #[test]
    fn test_denied_location_resolves_prompt_and_dispatches_once() {
        let (mut shell, handle) = created(FakePlatform::default());
        let geo = GeolocationProbe::default();

        shell.handle(ShellEvent::Started);
        handle.send(ShellEvent::GeolocationPrompt {
            origin: "https://local-app.getblips.app".to_string(),
            callback: geo.callback(),
        });
        shell.drain();
        // The foreground request already covers location
        assert_eq!(shell.platform().count(|c| matches!(c, Call::RequestPermissions(_))), 1);

        handle.send(ShellEvent::PermissionsResult(vec![
            (Permission::FineLocation, false),
            (Permission::Camera, true),
        ]));
        shell.drain();

        assert_eq!(geo.results(), vec![("https://local-app.getblips.app".to_string(), false, false)]);
        let denied = shell
            .platform()
            .scripts()
            .into_iter()
            .filter(|s| s.contains("android-permission-denied"))
            .count();
        assert_eq!(denied, 1);
        assert!(!shell.platform().scripts().iter().any(|s| s.contains("android-permission-granted")));
        assert!(!shell.host().has_pending_geolocation());
    }

    #[test]
    fn test_granted_location_resumes_prompt() {
        let (mut shell, _handle) = created(FakePlatform::default());
        let geo = GeolocationProbe::default();

        shell.handle(ShellEvent::GeolocationPrompt {
            origin: "https://local-app.getblips.app".to_string(),
            callback: geo.callback(),
        });
        assert_eq!(
            shell.platform().calls(),
            vec![Call::RequestPermissions(vec![Permission::FineLocation])]
        );

        shell.handle(ShellEvent::PermissionsResult(vec![(Permission::FineLocation, true)]));
        assert_eq!(geo.results(), vec![("https://local-app.getblips.app".to_string(), true, false)]);
        assert_eq!(
            shell.platform().scripts(),
            vec!["window.dispatchEvent(new Event('android-permission-granted'))".to_string()]
        );
    }

    #[test]
    fn test_prompt_answered_when_permission_request_fails() {
        let platform = FakePlatform::default();
        platform.permissions_fail.set(true);
        let (mut shell, _handle) = created(platform);
        let geo = GeolocationProbe::default();

        shell.handle(ShellEvent::GeolocationPrompt {
            origin: "https://local-app.getblips.app".to_string(),
            callback: geo.callback(),
        });
        assert_eq!(geo.results(), vec![("https://local-app.getblips.app".to_string(), false, false)]);
        assert!(!shell.host().has_pending_geolocation());
    }

    #[test]
    fn test_restart_before_permission_result_still_resumes_prompt() {
        let (mut shell, _handle) = created(FakePlatform::default());
        let geo = GeolocationProbe::default();

        shell.handle(ShellEvent::GeolocationPrompt {
            origin: "https://local-app.getblips.app".to_string(),
            callback: geo.callback(),
        });
        // User grants; the activity is restarted before onRequestPermissionsResult
        shell.platform().grant(Permission::FineLocation);
        shell.handle(ShellEvent::Started);
        shell.handle(ShellEvent::PermissionsResult(vec![(Permission::FineLocation, true)]));

        assert_eq!(geo.results(), vec![("https://local-app.getblips.app".to_string(), true, false)]);
        assert!(!shell.host().has_pending_geolocation());
        assert_eq!(
            shell
                .platform()
                .scripts()
                .iter()
                .filter(|s| s.contains("android-permission-granted"))
                .count(),
            1
        );
    }

    #[test]
    fn test_replacement_shell_after_teardown() {
        let (mut old, old_handle) = created(FakePlatform::default());
        old.handle(ShellEvent::Destroyed);
        assert!(old.is_destroyed());
        assert!(!old_handle.send(ShellEvent::OpenSettings));

        // A re-created hosting screen gets a fresh shell with a live queue
        let (mut shell, handle) = created(FakePlatform::default());
        assert!(!shell.is_destroyed());
        assert!(handle.send(ShellEvent::OpenSettings));
        assert_eq!(shell.drain(), 1);
        assert_eq!(shell.platform().count(|c| *c == Call::OpenAppSettings), 1);
    }

    #[test]
    fn test_page_finished_and_resume() {
        let platform = FakePlatform::default();
        platform.providers.set(ProviderStatus::default());
        let (mut shell, _handle) = created(platform);

        shell.handle(ShellEvent::PageFinished {
            url: "https://local-app.getblips.app/es".to_string(),
        });
        shell.handle(ShellEvent::Resumed);
        shell.handle(ShellEvent::LocationServicesAnswer { open_settings: true });

        assert_eq!(
            shell.platform().calls(),
            vec![
                Call::Eval("window.dispatchEvent(new Event('android-bridge-ready'))".to_string()),
                Call::LocationServicesPrompt,
                Call::OpenLocationSettings,
            ]
        );
    }

    #[test]
    fn test_teardown_resolves_everything() {
        let (mut shell, handle) = created(FakePlatform::default());
        let chooser = ChooserProbe::default();
        let geo = GeolocationProbe::default();

        shell.show_file_chooser(ChooserParams::default(), chooser.callback(1));
        shell.handle(ShellEvent::GeolocationPrompt {
            origin: "https://local-app.getblips.app".to_string(),
            callback: geo.callback(),
        });
        shell.handle(ShellEvent::RequestLocation);
        shell.handle(ShellEvent::Destroyed);

        assert_eq!(chooser.results(), vec![(1, None)]);
        assert_eq!(geo.results().len(), 1);
        assert_eq!(shell.platform().count(|c| *c == Call::UnwatchNetwork), 1);
        assert_eq!(shell.platform().count(|c| matches!(c, Call::RemoveLocation(_))), 1);

        // Requests arriving afterwards are answered immediately
        let late = ChooserProbe::default();
        assert!(!shell.show_file_chooser(ChooserParams::default(), late.callback(9)));
        assert_eq!(late.results(), vec![(9, None)]);
        assert!(!handle.send(ShellEvent::OpenSettings));
    }
}

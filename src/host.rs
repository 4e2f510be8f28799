//! Browser host controller.
//!
//! Owns the embedded browser's setup and the two single-slot pending requests the
//! browser can have in flight: a file-input selection and a geolocation prompt.
//! A pending request is always resolved before it is replaced or dropped.

use crate::config::ShellConfig;
use crate::init_script;
use crate::locale;
use crate::platform::{FileChooserCallback, GeolocationCallback, Platform};
use crate::types::{BrowserSettings, CaptureTarget, ChooserIntent, ChooserParams, ChooserResult, Permission};

/// An open file input waiting for the picker activity.
pub struct PendingFileSelection {
    callback: Box<dyn FileChooserCallback>,
    capture: Option<CaptureTarget>,
    allow_multiple: bool,
}

impl PendingFileSelection {
    fn resolve<P: Platform>(self, platform: &P, result: ChooserResult) {
        let Self {
            callback,
            capture,
            allow_multiple,
        } = self;

        // No picked documents on a confirmed result means the camera wrote the capture file
        let (selection, captured) = match (&capture, result.confirmed, result.uris.is_empty()) {
            (_, false, _) => (None, false),
            (_, true, false) => (Some(result.uris), false),
            (Some(target), true, true) => (Some(vec![target.uri.clone()]), true),
            (None, true, true) => (Some(Vec::new()), false),
        };

        if let (Some(target), false) = (&capture, captured) {
            platform.discard_capture_target(target);
        }
        log::debug!(
            "[Host] File selection resolved with {} item(s) (multiple: {})",
            selection.as_ref().map(Vec::len).unwrap_or(0),
            allow_multiple
        );
        callback.resolve(selection);
    }

    fn cancel<P: Platform>(self, platform: &P) {
        self.resolve(platform, ChooserResult::default());
    }
}

/// A browser geolocation prompt waiting for the OS permission decision.
pub struct PendingGeolocationConsent {
    origin: String,
    callback: Box<dyn GeolocationCallback>,
}

impl PendingGeolocationConsent {
    fn resolve(self, allow: bool) {
        log::debug!("[Host] Geolocation for {} resolved: {}", self.origin, allow);
        // Decisions are never remembered by the browser; the OS permission is the source of truth
        self.callback.invoke(&self.origin, allow, false);
    }
}

/// Outcome of a geolocation prompt from page script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationPrompt {
    Allowed,
    AwaitingPermission,
}

pub struct BrowserHost {
    config: ShellConfig,
    initial_url: Option<String>,
    current_url: Option<String>,
    pending_file: Option<PendingFileSelection>,
    pending_geolocation: Option<PendingGeolocationConsent>,
    back_enabled: bool,
}

impl BrowserHost {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            config,
            initial_url: None,
            current_url: None,
            pending_file: None,
            pending_geolocation: None,
            back_enabled: true,
        }
    }

    pub fn initial_url(&self) -> Option<&str> {
        self.initial_url.as_deref()
    }

    pub fn has_pending_file_selection(&self) -> bool {
        self.pending_file.is_some()
    }

    pub fn has_pending_geolocation(&self) -> bool {
        self.pending_geolocation.is_some()
    }

    /// Configure the browser and load the initial page. Runs once; later calls
    /// keep the URL chosen the first time.
    pub fn start<P: Platform>(&mut self, platform: &P, deep_link: Option<&str>, language: &str) {
        if let Some(url) = &self.initial_url {
            log::debug!("[Host] Already started with {}", url);
            return;
        }

        let settings = BrowserSettings::for_hosted_app(self.config.debugging_enabled());
        if let Err(e) = platform.configure(&settings) {
            log::warn!("[Host] Failed to configure browser: {}", e);
        }

        let url = locale::initial_url(&self.config, deep_link, language);
        log::info!("[Host] Loading {} (deep link: {})", url, deep_link.is_some());
        if let Err(e) = platform.load_url(&url) {
            log::error!("[Host] Failed to load {}: {}", url, e);
        }
        self.initial_url = Some(url);
    }

    /// A new document started loading. Requests the previous document opened
    /// can no longer be answered, so they resolve empty/denied.
    pub fn on_page_started<P: Platform>(&mut self, platform: &P, url: &str) {
        if self.current_url.as_deref() != Some(url) {
            self.cancel_pending(platform);
        }
        self.current_url = Some(url.to_string());
    }

    pub fn on_page_finished<P: Platform>(&mut self, platform: &P, url: &str) {
        log::debug!("[Host] Page finished: {}", url);
        let script = init_script::dispatch_event_script(init_script::BRIDGE_READY_EVENT);
        if let Err(e) = platform.evaluate_script(&script) {
            log::warn!("[Host] Failed to signal bridge ready: {}", e);
        }
    }

    /// Page content opened a file input. Returns whether the shell handled it;
    /// `false` lets the browser fall back to its default behavior.
    pub fn on_show_file_chooser<P: Platform>(
        &mut self,
        platform: &P,
        params: ChooserParams,
        callback: Box<dyn FileChooserCallback>,
    ) -> bool {
        if let Some(previous) = self.pending_file.take() {
            log::debug!("[Host] Superseding unresolved file selection");
            previous.cancel(platform);
        }

        let capture = if platform.has_camera_handler() {
            match platform.create_capture_target() {
                Ok(target) => Some(target),
                Err(e) => {
                    log::warn!("[Host] Camera capture unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let intent = ChooserIntent {
            accept_types: params.accept_types,
            allow_multiple: true,
            capture: capture.clone(),
        };

        match platform.launch_file_chooser(&intent) {
            Ok(()) => {
                self.pending_file = Some(PendingFileSelection {
                    callback,
                    capture,
                    allow_multiple: intent.allow_multiple,
                });
                true
            }
            Err(e) => {
                log::info!("[Host] File chooser not handled: {}", e);
                if let Some(capture) = &capture {
                    platform.discard_capture_target(capture);
                }
                callback.resolve(None);
                false
            }
        }
    }

    pub fn on_file_chooser_result<P: Platform>(&mut self, platform: &P, result: ChooserResult) {
        match self.pending_file.take() {
            Some(pending) => pending.resolve(platform, result),
            None => log::debug!("[Host] File chooser result with nothing pending"),
        }
    }

    pub fn on_geolocation_prompt<P: Platform>(
        &mut self,
        platform: &P,
        origin: String,
        callback: Box<dyn GeolocationCallback>,
    ) -> GeolocationPrompt {
        if platform.has_permission(Permission::FineLocation) {
            callback.invoke(&origin, true, false);
            return GeolocationPrompt::Allowed;
        }

        let pending = PendingGeolocationConsent { origin, callback };
        if let Some(previous) = self.pending_geolocation.replace(pending) {
            log::debug!("[Host] Superseding geolocation prompt from {}", previous.origin);
            previous.resolve(false);
        }
        GeolocationPrompt::AwaitingPermission
    }

    /// Resume the waiting geolocation prompt, if any. Returns whether one was waiting.
    pub fn resolve_geolocation(&mut self, granted: bool) -> bool {
        match self.pending_geolocation.take() {
            Some(pending) => {
                pending.resolve(granted);
                true
            }
            None => false,
        }
    }

    pub fn on_back_pressed<P: Platform>(&mut self, platform: &P) {
        if self.back_enabled && platform.can_go_back() {
            if let Err(e) = platform.go_back() {
                log::warn!("[Host] Back navigation failed: {}", e);
            }
            return;
        }

        self.back_enabled = false;
        if let Err(e) = platform.default_back() {
            log::warn!("[Host] Default back action failed: {}", e);
        }
    }

    pub fn cancel_pending<P: Platform>(&mut self, platform: &P) {
        if let Some(pending) = self.pending_file.take() {
            pending.cancel(platform);
        }
        self.resolve_geolocation(false);
    }
}

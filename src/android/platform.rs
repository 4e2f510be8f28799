//! `Platform` implementation over the hosting activity and its WebView.
//!
//! All calls run on the Android UI thread (the shell is only ever touched from
//! there), so view and window mutations go straight through JNI.
//!
//! Framework APIs are called directly. Services that deliver results through
//! Java listener objects (fused location, network callback, activity results)
//! are owned by `MainActivity` and reached through its helper methods:
//!
//! - `requestSingleLocation(JIJZI)V` / `removeLocationRequest(J)V`
//! - `watchNetwork()V` / `unwatchNetwork()V`
//! - `launchFileChooser([Ljava/lang/String;ZLjava/lang/String;)V`
//! - `setOfflineOverlayVisible(Z)V`
//! - `dispatchDefaultBack()V`

#![cfg(target_os = "android")]

use std::path::PathBuf;

use jni::objects::{GlobalRef, JObject, JValue};
use jni::JNIEnv;
use tauri::{AppHandle, Manager, Wry};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

use super::jni_util::{self, find_app_class};
use crate::error::{Result, ShellError};
use crate::platform::{self, DeviceServices, SystemUi, WebContent};
use crate::shell::ShellEvent;
use crate::types::{
    BarStyle, BrowserSettings, CaptureTarget, ChooserIntent, LocationRequest, Permission,
    ProviderStatus,
};

const PERMISSION_REQUEST_CODE: i32 = 1;
const PERMISSION_GRANTED: i32 = 0;
const NET_CAPABILITY_INTERNET: i32 = 12;
const PRIORITY_HIGH_ACCURACY: i32 = 100;
const PRIORITY_BALANCED_POWER_ACCURACY: i32 = 102;

pub struct AndroidPlatform {
    app: AppHandle<Wry>,
    activity: GlobalRef,
    webview: GlobalRef,
}

impl AndroidPlatform {
    pub fn new(app: AppHandle<Wry>, activity: GlobalRef, webview: GlobalRef) -> Self {
        Self { app, activity, webview }
    }

    fn activity(&self) -> &JObject<'static> {
        self.activity.as_obj()
    }

    fn webview(&self) -> &JObject<'static> {
        self.webview.as_obj()
    }

    fn start_activity(&self, env: &mut JNIEnv, intent: &JObject) -> jni::errors::Result<()> {
        env.call_method(self.activity(), "startActivity", "(Landroid/content/Intent;)V", &[intent.into()])?;
        Ok(())
    }

    fn system_service<'a>(&self, env: &mut JNIEnv<'a>, name: &str) -> jni::errors::Result<JObject<'a>> {
        let name = env.new_string(name)?;
        env.call_method(
            self.activity(),
            "getSystemService",
            "(Ljava/lang/String;)Ljava/lang/Object;",
            &[(&name).into()],
        )?
        .l()
    }

    fn call_activity_helper(&self, name: &str, sig: &str, args: &[JValue]) -> Result<()> {
        jni_util::with_env(|env| {
            env.call_method(self.activity(), name, sig, args)?;
            Ok(())
        })
    }

    fn query(&self, what: &str, f: impl FnOnce(&mut JNIEnv) -> jni::errors::Result<bool>) -> bool {
        jni_util::with_env(f).unwrap_or_else(|e| {
            log::warn!("[Android] {} query failed: {}", what, e);
            false
        })
    }
}

fn set_flag(env: &mut JNIEnv, target: &JObject, setter: &str, value: bool) -> jni::errors::Result<()> {
    env.call_method(target, setter, "(Z)V", &[JValue::Bool(value as u8)])?;
    Ok(())
}

impl WebContent for AndroidPlatform {
    fn configure(&self, settings: &BrowserSettings) -> Result<()> {
        jni_util::with_env(|env| {
            let ws = env
                .call_method(self.webview(), "getSettings", "()Landroid/webkit/WebSettings;", &[])?
                .l()?;
            set_flag(env, &ws, "setJavaScriptEnabled", settings.javascript)?;
            set_flag(env, &ws, "setDomStorageEnabled", settings.dom_storage)?;
            set_flag(env, &ws, "setAllowFileAccess", settings.file_access)?;
            set_flag(env, &ws, "setAllowContentAccess", settings.content_access)?;
            set_flag(env, &ws, "setGeolocationEnabled", settings.geolocation)?;
            env.call_static_method(
                "android/webkit/WebView",
                "setWebContentsDebuggingEnabled",
                "(Z)V",
                &[JValue::Bool(settings.web_contents_debugging as u8)],
            )?;
            Ok(())
        })
    }

    fn load_url(&self, url: &str) -> Result<()> {
        jni_util::with_env(|env| {
            let url = env.new_string(url)?;
            env.call_method(self.webview(), "loadUrl", "(Ljava/lang/String;)V", &[(&url).into()])?;
            Ok(())
        })
    }

    fn reload(&self) -> Result<()> {
        jni_util::with_env(|env| {
            env.call_method(self.webview(), "reload", "()V", &[])?;
            Ok(())
        })
    }

    fn evaluate_script(&self, script: &str) -> Result<()> {
        jni_util::with_env(|env| {
            let script = env.new_string(script)?;
            env.call_method(
                self.webview(),
                "evaluateJavascript",
                "(Ljava/lang/String;Landroid/webkit/ValueCallback;)V",
                &[(&script).into(), JValue::Object(&JObject::null())],
            )?;
            Ok(())
        })
    }

    fn can_go_back(&self) -> bool {
        self.query("canGoBack", |env| env.call_method(self.webview(), "canGoBack", "()Z", &[])?.z())
    }

    fn go_back(&self) -> Result<()> {
        jni_util::with_env(|env| {
            env.call_method(self.webview(), "goBack", "()V", &[])?;
            Ok(())
        })
    }
}

impl SystemUi for AndroidPlatform {
    fn apply_bar_style(&self, style: BarStyle) -> Result<()> {
        jni_util::with_env(|env| {
            let window = env
                .call_method(self.activity(), "getWindow", "()Landroid/view/Window;", &[])?
                .l()?;
            let color = JValue::Int(style.color.as_jint());
            env.call_method(&window, "setStatusBarColor", "(I)V", &[color])?;
            env.call_method(&window, "setNavigationBarColor", "(I)V", &[color])?;

            let decor = env
                .call_method(&window, "getDecorView", "()Landroid/view/View;", &[])?
                .l()?;
            let controller_class =
                find_app_class(env, self.activity(), "androidx/core/view/WindowInsetsControllerCompat")?;
            let controller = env.new_object(
                controller_class,
                "(Landroid/view/Window;Landroid/view/View;)V",
                &[(&window).into(), (&decor).into()],
            )?;
            set_flag(env, &controller, "setAppearanceLightStatusBars", style.light_foreground)?;
            set_flag(env, &controller, "setAppearanceLightNavigationBars", style.light_foreground)?;
            Ok(())
        })
    }

    fn open_app_settings(&self) -> Result<()> {
        jni_util::with_env(|env| {
            let package = env
                .call_method(self.activity(), "getPackageName", "()Ljava/lang/String;", &[])?
                .l()?;
            let scheme = env.new_string("package")?;
            let uri = env
                .call_static_method(
                    "android/net/Uri",
                    "fromParts",
                    "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)Landroid/net/Uri;",
                    &[(&scheme).into(), (&package).into(), JValue::Object(&JObject::null())],
                )?
                .l()?;
            let action = env.new_string("android.settings.APPLICATION_DETAILS_SETTINGS")?;
            let intent = env.new_object(
                "android/content/Intent",
                "(Ljava/lang/String;Landroid/net/Uri;)V",
                &[(&action).into(), (&uri).into()],
            )?;
            self.start_activity(env, &intent)
        })
    }

    fn open_location_source_settings(&self) -> Result<()> {
        jni_util::with_env(|env| {
            let action = env.new_string("android.settings.LOCATION_SOURCE_SETTINGS")?;
            let intent = env.new_object("android/content/Intent", "(Ljava/lang/String;)V", &[(&action).into()])?;
            self.start_activity(env, &intent)
        })
    }

    fn show_location_services_prompt(&self) -> Result<()> {
        self.app
            .dialog()
            .message("Location services are turned off. Turn them on to see what is happening around you.")
            .title("Location disabled")
            .kind(MessageDialogKind::Warning)
            .buttons(MessageDialogButtons::OkCancelCustom(
                "Open settings".to_string(),
                "Dismiss".to_string(),
            ))
            .show(|open_settings| {
                if let Some(handle) = super::shell_handle() {
                    handle.send(ShellEvent::LocationServicesAnswer { open_settings });
                }
            });
        Ok(())
    }

    fn set_offline_overlay(&self, visible: bool) -> Result<()> {
        self.call_activity_helper("setOfflineOverlayVisible", "(Z)V", &[JValue::Bool(visible as u8)])
    }

    fn default_back(&self) -> Result<()> {
        self.call_activity_helper("dispatchDefaultBack", "()V", &[])
    }
}

impl DeviceServices for AndroidPlatform {
    fn has_permission(&self, permission: Permission) -> bool {
        self.query("checkSelfPermission", |env| {
            let name = env.new_string(permission.android_name())?;
            let status = env
                .call_method(self.activity(), "checkSelfPermission", "(Ljava/lang/String;)I", &[(&name).into()])?
                .i()?;
            Ok(status == PERMISSION_GRANTED)
        })
    }

    fn request_permissions(&self, permissions: &[Permission]) -> Result<()> {
        let names: Vec<&str> = permissions.iter().map(|p| p.android_name()).collect();
        jni_util::with_env(|env| {
            let array = jni_util::new_string_array(env, &names)?;
            env.call_method(
                self.activity(),
                "requestPermissions",
                "([Ljava/lang/String;I)V",
                &[(&array).into(), JValue::Int(PERMISSION_REQUEST_CODE)],
            )?;
            Ok(())
        })
    }

    fn request_location_updates(&self, id: u64, request: &LocationRequest) -> Result<()> {
        let priority = if request.high_accuracy {
            PRIORITY_HIGH_ACCURACY
        } else {
            PRIORITY_BALANCED_POWER_ACCURACY
        };
        // Throws SecurityException without the location permission
        self.call_activity_helper(
            "requestSingleLocation",
            "(JIJZI)V",
            &[
                JValue::Long(id as i64),
                JValue::Int(priority),
                JValue::Long(request.interval_ms as i64),
                JValue::Bool(request.wait_for_accurate_location as u8),
                JValue::Int(request.max_updates as i32),
            ],
        )
    }

    fn remove_location_updates(&self, id: u64) {
        if let Err(e) = self.call_activity_helper("removeLocationRequest", "(J)V", &[JValue::Long(id as i64)]) {
            log::warn!("[Android] Failed to remove location request {}: {}", id, e);
        }
    }

    fn location_providers(&self) -> ProviderStatus {
        let enabled = |provider: &str| {
            self.query("isProviderEnabled", |env| {
                let manager = self.system_service(env, "location")?;
                let provider = env.new_string(provider)?;
                env.call_method(&manager, "isProviderEnabled", "(Ljava/lang/String;)Z", &[(&provider).into()])?
                    .z()
            })
        };
        ProviderStatus {
            gps: enabled("gps"),
            network: enabled("network"),
        }
    }

    fn is_network_reachable(&self) -> bool {
        self.query("network reachability", |env| {
            let manager = self.system_service(env, "connectivity")?;
            let network = env
                .call_method(&manager, "getActiveNetwork", "()Landroid/net/Network;", &[])?
                .l()?;
            if network.is_null() {
                return Ok(false);
            }
            let caps = env
                .call_method(
                    &manager,
                    "getNetworkCapabilities",
                    "(Landroid/net/Network;)Landroid/net/NetworkCapabilities;",
                    &[(&network).into()],
                )?
                .l()?;
            if caps.is_null() {
                return Ok(false);
            }
            env.call_method(&caps, "hasCapability", "(I)Z", &[JValue::Int(NET_CAPABILITY_INTERNET)])?
                .z()
        })
    }

    fn watch_network(&self) -> Result<()> {
        self.call_activity_helper("watchNetwork", "()V", &[])
    }

    fn unwatch_network(&self) {
        if let Err(e) = self.call_activity_helper("unwatchNetwork", "()V", &[]) {
            log::warn!("[Android] Failed to unregister network observer: {}", e);
        }
    }

    fn has_camera_handler(&self) -> bool {
        self.query("camera handler", |env| {
            let action = env.new_string("android.media.action.IMAGE_CAPTURE")?;
            let intent = env.new_object("android/content/Intent", "(Ljava/lang/String;)V", &[(&action).into()])?;
            let pm = env
                .call_method(self.activity(), "getPackageManager", "()Landroid/content/pm/PackageManager;", &[])?
                .l()?;
            let component = env
                .call_method(
                    &intent,
                    "resolveActivity",
                    "(Landroid/content/pm/PackageManager;)Landroid/content/ComponentName;",
                    &[(&pm).into()],
                )?
                .l()?;
            Ok(!component.is_null())
        })
    }

    fn create_capture_target(&self) -> Result<CaptureTarget> {
        let dir = self
            .app
            .path()
            .app_cache_dir()
            .map_err(|e| ShellError::Platform(format!("no cache dir: {}", e)))?
            .join("captures");
        std::fs::create_dir_all(&dir).map_err(|e| ShellError::Platform(format!("{:?}: {}", dir, e)))?;
        let path: PathBuf = dir.join(platform::capture_file_name(chrono::Utc::now()));
        std::fs::File::create(&path).map_err(|e| ShellError::Platform(format!("{:?}: {}", path, e)))?;

        let path_str = path.to_string_lossy().to_string();
        let uri = jni_util::with_env(|env| {
            let package = env
                .call_method(self.activity(), "getPackageName", "()Ljava/lang/String;", &[])?
                .l()?;
            let package = jni_util::get_string(env, &package.into())?;
            let authority = env.new_string(format!("{}.fileprovider", package))?;
            let jpath = env.new_string(&path_str)?;
            let file = env.new_object("java/io/File", "(Ljava/lang/String;)V", &[(&jpath).into()])?;
            let provider = find_app_class(env, self.activity(), "androidx/core/content/FileProvider")?;
            let uri = env
                .call_static_method(
                    provider,
                    "getUriForFile",
                    "(Landroid/content/Context;Ljava/lang/String;Ljava/io/File;)Landroid/net/Uri;",
                    &[self.activity().into(), (&authority).into(), (&file).into()],
                )?
                .l()?;
            let uri = env
                .call_method(&uri, "toString", "()Ljava/lang/String;", &[])?
                .l()?;
            jni_util::get_string(env, &uri.into())
        });

        match uri {
            Ok(uri) => Ok(CaptureTarget { path, uri }),
            Err(e) => {
                let _ = std::fs::remove_file(&path);
                Err(e)
            }
        }
    }

    fn discard_capture_target(&self, target: &CaptureTarget) {
        if let Err(e) = std::fs::remove_file(&target.path) {
            log::debug!("[Android] Could not remove {:?}: {}", target.path, e);
        }
    }

    fn launch_file_chooser(&self, intent: &ChooserIntent) -> Result<()> {
        let accept: Vec<&str> = intent.accept_types.iter().map(String::as_str).collect();
        let capture_uri = intent.capture.as_ref().map(|c| c.uri.as_str());
        jni_util::with_env(|env| {
            let accept = jni_util::new_string_array(env, &accept)?;
            let capture = match capture_uri {
                Some(uri) => JObject::from(env.new_string(uri)?),
                None => JObject::null(),
            };
            env.call_method(
                self.activity(),
                "launchFileChooser",
                "([Ljava/lang/String;ZLjava/lang/String;)V",
                &[(&accept).into(), JValue::Bool(intent.allow_multiple as u8), (&capture).into()],
            )?;
            Ok(())
        })
        // ActivityNotFoundException surfaces as a Java exception
        .map_err(|e| match e {
            ShellError::Jni(jni::errors::Error::JavaException) => ShellError::NoHandler("file chooser".to_string()),
            other => other,
        })
    }
}

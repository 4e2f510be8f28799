//! Android adapter for the shell.
//!
//! This module is only compiled on Android builds (`target_os = "android"`).
//! It provides:
//!
//! - **Shell installation** - creates the `Shell` on the UI thread once Tauri's WebView exists
//! - **Native entry points** - `MainActivity` forwards browser-chrome and lifecycle callbacks here
//! - **Platform** - WebView, system bars, permissions and intents over JNI
//!
//! ## Threading
//!
//! The shell lives in a UI-thread local. Callbacks that arrive on the UI thread
//! are handled in place; anything else (location fixes, network changes, IPC
//! commands) goes through the `ShellHandle`, whose waker schedules a drain on
//! the UI thread through the WebView's JNI handle.

#![cfg(target_os = "android")]

pub mod callbacks;
pub mod jni_util;
pub mod platform;

use std::cell::RefCell;
use std::sync::{Arc, Mutex, Once, OnceLock};

use jni::objects::{JObject, JObjectArray, JString};
use jni::sys::{jboolean, jdouble, jfloat, jintArray, jlong, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;
use tauri::{AppHandle, WebviewWindow, Wry};

use self::callbacks::{JavaFileChooserCallback, JavaGeolocationCallback};
use self::platform::AndroidPlatform;
use crate::config::ShellConfig;
use crate::error::Result;
use crate::locale;
use crate::shell::{self, Shell, ShellEvent, ShellHandle, Waker};
use crate::types::{ChooserParams, ChooserResult, LocationFix, Permission};

static INIT: Once = Once::new();
/// Handle of the current shell; replaced when a re-created activity installs a new one.
static HANDLE: Mutex<Option<ShellHandle>> = Mutex::new(None);

/// What `attach` needs to install a shell again for a re-created activity.
static ATTACH: OnceLock<(AppHandle<Wry>, WebviewWindow<Wry>, ShellConfig)> = OnceLock::new();

thread_local! {
    static SHELL: RefCell<Option<Shell<AndroidPlatform>>> = const { RefCell::new(None) };
}

/// Initialize logging and panic hook for Android
pub fn init_logging() {
    INIT.call_once(|| {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(if cfg!(debug_assertions) {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                })
                .with_tag("BlipsShell"),
        );

        std::panic::set_hook(Box::new(|info| {
            let payload = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "Unknown panic".to_string());

            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown".to_string());

            log::error!("PANIC at {}: {}", location, payload);
        }));
    });
}

pub fn shell_handle() -> Option<ShellHandle> {
    HANDLE.lock().ok()?.clone()
}

/// Run `f` against the shell. Only succeeds on the UI thread, outside another shell call.
fn with_shell<T>(f: impl FnOnce(&mut Shell<AndroidPlatform>) -> T) -> Option<T> {
    SHELL.with(|cell| {
        let mut slot = cell.try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    })
}

/// Deliver an event in place when on the UI thread, through the queue otherwise.
pub fn dispatch(event: ShellEvent) {
    let deferred = SHELL.with(|cell| match cell.try_borrow_mut() {
        Ok(mut slot) => match slot.as_mut() {
            Some(shell) => {
                // Keep ordering with anything queued earlier
                shell.drain();
                shell.handle(event);
                None
            }
            None => Some(event),
        },
        Err(_) => Some(event),
    });

    if let Some(event) = deferred {
        match shell_handle() {
            Some(handle) => {
                handle.send(event);
            }
            None => shell::reject(event),
        }
    }
}

fn drain() {
    if let Some(handled) = with_shell(|shell| shell.drain()) {
        log::trace!("[Android] Drained {} event(s)", handled);
    }
}

fn schedule_drain(window: &WebviewWindow<Wry>) {
    let result = window.with_webview(|webview| {
        webview.jni_handle().exec(|_env, _activity, _webview| drain());
    });
    if let Err(e) = result {
        log::warn!("[Android] Failed to schedule drain: {}", e);
    }
}

/// Install the shell on the UI thread once the WebView exists.
pub fn attach(app: AppHandle<Wry>, window: WebviewWindow<Wry>, config: ShellConfig) -> tauri::Result<()> {
    let _ = ATTACH.set((app.clone(), window.clone(), config.clone()));
    schedule_install(app, window, config)
}

/// The activity came back after the shell was torn down: install a fresh one.
fn reattach() {
    let Some((app, window, config)) = ATTACH.get().cloned() else {
        log::warn!("[Android] Activity started before the shell was attached");
        return;
    };
    log::info!("[Android] Reinstalling shell for re-created activity");
    if let Err(e) = schedule_install(app, window, config) {
        log::error!("[Android] Failed to reinstall shell: {}", e);
    }
}

fn schedule_install(app: AppHandle<Wry>, window: WebviewWindow<Wry>, config: ShellConfig) -> tauri::Result<()> {
    let drain_window = window.clone();
    window.with_webview(move |webview| {
        webview.jni_handle().exec(move |env, activity, webview| {
            if let Err(e) = install(env, activity, webview, app, drain_window, config) {
                log::error!("[Android] Failed to install shell: {}", e);
            }
        });
    })
}

fn install(
    env: &mut JNIEnv,
    activity: &JObject,
    webview: &JObject,
    app: AppHandle<Wry>,
    window: WebviewWindow<Wry>,
    config: ShellConfig,
) -> Result<()> {
    jni_util::set_java_vm(env.get_java_vm()?);

    let live = SHELL.with(|cell| {
        cell.borrow()
            .as_ref()
            .is_some_and(|shell| !shell.is_destroyed())
    });
    if live {
        log::warn!("[Android] Shell already installed");
        return Ok(());
    }

    let platform = AndroidPlatform::new(app, env.new_global_ref(activity)?, env.new_global_ref(webview)?);
    let waker: Waker = Arc::new(move || schedule_drain(&window));
    let (mut shell, handle) = Shell::new(platform, config, waker);
    match HANDLE.lock() {
        Ok(mut slot) => *slot = Some(handle),
        Err(e) => *e.into_inner() = Some(handle),
    }

    let deep_link = intent_data(env, activity);
    let language = locale::system_language();
    log::info!("[Android] Installing shell (language: {}, deep link: {:?})", language, deep_link);

    shell.handle(ShellEvent::Created { deep_link, language });
    // Installation runs after the activity's start/resume callbacks, which found no live shell
    shell.handle(ShellEvent::Started);
    shell.handle(ShellEvent::Resumed);

    // Drops a torn-down predecessor along with its activity and WebView refs
    SHELL.with(|cell| *cell.borrow_mut() = Some(shell));
    Ok(())
}

/// `getIntent().getData()` of the activity, if it was opened through a link.
fn intent_data(env: &mut JNIEnv, activity: &JObject) -> Option<String> {
    let result = (|| -> jni::errors::Result<Option<String>> {
        let intent = env
            .call_method(activity, "getIntent", "()Landroid/content/Intent;", &[])?
            .l()?;
        if intent.is_null() {
            return Ok(None);
        }
        let data = env.call_method(&intent, "getData", "()Landroid/net/Uri;", &[])?.l()?;
        if data.is_null() {
            return Ok(None);
        }
        let uri = env.call_method(&data, "toString", "()Ljava/lang/String;", &[])?.l()?;
        Ok(Some(jni_util::get_string(env, &JString::from(uri))?))
    })();

    result.unwrap_or_else(|e| {
        jni_util::clear_exception(env);
        log::warn!("[Android] Failed to read launch intent: {}", e);
        None
    })
}

// ── Native entry points called by MainActivity ────────────────────────────

#[no_mangle]
pub extern "system" fn Java_com_nitrogenio_blips_MainActivity_nativeShowFileChooser<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    callback: JObject<'local>,
    accept_types: JObjectArray<'local>,
    allow_multiple: jboolean,
) -> jboolean {
    let callback = match JavaFileChooserCallback::new(&mut env, &callback) {
        Ok(callback) => Box::new(callback),
        Err(e) => {
            jni_util::clear_exception(&mut env);
            log::error!("[Android] Failed to retain file chooser callback: {}", e);
            return JNI_FALSE;
        }
    };
    let params = ChooserParams {
        accept_types: jni_util::string_array(&mut env, &accept_types).unwrap_or_default(),
        allow_multiple: allow_multiple == JNI_TRUE,
    };

    // The browser needs the handled flag synchronously, so this cannot be queued
    let mut pending = Some((params, callback));
    let handled = with_shell(|shell| match pending.take() {
        Some((params, callback)) => shell.show_file_chooser(params, callback),
        None => false,
    });
    if let Some((_, callback)) = pending {
        callback.resolve(None);
    }
    if handled.unwrap_or(false) {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

#[no_mangle]
pub extern "system" fn Java_com_nitrogenio_blips_MainActivity_nativeFileChooserResult<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    confirmed: jboolean,
    uris: JObjectArray<'local>,
) {
    let uris = jni_util::string_array(&mut env, &uris).unwrap_or_else(|e| {
        jni_util::clear_exception(&mut env);
        log::warn!("[Android] Unreadable file chooser result: {}", e);
        Vec::new()
    });
    dispatch(ShellEvent::FileChooserResult(ChooserResult {
        confirmed: confirmed == JNI_TRUE,
        uris,
    }));
}

#[no_mangle]
pub extern "system" fn Java_com_nitrogenio_blips_MainActivity_nativeGeolocationPrompt<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    origin: JString<'local>,
    callback: JObject<'local>,
) {
    let origin = jni_util::get_string(&mut env, &origin).unwrap_or_default();
    match JavaGeolocationCallback::new(&mut env, &callback) {
        Ok(callback) => dispatch(ShellEvent::GeolocationPrompt {
            origin,
            callback: Box::new(callback),
        }),
        Err(e) => {
            jni_util::clear_exception(&mut env);
            log::error!("[Android] Failed to retain geolocation callback: {}", e);
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_com_nitrogenio_blips_MainActivity_nativePermissionsResult<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    permissions: JObjectArray<'local>,
    grants: jintArray,
) {
    let results = (|| -> jni::errors::Result<Vec<(Permission, bool)>> {
        let names = jni_util::string_array(&mut env, &permissions)?;
        // SAFETY: `grants` is the int[] local reference passed by the JVM for this call
        let grants = unsafe { jni::objects::JIntArray::from_raw(grants) };
        let len = if grants.is_null() { 0 } else { env.get_array_length(&grants)? };
        let mut values = vec![0; len as usize];
        if len > 0 {
            env.get_int_array_region(&grants, 0, &mut values)?;
        }
        Ok(names
            .iter()
            .zip(values)
            .filter_map(|(name, grant)| Permission::from_android_name(name).map(|p| (p, grant == 0)))
            .collect())
    })();

    match results {
        Ok(results) => dispatch(ShellEvent::PermissionsResult(results)),
        Err(e) => {
            jni_util::clear_exception(&mut env);
            log::warn!("[Android] Unreadable permission result: {}", e);
            dispatch(ShellEvent::PermissionsResult(Vec::new()));
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_com_nitrogenio_blips_MainActivity_nativeLocationFix<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    request_id: jlong,
    has_fix: jboolean,
    lat: jdouble,
    lng: jdouble,
    accuracy: jfloat,
    time: jlong,
) {
    let fix = (has_fix == JNI_TRUE).then_some(LocationFix {
        lat,
        lng,
        accuracy,
        timestamp: time,
    });
    dispatch(ShellEvent::LocationResult {
        request_id: request_id as u64,
        fix,
    });
}

#[no_mangle]
pub extern "system" fn Java_com_nitrogenio_blips_MainActivity_nativeReachabilityChanged<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    reachable: jboolean,
) {
    dispatch(ShellEvent::ReachabilityChanged(reachable == JNI_TRUE));
}

#[no_mangle]
pub extern "system" fn Java_com_nitrogenio_blips_MainActivity_nativeBackPressed<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) {
    dispatch(ShellEvent::BackPressed);
}

#[no_mangle]
pub extern "system" fn Java_com_nitrogenio_blips_MainActivity_nativeStart<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) {
    if with_shell(|shell| shell.is_destroyed()).unwrap_or(false) {
        reattach();
        return;
    }
    dispatch(ShellEvent::Started);
}

#[no_mangle]
pub extern "system" fn Java_com_nitrogenio_blips_MainActivity_nativeResume<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) {
    dispatch(ShellEvent::Resumed);
}

#[no_mangle]
pub extern "system" fn Java_com_nitrogenio_blips_MainActivity_nativeDestroy<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) {
    dispatch(ShellEvent::Destroyed);
}

pub mod bridge;
pub mod color;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod host;
pub mod init_script;
pub mod locale;
pub mod permissions;
pub mod platform;
pub mod shell;
pub mod types;

#[cfg(target_os = "android")]
mod android;

#[cfg(target_os = "android")]
use tauri::{webview::PageLoadEvent, WebviewUrl, WebviewWindowBuilder};

#[cfg(target_os = "android")]
use crate::shell::ShellEvent;

#[cfg(target_os = "android")]
fn shell_handle() -> Result<shell::ShellHandle, String> {
    android::shell_handle().ok_or_else(|| "Shell not ready".to_string())
}

/// `AndroidBridge.requestNativeLocation()`. The fix arrives later through
/// `window.onNativeLocationUpdate`.
#[cfg(target_os = "android")]
#[tauri::command]
fn request_native_location() -> Result<(), String> {
    shell_handle()?.request_native_location();
    Ok(())
}

/// `AndroidBridge.updateStatusBar(isDarkMode, hexColor)`
#[cfg(target_os = "android")]
#[tauri::command]
fn update_status_bar(is_dark_mode: bool, hex_color: String) -> Result<bool, String> {
    Ok(shell_handle()?.update_status_bar(is_dark_mode, &hex_color))
}

/// `AndroidBridge.openSettings()`
#[cfg(target_os = "android")]
#[tauri::command]
fn open_settings() -> Result<(), String> {
    shell_handle()?.open_settings();
    Ok(())
}

#[cfg(target_os = "android")]
#[tauri::mobile_entry_point]
pub fn run() {
    android::init_logging();
    let config = config::ShellConfig::load();
    log::info!("[Blips] Starting shell for {}", config.base_url);

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(move |app| {
            // The shell navigates to the hosted app once it is installed on the UI thread
            let window = WebviewWindowBuilder::new(app, "main", WebviewUrl::External("about:blank".parse()?))
                .initialization_script(&init_script::bridge_init_script(&config.bridge_object))
                .on_page_load(|_window, payload| {
                    let url = payload.url().to_string();
                    if url == "about:blank" {
                        return;
                    }
                    android::dispatch(match payload.event() {
                        PageLoadEvent::Started => ShellEvent::PageStarted { url },
                        PageLoadEvent::Finished => ShellEvent::PageFinished { url },
                    });
                })
                .build()?;

            android::attach(app.handle().clone(), window, config.clone())?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            request_native_location,
            update_status_bar,
            open_settings
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

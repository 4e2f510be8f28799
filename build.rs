fn main() {
    println!("cargo:rerun-if-changed=shell.json");

    // Tauri context generation only applies to the Android app; host builds
    // compile the platform-neutral core without it.
    if std::env::var("CARGO_CFG_TARGET_OS").map(|v| v == "android").unwrap_or(false) {
        tauri_build::build()
    }
}

//! Error type shared by the shell core and the platform adapters.
//!
//! Nothing in the shell is fatal: every variant ends up logged and degraded to
//! a no-op or a `false`/empty answer towards page script.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    /// No installed component can satisfy an intent (file picker, camera).
    #[error("no handler available for {0}")]
    NoHandler(String),

    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    /// A platform service refused or failed the call (missing permission,
    /// disabled provider, UI update failure).
    #[error("platform error: {0}")]
    Platform(String),

    #[cfg(target_os = "android")]
    #[error("JNI error: {0}")]
    Jni(#[from] jni::errors::Error),

    #[error("invalid shell configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ShellError>;

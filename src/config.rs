//! Shell configuration
//!
//! Defaults match the production app; `shell.json` at the crate root is embedded at
//! build time and overrides them field by field.

use serde::Deserialize;

use crate::error::Result;

const EMBEDDED_CONFIG: &str = include_str!("../shell.json");

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShellConfig {
    /// Origin of the hosted app, without a trailing slash
    pub base_url: String,
    /// Language paths the hosted app serves
    pub supported_languages: Vec<String>,
    pub default_language: String,
    /// Global object name the bridge is installed under
    pub bridge_object: String,
    /// Enable remote WebView debugging; `None` follows the build profile
    pub web_contents_debugging: Option<bool>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            base_url: "https://local-app.getblips.app".to_string(),
            supported_languages: ["pt", "es", "de", "fr", "en"].iter().map(|s| s.to_string()).collect(),
            default_language: "en".to_string(),
            bridge_object: "AndroidBridge".to_string(),
            web_contents_debugging: None,
        }
    }
}

impl ShellConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: ShellConfig = serde_json::from_str(json)?;
        while config.base_url.ends_with('/') {
            config.base_url.pop();
        }
        Ok(config)
    }

    /// Load the embedded configuration, falling back to defaults if it is malformed.
    pub fn load() -> Self {
        match Self::from_json(EMBEDDED_CONFIG) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("[Shell] Ignoring embedded shell.json: {}", e);
                Self::default()
            }
        }
    }

    pub fn debugging_enabled(&self) -> bool {
        self.web_contents_debugging.unwrap_or(cfg!(debug_assertions))
    }
}

//! System language detection and initial URL selection.

use crate::config::ShellConfig;

/// Primary language subtag of the system locale (`"pt-BR"` -> `"pt"`), lowercased.
pub fn system_language() -> String {
    sys_locale::get_locale()
        .map(|locale| primary_subtag(&locale))
        .unwrap_or_default()
}

fn primary_subtag(locale: &str) -> String {
    locale
        .split(['-', '_', '.', '@'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Language path served for `language`: itself when supported, else the default.
pub fn region_path<'a>(config: &'a ShellConfig, language: &str) -> &'a str {
    let language = primary_subtag(language);
    config
        .supported_languages
        .iter()
        .find(|supported| **supported == language)
        .map(String::as_str)
        .unwrap_or(&config.default_language)
}

/// URL the browser opens first: an explicit deep link verbatim, otherwise the
/// hosted app under the system language path.
pub fn initial_url(config: &ShellConfig, deep_link: Option<&str>, language: &str) -> String {
    match deep_link.filter(|link| !link.is_empty()) {
        Some(link) => link.to_string(),
        None => format!("{}/{}", config.base_url, region_path(config, language)),
    }
}

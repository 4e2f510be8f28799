//! Color parsing for the status bar bridge call.
//!
//! Accepts the same inputs as Android's `Color.parseColor`: `#RRGGBB`,
//! `#AARRGGBB`, or one of the framework's named colors (case-insensitive).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, ShellError};

/// Named colors understood by the platform color parser.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0xFF000000),
    ("darkgray", 0xFF444444),
    ("gray", 0xFF888888),
    ("lightgray", 0xFFCCCCCC),
    ("white", 0xFFFFFFFF),
    ("red", 0xFFFF0000),
    ("green", 0xFF00FF00),
    ("blue", 0xFF0000FF),
    ("yellow", 0xFFFFFF00),
    ("cyan", 0xFF00FFFF),
    ("magenta", 0xFFFF00FF),
    ("aqua", 0xFF00FFFF),
    ("fuchsia", 0xFFFF00FF),
    ("darkgrey", 0xFF444444),
    ("grey", 0xFF888888),
    ("lightgrey", 0xFFCCCCCC),
    ("lime", 0xFF00FF00),
    ("maroon", 0xFF800000),
    ("navy", 0xFF000080),
    ("olive", 0xFF808000),
    ("purple", 0xFF800080),
    ("silver", 0xFFC0C0C0),
    ("teal", 0xFF008080),
];

// `#RRGGBB` or `#AARRGGBB`
static HEX_COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("Failed to compile HEX_COLOR_REGEX")
});

/// A 32-bit ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    pub const fn from_argb(argb: u32) -> Self {
        Color(argb)
    }

    pub fn parse(input: &str) -> Result<Self> {
        if input.starts_with('#') {
            if !HEX_COLOR_REGEX.is_match(input) {
                return Err(ShellError::InvalidColor(input.to_string()));
            }
            let digits = &input[1..];
            let value = u32::from_str_radix(digits, 16)
                .map_err(|_| ShellError::InvalidColor(input.to_string()))?;
            // Six digits carry no alpha: treat as fully opaque
            return Ok(if digits.len() == 6 {
                Color(0xFF00_0000 | value)
            } else {
                Color(value)
            });
        }

        let lower = input.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, argb)| Color(*argb))
            .ok_or_else(|| ShellError::InvalidColor(input.to_string()))
    }

    pub fn argb(self) -> u32 {
        self.0
    }

    /// The color as the signed `int` the Android framework expects.
    pub fn as_jint(self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

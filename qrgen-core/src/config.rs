//! The current QR configuration being edited.

use serde::{Deserialize, Serialize};

/// Default foreground color.
pub const DEFAULT_FOREGROUND: &str = "#000000";

/// Default background color.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// A color string, conventionally `#RRGGBB`.
///
/// Values are passed through exactly as entered. [`ColorHex::is_well_formed`]
/// reports whether the value follows the convention, but nothing rejects a
/// malformed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorHex(String);

impl ColorHex {
    /// Wrap a color string without validation.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw color string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the value is `#` followed by exactly six hex digits.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let bytes = self.0.as_bytes();
        bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit)
    }
}

impl std::fmt::Display for ColorHex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColorHex {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ColorHex {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which of the two colors to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChannel {
    /// Module (dark) color.
    Foreground,
    /// Background (light) color.
    Background,
}

/// Text plus the two colors a QR code is rendered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrConfig {
    /// Payload text. Empty means there is nothing to render.
    pub text: String,
    /// Module color.
    pub foreground_color: ColorHex,
    /// Background color.
    pub background_color: ColorHex,
}

impl QrConfig {
    /// Create a configuration.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        foreground_color: impl Into<ColorHex>,
        background_color: impl Into<ColorHex>,
    ) -> Self {
        Self {
            text: text.into(),
            foreground_color: foreground_color.into(),
            background_color: background_color.into(),
        }
    }

    /// Whether the text is non-empty after trimming.
    #[must_use]
    pub fn has_renderable_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Whether two configurations share text and both colors.
    #[must_use]
    pub fn same_design(&self, other: &Self) -> bool {
        self.text == other.text
            && self.foreground_color == other.foreground_color
            && self.background_color == other.background_color
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self::new("", DEFAULT_FOREGROUND, DEFAULT_BACKGROUND)
    }
}

/// The single live configuration for a session.
///
/// All setters are total; reads always see the latest write.
#[derive(Debug, Clone, Default)]
pub struct QrConfigState {
    current: QrConfig,
}

impl QrConfigState {
    /// Start with empty text, black on white.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the current configuration.
    #[must_use]
    pub fn config(&self) -> &QrConfig {
        &self.current
    }

    /// Owned copy for consumers that outlive the borrow (e.g. async export).
    #[must_use]
    pub fn snapshot(&self) -> QrConfig {
        self.current.clone()
    }

    /// Whether the current text is non-empty after trimming.
    #[must_use]
    pub fn has_renderable_text(&self) -> bool {
        self.current.has_renderable_text()
    }

    /// Replace the text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.current.text = text.into();
    }

    /// Replace one of the colors.
    pub fn set_color(&mut self, channel: ColorChannel, color: impl Into<ColorHex>) {
        let color = color.into();
        if !color.is_well_formed() {
            tracing::debug!("Accepting non-#RRGGBB color {color:?} for {channel:?}");
        }
        match channel {
            ColorChannel::Foreground => self.current.foreground_color = color,
            ColorChannel::Background => self.current.background_color = color,
        }
    }

    /// Empty the text, keeping colors.
    pub fn clear_text(&mut self) {
        self.current.text.clear();
    }

    /// Replace all three fields at once.
    pub fn load(&mut self, config: QrConfig) {
        self.current = config;
    }

    /// Back to empty text, black on white.
    pub fn reset(&mut self) {
        self.current = QrConfig::default();
    }
}

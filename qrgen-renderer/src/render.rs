//! Turning a configuration into a vector image.
//!
//! The matrix encoding is delegated to the `qrcode` crate; this module only
//! adapts a [`QrConfig`] into a request and wraps the SVG it returns.

use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use qrgen_core::{ColorHex, QrConfig};

use crate::error::{RenderError, RenderResult};

/// Default minimum preview size in pixels.
pub const DEFAULT_PREVIEW_SIZE: u32 = 280;

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCorrection {
    /// ~7% recovery.
    L,
    /// ~15% recovery.
    #[default]
    M,
    /// ~25% recovery.
    Q,
    /// ~30% recovery.
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => Self::L,
            ErrorCorrection::M => Self::M,
            ErrorCorrection::Q => Self::Q,
            ErrorCorrection::H => Self::H,
        }
    }
}

/// Inputs to a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Payload text. Must not be blank.
    pub text: String,
    /// Module color.
    pub foreground: ColorHex,
    /// Background color.
    pub background: ColorHex,
    /// Error correction level.
    pub level: ErrorCorrection,
}

impl RenderRequest {
    /// Build a request at the default level (`M`).
    #[must_use]
    pub fn from_config(config: &QrConfig) -> Self {
        Self {
            text: config.text.clone(),
            foreground: config.foreground_color.clone(),
            background: config.background_color.clone(),
            level: ErrorCorrection::default(),
        }
    }
}

/// A rendered QR code as SVG markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorImage {
    svg: String,
}

impl VectorImage {
    /// Wrap existing SVG markup.
    #[must_use]
    pub fn from_svg(svg: impl Into<String>) -> Self {
        Self { svg: svg.into() }
    }

    /// The SVG markup.
    #[must_use]
    pub fn as_svg(&self) -> &str {
        &self.svg
    }

    /// Serialize to SVG text.
    #[must_use]
    pub fn into_svg(self) -> String {
        self.svg
    }
}

/// Produces a vector image for a request.
///
/// Implementations must be deterministic: the same request yields the same
/// image.
pub trait QrRenderer: Send + Sync {
    /// Render `request` to SVG.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptyInput`] for blank text and
    /// [`RenderError::Encode`] if the text cannot be encoded.
    fn render(&self, request: &RenderRequest) -> RenderResult<VectorImage>;
}

/// [`QrRenderer`] backed by the `qrcode` crate's SVG output.
#[derive(Debug, Clone)]
pub struct QrCodeRenderer {
    min_size: u32,
    quiet_zone: bool,
}

impl QrCodeRenderer {
    /// Create a renderer with the given minimum size and quiet-zone setting.
    #[must_use]
    pub fn new(min_size: u32, quiet_zone: bool) -> Self {
        Self {
            min_size,
            quiet_zone,
        }
    }
}

impl Default for QrCodeRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_SIZE, true)
    }
}

impl QrRenderer for QrCodeRenderer {
    fn render(&self, request: &RenderRequest) -> RenderResult<VectorImage> {
        if request.text.trim().is_empty() {
            return Err(RenderError::EmptyInput);
        }

        let code = QrCode::with_error_correction_level(request.text.as_bytes(), request.level.into())
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        let svg = code
            .render::<svg::Color<'_>>()
            .min_dimensions(self.min_size, self.min_size)
            .quiet_zone(self.quiet_zone)
            .dark_color(svg::Color(request.foreground.as_str()))
            .light_color(svg::Color(request.background.as_str()))
            .build();

        tracing::debug!("Rendered {} byte SVG at level {:?}", svg.len(), request.level);
        Ok(VectorImage::from_svg(svg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> RenderRequest {
        RenderRequest::from_config(&QrConfig::new(text, "#3b82f6", "#faf5ff"))
    }

    #[test]
    fn test_renders_svg_with_both_colors() {
        let image = QrCodeRenderer::default()
            .render(&request("https://github.com"))
            .expect("render");
        let svg = image.as_svg();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#3b82f6"));
        assert!(svg.contains("#faf5ff"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = QrCodeRenderer::default();
        let a = renderer.render(&request("same")).expect("a");
        let b = renderer.render(&request("same")).expect("b");
        assert_eq!(a, b);
    }

    #[test]
    fn test_blank_text_is_rejected() {
        let renderer = QrCodeRenderer::default();
        assert!(matches!(renderer.render(&request("")), Err(RenderError::EmptyInput)));
        assert!(matches!(renderer.render(&request(" \n")), Err(RenderError::EmptyInput)));
    }

    #[test]
    fn test_oversized_text_is_encode_error() {
        let huge = "x".repeat(8000);
        let result = QrCodeRenderer::default().render(&request(&huge));
        assert!(matches!(result, Err(RenderError::Encode(_))));
    }

    #[test]
    fn test_default_level_is_m() {
        let req = request("x");
        assert_eq!(req.level, ErrorCorrection::M);
        assert_eq!(EcLevel::from(req.level), EcLevel::M);
    }
}

//! Renderer error types.

use thiserror::Error;

/// Result type for rendering and export operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering or exporting.
#[derive(Debug, Error)]
pub enum RenderError {
    /// There is no text to render.
    #[error("No text to render")]
    EmptyInput,

    /// The text could not be encoded (e.g. too long for any QR version).
    #[error("QR encoding failed: {0}")]
    Encode(String),

    /// The SVG could not be decoded into a raster surface.
    #[error("Raster decode failed: {0}")]
    RasterDecode(String),

    /// The raster surface could not be created or encoded as PNG.
    #[error("Raster encode failed: {0}")]
    RasterEncode(String),

    /// The pipeline was invalidated while the export was in flight.
    #[error("Export pipeline invalidated")]
    Invalidated,

    /// Writing the exported file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

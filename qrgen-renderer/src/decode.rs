//! SVG to raster decoding.
//!
//! Decoding is the one slow step of a PNG export, so it sits behind the
//! async [`RasterDecoder`] trait. [`ResvgDecoder`] does the work on a
//! blocking worker; tests inject their own decoders to control timing and
//! failure.

use async_trait::async_trait;
use tiny_skia::{Pixmap, Transform};

use crate::error::{RenderError, RenderResult};

/// Default raster export edge length in pixels.
pub const DEFAULT_RASTER_EDGE: u32 = 1024;

/// Target raster dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl RasterSize {
    /// A square of `edge` pixels.
    #[must_use]
    pub const fn square(edge: u32) -> Self {
        Self {
            width: edge,
            height: edge,
        }
    }
}

impl Default for RasterSize {
    fn default() -> Self {
        Self::square(DEFAULT_RASTER_EDGE)
    }
}

/// Decodes SVG markup into a pixmap.
#[async_trait]
pub trait RasterDecoder: Send + Sync {
    /// Decode `svg` scaled to fill `size`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::RasterDecode`] if the markup cannot be parsed or
    /// drawn.
    async fn decode(&self, svg: String, size: RasterSize) -> RenderResult<Pixmap>;
}

/// [`RasterDecoder`] using usvg + resvg on a blocking worker thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResvgDecoder;

impl ResvgDecoder {
    /// Parse and draw `svg` synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::RasterDecode`] if parsing fails or the target
    /// size is zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn rasterize(svg: &str, size: RasterSize) -> RenderResult<Pixmap> {
        let opt = usvg::Options::default();
        let tree = usvg::Tree::from_str(svg, &opt)
            .map_err(|e| RenderError::RasterDecode(format!("SVG parsing failed: {e}")))?;

        let mut pixmap = Pixmap::new(size.width, size.height).ok_or_else(|| {
            RenderError::RasterDecode(format!(
                "Invalid raster size {}x{}",
                size.width, size.height
            ))
        })?;

        let source = tree.size();
        let transform = Transform::from_scale(
            size.width as f32 / source.width(),
            size.height as f32 / source.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

#[async_trait]
impl RasterDecoder for ResvgDecoder {
    async fn decode(&self, svg: String, size: RasterSize) -> RenderResult<Pixmap> {
        tokio::task::spawn_blocking(move || Self::rasterize(&svg, size))
            .await
            .map_err(|e| RenderError::RasterDecode(format!("Decode task failed: {e}")))?
    }
}

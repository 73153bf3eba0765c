//! # qrgen Renderer
//!
//! QR code rendering and export. A [`QrConfig`](qrgen_core::QrConfig) becomes
//! SVG markup through a [`QrRenderer`], and PNG through a further async
//! decode and encode step.
//!
//! ## Export Pipeline
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌───────────────┐   ┌───────────┐
//! │ QrConfig │──▶│ QrRenderer  │──▶│ RasterDecoder │──▶│ PNG bytes │
//! └──────────┘   │ (SVG)       │   │ (resvg, async)│   │ (on white)│
//!                └──────┬──────┘   └───────────────┘   └───────────┘
//!                       └──────────▶ SVG bytes
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod decode;
pub mod error;
pub mod export;
pub mod render;

pub use decode::{RasterDecoder, RasterSize, ResvgDecoder};
pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportFormat, ExportPipeline, ExportedFile};
pub use render::{ErrorCorrection, QrCodeRenderer, QrRenderer, RenderRequest, VectorImage};

//! QR code export to SVG and PNG files.
//!
//! Vector export serializes the rendered SVG directly. Raster export is a
//! two-stage async pipeline: the SVG is decoded into a surface of the target
//! size through a [`RasterDecoder`], composited over an opaque background,
//! and encoded as PNG. Nothing is produced unless every stage succeeds.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use qrgen_core::QrConfig;
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

use crate::decode::{RasterDecoder, RasterSize, ResvgDecoder};
use crate::error::{RenderError, RenderResult};
use crate::render::{QrCodeRenderer, QrRenderer, RenderRequest};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// SVG vector graphics (UTF-8 XML).
    Svg,
    /// PNG raster image.
    Png,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    /// MIME type of the exported bytes.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml;charset=utf-8",
            Self::Png => "image/png",
        }
    }

    /// `qr-code-<unix_ms>.<ext>`.
    #[must_use]
    pub fn file_name(self, unix_ms: u64) -> String {
        format!("qr-code-{unix_ms}.{}", self.extension())
    }
}

/// A finished export, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    /// Timestamp-qualified file name.
    pub file_name: String,
    /// Format of `bytes`.
    pub format: ExportFormat,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Write into `dir`, returning the full path.
    ///
    /// Never replaces an existing file: if `file_name` is taken, the first
    /// free `qr-code-<ms>-<n>.<ext>` is used instead. The name is reserved
    /// atomically, so concurrent writers always land in distinct files. The
    /// bytes go to a temporary sibling first and are renamed over the
    /// reservation; on failure neither the temporary nor the reservation is
    /// left behind.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if the directory cannot be created, no
    /// free name is found, or the file cannot be written.
    pub fn write_to(&self, dir: &Path) -> RenderResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = reserve_path(dir, &self.file_name)?;
        let tmp = partial_path(&path);

        let written = std::fs::write(&tmp, &self.bytes).and_then(|()| std::fs::rename(&tmp, &path));
        if let Err(e) = written {
            discard(&tmp);
            discard(&path);
            return Err(e.into());
        }

        tracing::info!("Wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Upper bound on `-<n>` suffixes tried for one file name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Create an empty file at the first free variant of `file_name`.
fn reserve_path(dir: &Path, file_name: &str) -> std::io::Result<PathBuf> {
    let name = Path::new(file_name);
    let stem = name.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
    let extension = name.extension().and_then(|e| e.to_str());

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = match (attempt, extension) {
            (0, _) => dir.join(file_name),
            (n, Some(ext)) => dir.join(format!("{stem}-{n}.{ext}")),
            (n, None) => dir.join(format!("{stem}-{n}")),
        };
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }

    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("No free file name for {file_name} in {}", dir.display()),
    ))
}

/// `.<name>.partial` next to `path`. Unique because `path` is reserved.
fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.partial"))
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            tracing::debug!("Could not remove {}: {e}", path.display());
        }
    }
}

/// Configuration for raster export.
#[derive(Debug, Clone, Copy)]
pub struct ExportConfig {
    /// Output size for PNG export.
    pub raster_size: RasterSize,
    /// Opaque color painted beneath the decoded image, as RGBA bytes.
    pub background: [u8; 4],
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            raster_size: RasterSize::default(),
            background: [255, 255, 255, 255],
        }
    }
}

/// Renders the current configuration and packages it as a file.
///
/// Cloning shares the renderer, decoder, and invalidation flag. After
/// [`ExportPipeline::invalidate`], in-flight raster exports finish with
/// [`RenderError::Invalidated`] instead of producing a file.
#[derive(Clone)]
pub struct ExportPipeline {
    renderer: Arc<dyn QrRenderer>,
    decoder: Arc<dyn RasterDecoder>,
    config: ExportConfig,
    invalidated: Arc<AtomicBool>,
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("config", &self.config)
            .field("invalidated", &self.is_invalidated())
            .finish_non_exhaustive()
    }
}

impl ExportPipeline {
    /// Create a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        renderer: Arc<dyn QrRenderer>,
        decoder: Arc<dyn RasterDecoder>,
        config: ExportConfig,
    ) -> Self {
        Self {
            renderer,
            decoder,
            config,
            invalidated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// `qrcode` renderer, resvg decoder, 1024x1024 on white.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(QrCodeRenderer::default()),
            Arc::new(ResvgDecoder),
            ExportConfig::default(),
        )
    }

    /// The raster configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Stop delivering results. In-flight decodes still run to completion
    /// but their output is discarded.
    pub fn invalidate(&self) {
        if !self.invalidated.swap(true, Ordering::SeqCst) {
            tracing::debug!("Export pipeline invalidated");
        }
    }

    /// Whether [`ExportPipeline::invalidate`] has been called.
    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }

    /// Export `config` in `format`.
    ///
    /// # Errors
    ///
    /// See [`ExportPipeline::export_vector`] and
    /// [`ExportPipeline::export_raster`].
    pub async fn export(&self, config: &QrConfig, format: ExportFormat) -> RenderResult<ExportedFile> {
        match format {
            ExportFormat::Svg => self.export_vector(config),
            ExportFormat::Png => self.export_raster(config).await,
        }
    }

    /// Export `config` as an SVG file.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptyInput`] for blank text before any work is
    /// done, [`RenderError::Encode`] if the text cannot be encoded, or
    /// [`RenderError::Invalidated`] if the pipeline was invalidated.
    pub fn export_vector(&self, config: &QrConfig) -> RenderResult<ExportedFile> {
        self.check_ready(config)?;
        let svg = self.render_svg(config)?;

        let format = ExportFormat::Svg;
        Ok(ExportedFile {
            file_name: format.file_name(qrgen_core::current_timestamp_ms()),
            format,
            bytes: svg.into_bytes(),
        })
    }

    /// Export `config` as a PNG file of the configured raster size.
    ///
    /// Suspends while the SVG is decoded; other work proceeds meanwhile.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptyInput`] for blank text before any work is
    /// done, [`RenderError::RasterDecode`] if decoding fails,
    /// [`RenderError::RasterEncode`] if PNG encoding fails, or
    /// [`RenderError::Invalidated`] if the pipeline was invalidated before
    /// the decode completed.
    pub async fn export_raster(&self, config: &QrConfig) -> RenderResult<ExportedFile> {
        self.check_ready(config)?;
        let svg = self.render_svg(config)?;

        let size = self.config.raster_size;
        let decoded = self.decoder.decode(svg, size).await?;

        if self.is_invalidated() {
            tracing::debug!("Discarding raster export finished after invalidation");
            return Err(RenderError::Invalidated);
        }

        let bytes = self.composite_png(&decoded)?;
        let format = ExportFormat::Png;
        Ok(ExportedFile {
            file_name: format.file_name(qrgen_core::current_timestamp_ms()),
            format,
            bytes,
        })
    }

    fn check_ready(&self, config: &QrConfig) -> RenderResult<()> {
        if !config.has_renderable_text() {
            return Err(RenderError::EmptyInput);
        }
        if self.is_invalidated() {
            return Err(RenderError::Invalidated);
        }
        Ok(())
    }

    fn render_svg(&self, config: &QrConfig) -> RenderResult<String> {
        let request = RenderRequest::from_config(config);
        Ok(self.renderer.render(&request)?.into_svg())
    }

    /// Paint the background, draw `decoded` scaled to fill, encode PNG.
    #[allow(clippy::cast_precision_loss)]
    fn composite_png(&self, decoded: &Pixmap) -> RenderResult<Vec<u8>> {
        let size = self.config.raster_size;
        let mut surface = Pixmap::new(size.width, size.height).ok_or_else(|| {
            RenderError::RasterEncode(format!(
                "Failed to create {}x{} surface",
                size.width, size.height
            ))
        })?;

        let [r, g, b, a] = self.config.background;
        surface.fill(Color::from_rgba8(r, g, b, a));

        let transform = Transform::from_scale(
            size.width as f32 / decoded.width() as f32,
            size.height as f32 / decoded.height() as f32,
        );
        surface.draw_pixmap(
            0,
            0,
            decoded.as_ref(),
            &PixmapPaint::default(),
            transform,
            None,
        );

        surface
            .encode_png()
            .map_err(|e| RenderError::RasterEncode(format!("PNG encoding failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Returns a fully transparent pixmap of the requested size.
    struct TransparentDecoder;

    #[async_trait]
    impl RasterDecoder for TransparentDecoder {
        async fn decode(&self, _svg: String, size: RasterSize) -> RenderResult<Pixmap> {
            Pixmap::new(size.width, size.height)
                .ok_or_else(|| RenderError::RasterDecode("size".to_string()))
        }
    }

    struct FailingDecoder;

    #[async_trait]
    impl RasterDecoder for FailingDecoder {
        async fn decode(&self, _svg: String, _size: RasterSize) -> RenderResult<Pixmap> {
            Err(RenderError::RasterDecode("image failed to load".to_string()))
        }
    }

    /// Blocks until released, then behaves like [`TransparentDecoder`].
    struct GatedDecoder {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl RasterDecoder for GatedDecoder {
        async fn decode(&self, svg: String, size: RasterSize) -> RenderResult<Pixmap> {
            self.started.notify_one();
            self.release.notified().await;
            TransparentDecoder.decode(svg, size).await
        }
    }

    fn pipeline(decoder: Arc<dyn RasterDecoder>, edge: u32) -> ExportPipeline {
        ExportPipeline::new(
            Arc::new(QrCodeRenderer::default()),
            decoder,
            ExportConfig {
                raster_size: RasterSize::square(edge),
                ..ExportConfig::default()
            },
        )
    }

    fn hello() -> QrConfig {
        QrConfig::new("hello", "#000000", "#ffffff")
    }

    fn png_dimensions(bytes: &[u8]) -> (u32, u32) {
        let w = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let h = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
        (w, h)
    }

    #[test]
    fn test_file_name_format() {
        assert_eq!(ExportFormat::Svg.file_name(1_700_000_000_000), "qr-code-1700000000000.svg");
        assert_eq!(ExportFormat::Png.file_name(42), "qr-code-42.png");
    }

    #[test]
    fn test_vector_export() {
        let file = pipeline(Arc::new(TransparentDecoder), 16)
            .export_vector(&hello())
            .expect("svg");
        assert_eq!(file.format, ExportFormat::Svg);
        assert!(file.file_name.starts_with("qr-code-"));
        assert!(file.file_name.ends_with(".svg"));
        let svg = String::from_utf8(file.bytes).expect("utf8");
        assert!(svg.contains("<svg"));
    }

    #[tokio::test]
    async fn test_empty_input_rejected_for_both_formats() {
        let exporter = pipeline(Arc::new(TransparentDecoder), 16);
        for text in ["", "   "] {
            let config = QrConfig::new(text, "#000000", "#ffffff");
            for format in [ExportFormat::Svg, ExportFormat::Png] {
                let result = exporter.export(&config, format).await;
                assert!(matches!(result, Err(RenderError::EmptyInput)));
            }
        }
    }

    #[tokio::test]
    async fn test_raster_export_paints_opaque_background() {
        let file = pipeline(Arc::new(TransparentDecoder), 32)
            .export_raster(&hello())
            .await
            .expect("png");
        assert_eq!(&file.bytes[0..4], &[137, 80, 78, 71]);
        assert_eq!(png_dimensions(&file.bytes), (32, 32));

        let decoded = Pixmap::decode_png(&file.bytes).expect("decode");
        let pixel = decoded.pixel(5, 5).expect("pixel");
        assert_eq!(
            (pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()),
            (255, 255, 255, 255)
        );
    }

    #[tokio::test]
    async fn test_raster_export_default_size() {
        let exporter = ExportPipeline::new(
            Arc::new(QrCodeRenderer::default()),
            Arc::new(TransparentDecoder),
            ExportConfig::default(),
        );
        let file = exporter.export_raster(&hello()).await.expect("png");
        assert_eq!(png_dimensions(&file.bytes), (1024, 1024));
    }

    #[tokio::test]
    async fn test_decode_failure_produces_no_file() {
        let result = pipeline(Arc::new(FailingDecoder), 16)
            .export_raster(&hello())
            .await;
        assert!(matches!(result, Err(RenderError::RasterDecode(_))));
    }

    #[tokio::test]
    async fn test_invalidated_during_decode_is_discarded() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let exporter = pipeline(
            Arc::new(GatedDecoder {
                started: started.clone(),
                release: release.clone(),
            }),
            16,
        );

        let task = {
            let exporter = exporter.clone();
            tokio::spawn(async move { exporter.export_raster(&hello()).await })
        };

        started.notified().await;
        exporter.invalidate();
        release.notify_one();

        let result = task.await.expect("join");
        assert!(matches!(result, Err(RenderError::Invalidated)));
    }

    #[tokio::test]
    async fn test_invalidated_pipeline_rejects_new_exports() {
        let exporter = pipeline(Arc::new(TransparentDecoder), 16);
        exporter.invalidate();
        assert!(matches!(exporter.export_vector(&hello()), Err(RenderError::Invalidated)));
        assert!(matches!(
            exporter.export_raster(&hello()).await,
            Err(RenderError::Invalidated)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_exports_are_independent() {
        let exporter = pipeline(Arc::new(TransparentDecoder), 16);
        let other = QrConfig::new("world", "#22c55e", "#f0fdf4");
        let first = hello();
        let (a, b) = tokio::join!(exporter.export_raster(&first), exporter.export_raster(&other));
        assert!(a.is_ok());
        assert!(b.is_ok());
    }

    fn svg_file(name: &str, bytes: &[u8]) -> ExportedFile {
        ExportedFile {
            file_name: name.to_string(),
            format: ExportFormat::Svg,
            bytes: bytes.to_vec(),
        }
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .expect("read_dir")
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_write_to_never_overwrites_same_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let name = ExportFormat::Svg.file_name(7);

        let first = svg_file(&name, b"<svg>a</svg>").write_to(dir.path()).expect("first");
        let second = svg_file(&name, b"<svg>b</svg>").write_to(dir.path()).expect("second");
        let third = svg_file(&name, b"<svg>c</svg>").write_to(dir.path()).expect("third");

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).expect("read"), b"<svg>a</svg>");
        assert_eq!(std::fs::read(&second).expect("read"), b"<svg>b</svg>");
        assert_eq!(std::fs::read(&third).expect("read"), b"<svg>c</svg>");
        assert_eq!(
            dir_names(dir.path()),
            vec!["qr-code-7-1.svg", "qr-code-7-2.svg", "qr-code-7.svg"]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_with_same_name_stay_distinct() {
        let dir = tempfile::tempdir().expect("tempdir");
        let name = ExportFormat::Png.file_name(42);

        let tasks: Vec<_> = (0..16u8)
            .map(|i| {
                let file = svg_file(&name, &[i]);
                let dir = dir.path().to_path_buf();
                tokio::task::spawn_blocking(move || file.write_to(&dir))
            })
            .collect();

        let mut contents = Vec::new();
        for task in tasks {
            let path = task.await.expect("join").expect("write");
            contents.push(std::fs::read(path).expect("read"));
        }
        contents.sort();
        assert_eq!(contents, (0..16u8).map(|i| vec![i]).collect::<Vec<_>>());
        assert_eq!(dir_names(dir.path()).len(), 16);
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory squatting on the temporary name makes the write fail
        std::fs::create_dir(dir.path().join(".qr-code-1.svg.partial")).expect("mkdir");

        let result = svg_file("qr-code-1.svg", b"<svg/>").write_to(dir.path());
        assert!(matches!(result, Err(RenderError::Io(_))));
        assert_eq!(dir_names(dir.path()), vec![".qr-code-1.svg.partial"]);
    }

    #[test]
    fn test_write_to_leaves_no_partial_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = ExportedFile {
            file_name: ExportFormat::Svg.file_name(1),
            format: ExportFormat::Svg,
            bytes: b"<svg/>".to_vec(),
        };
        let path = file.write_to(dir.path()).expect("write");
        assert_eq!(std::fs::read(&path).expect("read"), b"<svg/>");

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read_dir")
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["qr-code-1.svg".to_string()]);
    }
}

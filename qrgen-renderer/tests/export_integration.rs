//! End-to-end export through the real encoder and rasterizer.

use qrgen_core::QrConfig;
use qrgen_renderer::{ExportFormat, ExportPipeline, RenderError};
use tiny_skia::Pixmap;

fn config() -> QrConfig {
    QrConfig::new("https://github.com", "#000000", "#ffffff")
}

#[tokio::test]
async fn test_png_export_is_1024_square() {
    let pipeline = ExportPipeline::with_defaults();
    let file = pipeline
        .export(&config(), ExportFormat::Png)
        .await
        .expect("png export");

    assert!(file.file_name.ends_with(".png"));
    assert_eq!(file.format.mime_type(), "image/png");

    let pixmap = Pixmap::decode_png(&file.bytes).expect("valid png");
    assert_eq!((pixmap.width(), pixmap.height()), (1024, 1024));

    // Quiet zone is light, so the corner pixel is opaque white.
    let corner = pixmap.pixel(0, 0).expect("pixel");
    assert_eq!(corner.alpha(), 255);
    assert_eq!(corner.red(), 255);
}

#[tokio::test]
async fn test_svg_export_carries_colors() {
    let pipeline = ExportPipeline::with_defaults();
    let recolored = QrConfig::new("hello", "#8b5cf6", "#faf5ff");
    let file = pipeline
        .export(&recolored, ExportFormat::Svg)
        .await
        .expect("svg export");

    let svg = String::from_utf8(file.bytes).expect("utf8");
    assert!(svg.contains("#8b5cf6"));
    assert!(svg.contains("#faf5ff"));
}

#[tokio::test]
async fn test_exports_write_to_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = ExportPipeline::with_defaults();

    for format in [ExportFormat::Svg, ExportFormat::Png] {
        let file = pipeline.export(&config(), format).await.expect("export");
        let path = file.write_to(dir.path()).expect("write");
        assert!(path.exists());
        assert_eq!(
            path.extension().and_then(|e| e.to_str()),
            Some(format.extension())
        );
    }
}

#[tokio::test]
async fn test_blank_text_never_reaches_renderer() {
    let pipeline = ExportPipeline::with_defaults();
    let blank = QrConfig::new("  ", "#000000", "#ffffff");
    let result = pipeline.export(&blank, ExportFormat::Png).await;
    assert!(matches!(result, Err(RenderError::EmptyInput)));
}

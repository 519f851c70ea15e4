//! Document rasterization: one rendered SVG in, PDF and PNG bytes out.
//!
//! The two conversions are independent: each parses the document into its own
//! engine instance and the pair is awaited together. Partial success is not a
//! supported state — if either conversion fails the whole operation fails and
//! the caller treats it as a generation failure.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use printpdf::{ImageTransform, Mm, PdfDocument};
use thiserror::Error;
use tiny_skia::Pixmap;
use usvg::{Options, Tree, fontdb};

use super::template::ReceiptDocument;

/// Pixel density multiplier for the raster output; 2× the 96 dpi layout grid
/// gives print-quality 192 dpi artifacts.
const RASTER_SCALE: f32 = 2.0;
const LAYOUT_DPI: f32 = 96.0;

#[derive(Debug, Error)]
pub enum RasterizeError {
    #[error("failed to parse rendered document: {0}")]
    Parse(String),
    #[error("failed to allocate raster surface for {width}x{height}")]
    Surface { width: u32, height: u32 },
    #[error("failed to encode raster image: {0}")]
    Encode(String),
    #[error("failed to assemble pdf: {0}")]
    Pdf(String),
    #[error("rasterizer worker failed: {0}")]
    Worker(String),
}

/// Both delivery formats for one rendered receipt.
#[derive(Debug, Clone)]
pub struct RasterOutput {
    pub pdf: Vec<u8>,
    pub png: Vec<u8>,
}

#[async_trait]
pub trait DocumentRasterizer: Send + Sync {
    async fn rasterize(&self, document: &ReceiptDocument) -> Result<RasterOutput, RasterizeError>;
}

/// The production rasterizer: resvg for the raster image, printpdf for the
/// paginated document. Entirely in-process; no external engine to launch.
#[derive(Debug, Clone, Default)]
pub struct VectorRasterizer;

impl VectorRasterizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentRasterizer for VectorRasterizer {
    async fn rasterize(&self, document: &ReceiptDocument) -> Result<RasterOutput, RasterizeError> {
        let png_svg = document.svg.clone();
        let pdf_svg = document.svg.clone();
        let page_width = document.width;
        let page_height = document.height;

        let png_task = tokio::task::spawn_blocking(move || render_png(&png_svg, RASTER_SCALE));
        let pdf_task = tokio::task::spawn_blocking(move || {
            render_pdf(&pdf_svg, page_width, page_height, RASTER_SCALE)
        });

        let (png, pdf) = tokio::try_join!(png_task, pdf_task)
            .map_err(|err| RasterizeError::Worker(err.to_string()))?;

        Ok(RasterOutput {
            pdf: pdf?,
            png: png?,
        })
    }
}

/// Render the document into an RGBA surface at `scale` pixel density.
fn render_surface(svg: &str, scale: f32) -> Result<Pixmap, RasterizeError> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    let options = Options {
        fontdb: Arc::new(db),
        ..Options::default()
    };

    let tree =
        Tree::from_str(svg, &options).map_err(|err| RasterizeError::Parse(err.to_string()))?;
    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;

    let mut pixmap =
        Pixmap::new(width, height).ok_or(RasterizeError::Surface { width, height })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap_mut,
    );

    Ok(pixmap)
}

fn render_png(svg: &str, scale: f32) -> Result<Vec<u8>, RasterizeError> {
    let pixmap = render_surface(svg, scale)?;
    let width = pixmap.width();
    let height = pixmap.height();

    let image = image::RgbaImage::from_raw(width, height, pixmap.data().to_vec())
        .ok_or_else(|| RasterizeError::Encode("raster buffer size mismatch".to_string()))?;

    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|err| RasterizeError::Encode(err.to_string()))?;

    Ok(bytes)
}

/// Single PDF page sized to the layout grid with zero margins; the 2× raster
/// is embedded at the matching dpi so the receipt width is preserved exactly.
fn render_pdf(
    svg: &str,
    page_width: f32,
    page_height: f32,
    scale: f32,
) -> Result<Vec<u8>, RasterizeError> {
    let pixmap = render_surface(svg, scale)?;
    let width = pixmap.width();
    let height = pixmap.height();

    let rgba = printpdf::image_crate::RgbaImage::from_raw(width, height, pixmap.data().to_vec())
        .ok_or_else(|| RasterizeError::Encode("raster buffer size mismatch".to_string()))?;
    let flattened = printpdf::image_crate::DynamicImage::ImageRgba8(rgba).to_rgb8();
    let dynamic = printpdf::image_crate::DynamicImage::ImageRgb8(flattened);

    let (doc, page, layer) = PdfDocument::new(
        "receipt",
        Mm(px_to_mm(page_width)),
        Mm(px_to_mm(page_height)),
        "Layer 1",
    );

    let pdf_image = printpdf::Image::from_dynamic_image(&dynamic);
    let transform = ImageTransform {
        translate_x: Some(Mm(0.0)),
        translate_y: Some(Mm(0.0)),
        rotate: None,
        scale_x: Some(1.0),
        scale_y: Some(1.0),
        dpi: Some((LAYOUT_DPI * scale) as f32),
    };
    pdf_image.add_to_layer(doc.get_page(page).get_layer(layer), transform);

    let mut buffer = Vec::new();
    {
        let mut writer = std::io::BufWriter::new(&mut buffer);
        doc.save(&mut writer)
            .map_err(|err| RasterizeError::Pdf(err.to_string()))?;
    }
    Ok(buffer)
}

fn px_to_mm(px: f32) -> f32 {
    px / LAYOUT_DPI * 25.4
}

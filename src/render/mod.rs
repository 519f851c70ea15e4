//! The receipt rendering pipeline.
//!
//! [`template::render`] maps a layout plus receipt data onto a self-contained
//! SVG document; [`rasterize::DocumentRasterizer`] converts that document into
//! the two delivery formats (paginated PDF, print-density PNG). The template
//! step is pure and deterministic; all I/O and engine work lives behind the
//! rasterizer seam.

pub mod rasterize;
pub mod template;

pub use rasterize::{DocumentRasterizer, RasterOutput, RasterizeError, VectorRasterizer};
pub use template::{ReceiptDocument, render};

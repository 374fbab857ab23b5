//! # SVG Rasterization
//!
//! Turns SVG text into a PNG buffer (`Rasterizer`), then decodes and
//! re-encodes that buffer into an inline image payload for a model request
//! (`encode_snapshot`).

use crate::error::{self, Result};
use crate::provider::InlineImage;
use color::{DynamicColor, Srgb};
use resvg::tiny_skia;
use std::io::Cursor;
use std::str::FromStr;

/// Renders SVG text to an encoded raster image
pub trait Rasterizer {
    /// Render `svg` and return the encoded image bytes. Fails on malformed SVG.
    fn rasterize(&self, svg: &str) -> Result<Vec<u8>>;
}

/// Options for `ResvgRasterizer`
#[derive(Debug, Clone)]
pub struct RasterConfig {
    /// Output pixels per SVG user unit
    pub scale: f32,
    /// Fill painted under the drawing; transparent when `None`
    pub background: Option<[u8; 4]>,
    /// Load system fonts so `<text>` elements render
    pub load_system_fonts: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: None,
            load_system_fonts: true,
        }
    }
}

impl RasterConfig {
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_background(mut self, rgba: [u8; 4]) -> Self {
        self.background = Some(rgba);
        self
    }

    pub fn without_system_fonts(mut self) -> Self {
        self.load_system_fonts = false;
        self
    }
}

/// Rasterizer backed by `usvg` + `resvg`
pub struct ResvgRasterizer {
    options: usvg::Options<'static>,
    config: RasterConfig,
}

impl ResvgRasterizer {
    pub fn new(config: RasterConfig) -> Result<Self> {
        if !(config.scale.is_finite() && config.scale > 0.0) {
            return Err(error::invalid_argument(format!("scale must be positive, got {}", config.scale))
                .with_operation("raster::new"));
        }

        let mut options = usvg::Options::default();
        if config.load_system_fonts {
            options.fontdb_mut().load_system_fonts();
        }

        Ok(Self { options, config })
    }
}

impl Rasterizer for ResvgRasterizer {
    #[tracing::instrument(skip_all, fields(svg_len = svg.len()))]
    fn rasterize(&self, svg: &str) -> Result<Vec<u8>> {
        let tree = usvg::Tree::from_data(svg.as_bytes(), &self.options).map_err(|e| {
            error::render_failed(format!("parse svg tree: {}", e))
                .with_operation("raster::rasterize")
                .set_source(e)
        })?;

        let size = tree.size();
        let width = (size.width() * self.config.scale).ceil().max(1.0) as u32;
        let height = (size.height() * self.config.scale).ceil().max(1.0) as u32;

        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            error::render_failed(format!("cannot allocate {}x{} pixmap", width, height))
                .with_operation("raster::rasterize")
        })?;

        if let Some([r, g, b, a]) = self.config.background {
            pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
        }

        let transform = tiny_skia::Transform::from_scale(self.config.scale, self.config.scale);
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        tracing::debug!(width, height, "rendered svg");

        pixmap.encode_png().map_err(|e| {
            error::encode_failed(format!("encode png: {}", e))
                .with_operation("raster::rasterize")
                .set_source(e)
        })
    }
}

/// Decode a raster buffer and re-encode it as PNG for transport.
pub fn encode_snapshot(raster: &[u8]) -> Result<InlineImage> {
    let image = image::load_from_memory(raster).map_err(|e| {
        error::encode_failed(format!("decode raster: {}", e))
            .with_operation("raster::encode_snapshot")
            .set_source(e)
    })?;

    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| {
            error::encode_failed(format!("encode png: {}", e))
                .with_operation("raster::encode_snapshot")
                .set_source(e)
        })?;

    Ok(InlineImage::png(&buf))
}

/// Parse a CSS color ("teal", "#ffeedd", "rgb(255, 0, 0)", ...) into sRGB RGBA8.
pub fn parse_color(s: &str) -> Result<[u8; 4]> {
    let color = DynamicColor::from_str(s.trim()).map_err(|e| {
        error::invalid_argument(format!("invalid color '{}': {}", s, e)).with_operation("raster::parse_color")
    })?;
    let rgba = color.to_alpha_color::<Srgb>().to_rgba8();
    Ok([rgba.r, rgba.g, rgba.b, rgba.a])
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use redraw_error::ErrorKind;

    const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><rect width="4" height="2" fill="red"/></svg>"#;

    fn rasterizer(config: RasterConfig) -> ResvgRasterizer {
        ResvgRasterizer::new(config.without_system_fonts()).unwrap()
    }

    #[test]
    fn test_rasterize_produces_png_of_svg_size() {
        let png = rasterizer(RasterConfig::default()).rasterize(SQUARE).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_rasterize_scales() {
        let png = rasterizer(RasterConfig::default().with_scale(2.5)).rasterize(SQUARE).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (10, 5));
    }

    #[test]
    fn test_background_fill() {
        let empty = r#"<svg xmlns="http://www.w3.org/2000/svg" width="2" height="2"></svg>"#;

        let png = rasterizer(RasterConfig::default()).rasterize(empty).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(1, 1).0[3], 0);

        let png = rasterizer(RasterConfig::default().with_background([255, 255, 255, 255]))
            .rasterize(empty)
            .unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(1, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_rasterize_rejects_malformed_svg() {
        let r = rasterizer(RasterConfig::default());
        for bad in ["<svg", "exit", ""] {
            let err = r.rasterize(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RenderFailed, "input {:?}", bad);
        }
    }

    #[test]
    fn test_invalid_scale() {
        let err = ResvgRasterizer::new(RasterConfig::default().with_scale(0.0)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_encode_snapshot_roundtrips_through_png() {
        let png = rasterizer(RasterConfig::default()).rasterize(SQUARE).unwrap();
        let inline = encode_snapshot(&png).unwrap();
        assert_eq!(inline.mime_type, "image/png");

        let bytes = base64::engine::general_purpose::STANDARD.decode(&inline.data).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (4, 2));
    }

    #[test]
    fn test_encode_snapshot_rejects_corrupt_buffer() {
        let err = encode_snapshot(b"definitely not a png").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodeFailed);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("white").unwrap(), [255, 255, 255, 255]);
        assert_eq!(parse_color("#fff").unwrap(), [255, 255, 255, 255]);
        assert_eq!(parse_color("#102030").unwrap(), [16, 32, 48, 255]);
        assert_eq!(parse_color(" #10203040 ").unwrap(), [16, 32, 48, 64]);
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#zzzzzz").is_err());
    }

    #[test]
    fn test_parse_css_colors() {
        assert_eq!(parse_color("teal").unwrap(), [0, 128, 128, 255]);
        assert_eq!(parse_color("rgb(255, 0, 0)").unwrap(), [255, 0, 0, 255]);
        assert_eq!(parse_color("transparent").unwrap()[3], 0);

        let err = parse_color("not-a-color").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.operation(), "raster::parse_color");
    }
}

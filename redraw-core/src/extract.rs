//! # SVG Extraction
//!
//! Pulls the SVG out of free-form model output. The span runs from the
//! first `<svg` to the end of the last `</svg>`; whatever sits between
//! them (prose, a second drawing) is kept. Nothing inside is validated.

pub const SVG_OPEN: &str = "<svg";
pub const SVG_CLOSE: &str = "</svg>";

/// Slice the SVG span out of `text`, or `None` when there is none.
pub fn extract_svg(text: &str) -> Option<&str> {
    let start = text.find(SVG_OPEN)?;
    let end = text.rfind(SVG_CLOSE)? + SVG_CLOSE.len();
    if end <= start {
        return None;
    }
    text.get(start..end)
}

/// Something that can find an SVG fragment in a model response
pub trait SvgExtractor {
    /// The extracted fragment, or `None` for "not found"
    fn extract(&self, text: &str) -> Option<String>;
}

/// The first-open to last-close extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanExtractor;

impl SvgExtractor for SpanExtractor {
    fn extract(&self, text: &str) -> Option<String> {
        extract_svg(text).map(str::to_owned)
    }
}

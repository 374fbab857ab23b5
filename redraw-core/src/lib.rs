//! # redraw-core
//!
//! The pieces the drawing loop is assembled from:
//!
//! - **Provider**: multimodal model clients (Gemini, OpenAI-compatible)
//! - **Raster**: SVG text to PNG, and PNG to an inline request payload
//! - **Extract**: locate the SVG span in free-form model output
//! - **Storage**: where each generated SVG is written

pub mod error;
pub mod extract;
pub mod provider;
pub mod raster;
pub mod storage;

pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use extract::{extract_svg, SpanExtractor, SvgExtractor};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, ContentPart, FinishReason, GeminiProvider,
    InlineImage, LlmProvider, OpenAIProvider, Provider, ProviderConfig, ProviderError,
    ProviderType, Role, Usage, UsageTracker,
};
pub use raster::{encode_snapshot, parse_color, RasterConfig, Rasterizer, ResvgRasterizer};
pub use storage::{ArtifactName, ArtifactStore, FileStore, MemoryStore};

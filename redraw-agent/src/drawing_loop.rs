//! Drawing loop - generate, render, identify, redraw

use redraw_core::error::{self, Error, Result};
use redraw_core::{
    encode_snapshot, ArtifactName, ArtifactStore, ChatMessage, CompletionRequest,
    CompletionResponse, LlmProvider, Rasterizer, SvgExtractor, UsageTracker,
};
use tracing::{debug, info, warn};

pub const DEFAULT_PROMPT: &str = "A smiling sun over a green hill";
pub const DEFAULT_ITERATIONS: usize = 3;

pub const REDRAW_INSTRUCTION: &str = "First, in one sentence, identify the main subject of this image. \
Then, draw this identified subject as a new, simple SVG and return only the SVG code.";

/// Instruction for the very first drawing.
///
/// The model is told to answer `exit` for prompts that are not drawings, but
/// the answer is stored as-is either way.
pub fn initial_instruction(prompt: &str) -> String {
    format!(
        "The user will describe a prompt for you to draw. If it does not sound like the \
description of a drawing simply return the word \"exit\". Otherwise draw the image as an SVG \
and return only the SVG text so it can be used as svg file. The prompt is: {}",
        prompt
    )
}

/// Per-request settings for the loop
#[derive(Debug, Clone, Default)]
pub struct LoopConfig {
    /// Model override; the provider's default model when `None`
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

/// How the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    /// Every requested iteration ran
    Completed,
    /// No SVG could be extracted in `iteration`; later iterations were skipped
    Aborted { iteration: usize },
}

/// Result of a full run
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// The last SVG Document that was accepted
    pub svg: String,
    pub completed_iterations: usize,
    pub status: LoopStatus,
    /// Artifacts written, in order
    pub artifacts: Vec<ArtifactName>,
    pub usage: UsageTracker,
}

/// Owns the current SVG and the collaborators it passes through.
pub struct DrawingLoop<P, R, E, S> {
    provider: P,
    rasterizer: R,
    extractor: E,
    store: S,
    config: LoopConfig,
    usage: UsageTracker,
}

impl<P, R, E, S> DrawingLoop<P, R, E, S>
where
    P: LlmProvider,
    R: Rasterizer,
    E: SvgExtractor,
    S: ArtifactStore,
{
    pub fn new(provider: P, rasterizer: R, extractor: E, store: S) -> Self {
        Self {
            provider,
            rasterizer,
            extractor,
            store,
            config: LoopConfig::default(),
            usage: UsageTracker::new(),
        }
    }

    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Usage accumulated by the most recent run
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn into_parts(self) -> (P, R, E, S) {
        (self.provider, self.rasterizer, self.extractor, self.store)
    }

    /// Draw `prompt`, then run up to `iterations` identify-and-redraw rounds.
    ///
    /// A round whose response holds no SVG stops the loop with
    /// `LoopStatus::Aborted`; that is not an error. Provider, render and
    /// storage failures are errors and leave earlier artifacts in place.
    #[tracing::instrument(skip(self, prompt))]
    pub async fn run(&mut self, prompt: &str, iterations: usize) -> Result<LoopOutcome> {
        self.usage = UsageTracker::new();

        let mut svg = self.generate_initial(prompt).await?;
        self.persist(ArtifactName::Initial, &svg)?;

        let mut artifacts = vec![ArtifactName::Initial];
        let mut status = LoopStatus::Completed;
        let mut completed_iterations = 0;

        for iteration in 1..=iterations {
            info!("--- Iteration {} of {} ---", iteration, iterations);

            match self.redraw(&svg, iteration).await? {
                Some(next) => {
                    svg = next;
                    let name = ArtifactName::Iteration(iteration);
                    self.persist(name, &svg)?;
                    artifacts.push(name);
                    completed_iterations = iteration;
                }
                None => {
                    status = LoopStatus::Aborted { iteration };
                    break;
                }
            }
        }

        info!(
            calls = self.usage.total_calls,
            tokens = self.usage.total_tokens(),
            "Loop finished after {} of {} iterations",
            completed_iterations,
            iterations
        );

        Ok(LoopOutcome {
            svg,
            completed_iterations,
            status,
            artifacts,
            usage: self.usage.clone(),
        })
    }

    async fn generate_initial(&mut self, prompt: &str) -> Result<String> {
        info!("Generating initial SVG...");

        let request = self.request(vec![ChatMessage::user(initial_instruction(prompt))]);
        let response = self.exchange(request, "drawing_loop::generate_initial").await?;

        let svg = response.content.ok_or_else(|| {
            Error::inference_failed("No content in response")
                .with_operation("drawing_loop::generate_initial")
                .with_context("model", response.model.clone())
        })?;

        info!("--- LLM response for initial SVG ---\n{}\n------------------------------------", svg);
        Ok(svg)
    }

    /// One identify-and-redraw round. `Ok(None)` means no SVG was found.
    async fn redraw(&mut self, svg: &str, iteration: usize) -> Result<Option<String>> {
        let in_round = |e: Error| {
            e.with_operation("drawing_loop::redraw")
                .with_context("iteration", iteration.to_string())
        };

        info!("Rendering SVG to image...");
        let raster = self.rasterizer.rasterize(svg).map_err(in_round)?;
        let snapshot = encode_snapshot(&raster).map_err(in_round)?;

        info!("Identifying image and preparing to redraw...");
        let request = self.request(vec![ChatMessage::user_with_image(REDRAW_INSTRUCTION, snapshot)]);
        let response = self.exchange(request, "drawing_loop::redraw").await.map_err(in_round)?;

        let Some(text) = response.content else {
            warn!("Error extracting SVG in iteration {}: response contained no text", iteration);
            return Ok(None);
        };

        match self.extractor.extract(&text) {
            Some(next) => Ok(Some(next)),
            None => {
                warn!("Error extracting SVG in iteration {}: no <svg>...</svg> span found", iteration);
                warn!("Full response from LLM: {}", text);
                Ok(None)
            }
        }
    }

    fn request(&self, messages: Vec<ChatMessage>) -> CompletionRequest {
        let request = CompletionRequest::new(messages).with_model_opt(self.config.model.as_deref());
        match self.config.temperature {
            Some(temp) => request.with_temperature(temp),
            None => request,
        }
    }

    async fn exchange(
        &mut self,
        request: CompletionRequest,
        operation: &'static str,
    ) -> Result<CompletionResponse> {
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| error::provider_failed(self.provider.name(), e).with_operation(operation))?;

        debug!(
            model = %response.model,
            finish_reason = ?response.finish_reason,
            tokens = response.usage.total_tokens,
            "model responded"
        );
        self.usage.track(&response.model, &response.usage);
        Ok(response)
    }

    fn persist(&mut self, name: ArtifactName, svg: &str) -> Result<()> {
        self.store
            .save(name, svg)
            .map_err(|e| e.with_operation("drawing_loop::persist"))?;
        info!("SVG saved as {}", self.store.location(name));
        Ok(())
    }
}

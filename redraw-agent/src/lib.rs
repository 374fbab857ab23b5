//! # Redraw Agent
//!
//! The agent drives the draw -> look -> redraw loop:
//! 1. The model draws an SVG from a text prompt
//! 2. The SVG is rasterized and shown back to the model
//! 3. The model names the subject and draws it again
//! 4. The extracted SVG becomes the input of the next round
//! 5. A response without an SVG ends the loop early
//!
//! Every SVG along the way is persisted.

mod drawing_loop;

pub use drawing_loop::{
    initial_instruction, DrawingLoop, LoopConfig, LoopOutcome, LoopStatus, DEFAULT_ITERATIONS,
    DEFAULT_PROMPT, REDRAW_INSTRUCTION,
};

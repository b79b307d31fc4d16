// src/agent/mod.rs
pub mod pipeline;
pub mod state;

pub use pipeline::{PromotionPipeline, MAX_ITERATIONS};
pub use state::{PipelineStep, PromotionReport, VideoOutcome};

// lib.rs - Project promotion agent: generate a post, record a demo, publish to LinkedIn
pub mod agent;
pub mod completion;
pub mod config;
pub mod grok_client;
pub mod linkedin_client;
pub mod ollama_client;
pub mod post_generator;
pub mod publisher;
pub mod recorder;
pub mod types;
pub mod utils;

// Re-export commonly used types for convenience
pub use agent::{PromotionPipeline, PromotionReport, VideoOutcome};
pub use completion::{build_backend, CompletionBackend, CompletionError};
pub use config::{ConfigError, LlmProvider, Settings};
pub use post_generator::PostGenerator;
pub use publisher::Publisher;
pub use recorder::{RecordError, VideoRecorder};
pub use types::*;

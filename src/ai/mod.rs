//! LLM Integration Layer
//!
//! Everything between a rendered context record and a stored model answer:
//! prompt rendering, token counting, the guarded provider, the batch runner and
//! answer parsing.

pub mod prompt;
pub mod provider;
pub mod runner;
pub mod tokenizer;
pub mod validation;

pub use prompt::{PromptGenerator, PromptManifest, PromptRenderer, PromptSet, strip_context_header};
pub use provider::{
    ErrorCategory, ErrorClassifier, GuardedProvider, LlmError, LlmProvider, LlmResponse,
    OpenAiCompatibleProvider, ResponseMetadata, ResponseTiming, SharedProvider, TokenGuard,
    TokenUsage, create_provider,
};
pub use runner::{DetectionRunner, DetectionSummary, list_prompts};
pub use tokenizer::{Encoding, TokenCounter};
pub use validation::{DetectionParser, JsonRepairer, Repair};

//! LLM Provider Abstraction
//!
//! Defines the `LlmProvider` trait: one `generate(prompt) -> text` capability.
//! All providers return `LlmResponse` with token usage and timing.
//!
//! ## Modules
//!
//! - `guard`: input-size precondition checked before any network call
//! - `openai`: OpenAI-compatible chat-completions endpoints (OpenAI, DeepSeek, OpenRouter)

mod guard;
mod openai;

pub use guard::{GuardedProvider, TokenGuard};
pub use openai::OpenAiCompatibleProvider;

pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ai::tokenizer::TokenCounter;
use crate::config::EngineConfig;
use crate::types::Result;

// =============================================================================
// LLM Response with Usage Metrics
// =============================================================================

/// Complete LLM response including content, usage and timing
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Raw generated text
    pub content: String,
    /// Token usage metrics
    pub usage: TokenUsage,
    /// Response timing
    pub timing: ResponseTiming,
    /// Provider and model info
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Create response with content only (usage unknown)
    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (response)
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    /// Create from OpenAI-style usage response
    pub fn from_openai(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            input_tokens: prompt_tokens,
            output_tokens: completion_tokens,
        }
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseTiming {
    /// Total response time in milliseconds (wall clock)
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

/// Response metadata
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    /// Model used
    pub model: String,
    /// Provider name
    pub provider: String,
    /// Why generation stopped (`stop`, `length`, ...)
    pub finish_reason: Option<String>,
}

/// Shared LLM provider type for concurrent access across detection workers
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Create a guarded provider for a configured engine
pub fn create_provider(engine_name: &str, config: &EngineConfig) -> Result<SharedProvider> {
    let inner = OpenAiCompatibleProvider::from_engine(engine_name, config)?;
    let guard = TokenGuard::new(
        config.max_input_tokens,
        TokenCounter::for_name(&config.encoding),
    );
    Ok(Arc::new(GuardedProvider::new(Arc::new(inner), guard)))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_from_openai() {
        let usage = TokenUsage::from_openai(100, 50);
        assert_eq!(usage.input_tokens, 100);
        assert_eq!(usage.output_tokens, 50);
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn test_create_provider_requires_key() {
        let config = EngineConfig {
            api_key_env: "SMELLSCOPE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..EngineConfig::default()
        };
        assert!(create_provider("gpt", &config).is_err());
    }
}

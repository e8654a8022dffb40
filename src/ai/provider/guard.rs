//! Input-size precondition
//!
//! `token_count(prompt) <= max_input_tokens` is checked before delegating, so an
//! oversize prompt fails with `PromptTooLarge` without touching the network.

use async_trait::async_trait;
use tracing::debug;

use super::{LlmProvider, LlmResponse, SharedProvider};
use crate::ai::tokenizer::TokenCounter;
use crate::types::{Result, SmellError};

#[derive(Debug, Clone, Copy)]
pub struct TokenGuard {
    max_input_tokens: usize,
    counter: TokenCounter,
}

impl TokenGuard {
    pub fn new(max_input_tokens: usize, counter: TokenCounter) -> Self {
        Self {
            max_input_tokens,
            counter,
        }
    }

    pub fn limit(&self) -> usize {
        self.max_input_tokens
    }

    /// Token count of `prompt`, or `PromptTooLarge`
    pub fn check(&self, prompt: &str) -> Result<usize> {
        let tokens = self.counter.count(prompt);
        if tokens > self.max_input_tokens {
            return Err(SmellError::PromptTooLarge {
                tokens,
                limit: self.max_input_tokens,
            });
        }
        Ok(tokens)
    }
}

pub struct GuardedProvider {
    inner: SharedProvider,
    guard: TokenGuard,
}

impl GuardedProvider {
    pub fn new(inner: SharedProvider, guard: TokenGuard) -> Self {
        Self { inner, guard }
    }
}

#[async_trait]
impl LlmProvider for GuardedProvider {
    async fn generate(&self, prompt: &str) -> Result<LlmResponse> {
        let tokens = self.guard.check(prompt)?;
        debug!(
            "Prompt within budget ({} / {} tokens)",
            tokens,
            self.guard.limit()
        );
        self.inner.generate(prompt).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::MockProvider;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_oversize_prompt_never_reaches_provider() {
        let mock = Arc::new(MockProvider::answering("{}"));
        let guarded =
            GuardedProvider::new(mock.clone(), TokenGuard::new(5, TokenCounter::default()));

        let prompt = "public class Parser extends Base implements Runnable { }";
        let err = guarded.generate(prompt).await.unwrap_err();

        assert!(matches!(err, SmellError::PromptTooLarge { limit: 5, .. }));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_within_budget_delegates() {
        let mock = Arc::new(MockProvider::answering("{\"detection\": false}"));
        let guarded =
            GuardedProvider::new(mock.clone(), TokenGuard::new(1000, TokenCounter::default()));

        let response = guarded.generate("short prompt").await.unwrap();
        assert_eq!(response.content, "{\"detection\": false}");
        assert_eq!(mock.calls(), 1);
        assert_eq!(guarded.name(), "mock");
    }
}

//! Prompt Rendering
//!
//! Detection prompts are plain string substitution into a per-smell template:
//!
//! - `{SMELL_NAME}`: display name of the smell
//! - `{SMELL_DEFINITION}`: the smell's definition
//! - `{INPUT_DATA}`: pretty-printed context record
//!
//! A rendered prompt may carry a `##CONTEXT_SIZE=<tokens>` first line followed
//! by a blank line. The annotation is for bookkeeping and is stripped before
//! the text is sent to a model.

mod generator;

pub use generator::{PromptGenerator, PromptManifest, PromptSet};

use crate::ai::tokenizer::TokenCounter;
use crate::constants::prompt;
use crate::context::ContextItem;
use crate::types::{Result, SmellKind};

#[derive(Debug, Clone)]
pub struct PromptRenderer {
    template: String,
    smell: SmellKind,
    counter: Option<TokenCounter>,
}

impl PromptRenderer {
    pub fn new(template: impl Into<String>, smell: SmellKind) -> Self {
        Self {
            template: template.into(),
            smell,
            counter: None,
        }
    }

    /// Prefix rendered prompts with the token count of their body
    pub fn with_context_size(mut self, counter: TokenCounter) -> Self {
        self.counter = Some(counter);
        self
    }

    pub fn render(&self, item: &ContextItem) -> Result<String> {
        let data = serde_json::to_string_pretty(&item.payload)?;
        // input data last, so placeholders inside the data stay literal
        let body = self
            .template
            .replace(prompt::SMELL_NAME_PLACEHOLDER, self.smell.display_name())
            .replace(prompt::SMELL_DEFINITION_PLACEHOLDER, self.smell.definition())
            .replace(prompt::INPUT_DATA_PLACEHOLDER, &data);

        Ok(match &self.counter {
            Some(counter) => format!(
                "{}{}\n\n{}",
                prompt::CONTEXT_SIZE_PREFIX,
                counter.count(&body),
                body
            ),
            None => body,
        })
    }
}

/// Split off the `##CONTEXT_SIZE` annotation, if any
pub fn strip_context_header(text: &str) -> (Option<usize>, &str) {
    let Some(rest) = text.strip_prefix(prompt::CONTEXT_SIZE_PREFIX) else {
        return (None, text);
    };

    let (value, body) = match rest.split_once('\n') {
        Some((line, body)) => (line, body),
        None => (rest, ""),
    };
    let body = body.strip_prefix("\r\n").or_else(|| body.strip_prefix('\n')).unwrap_or(body);
    (value.trim().parse().ok(), body)
}

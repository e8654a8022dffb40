//! Prompt set generation: one file per context item plus a manifest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::PromptRenderer;
use crate::ai::tokenizer::TokenCounter;
use crate::config::PromptConfig;
use crate::constants::prompt;
use crate::context::{ModelIndex, builder_for};
use crate::storage::{ProjectLayout, write_atomic, write_json_atomic};
use crate::types::{ProjectModel, Result, SmellError, SmellKind};

/// Prompt file stem → entity identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptManifest {
    entries: BTreeMap<String, String>,
}

impl PromptManifest {
    pub fn insert(&mut self, stem: impl Into<String>, identifier: impl Into<String>) {
        self.entries.insert(stem.into(), identifier.into());
    }

    pub fn identifier(&self, stem: &str) -> Option<&str> {
        self.entries.get(stem).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a manifest; `None` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

/// Result of one generation run
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub smell: SmellKind,
    pub dir: PathBuf,
    pub manifest: PromptManifest,
}

pub struct PromptGenerator<'a> {
    layout: &'a ProjectLayout,
    config: PromptConfig,
}

impl<'a> PromptGenerator<'a> {
    pub fn new(layout: &'a ProjectLayout, config: PromptConfig) -> Self {
        Self { layout, config }
    }

    fn renderer(&self, smell: SmellKind) -> Result<PromptRenderer> {
        let path = self.layout.template(smell);
        if !path.exists() {
            return Err(SmellError::missing("prompt template", &path));
        }
        let template = std::fs::read_to_string(&path)?;
        let renderer = PromptRenderer::new(template, smell);

        Ok(if self.config.context_size_header {
            renderer.with_context_size(TokenCounter::for_name(&self.config.encoding))
        } else {
            renderer
        })
    }

    /// Render and write every prompt for `smell`
    pub fn generate(&self, smell: SmellKind, model: &ProjectModel) -> Result<PromptSet> {
        let renderer = self.renderer(smell)?;
        let index = ModelIndex::new(model);
        let items = builder_for(smell).build(&index)?;

        let dir = self.layout.prompts_dir(smell);
        let mut manifest = PromptManifest::default();

        for item in &items {
            let text = renderer.render(item)?;
            let path = dir.join(format!("{}.{}", item.file_stem, prompt::PROMPT_EXTENSION));
            write_atomic(&path, text)?;
            debug!("Wrote prompt {}", path.display());
            manifest.insert(item.file_stem.clone(), item.identifier.clone());
        }

        write_json_atomic(&self.layout.prompt_manifest(smell), &manifest)?;
        info!(
            "Generated {} {} prompts for {}",
            manifest.len(),
            smell,
            self.layout.project()
        );

        Ok(PromptSet {
            smell,
            dir,
            manifest,
        })
    }
}

//! Detection Runner
//!
//! Sends every prompt of one (project, smell) pair to one engine and stores the
//! raw answers. Prompts run concurrently up to `detection.concurrency`; every
//! prompt owns its output path, so workers never contend on a file.
//!
//! Per prompt:
//! 1. skip when the answer already exists (`skip_existing`)
//! 2. strip the `##CONTEXT_SIZE` annotation
//! 3. generate, retrying recoverable failures with exponential backoff
//! 4. write the answer atomically
//!
//! Oversize prompts and failed calls are reported in the summary, never fatal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::prompt::{PromptManifest, strip_context_header};
use super::provider::SharedProvider;
use crate::config::DetectionConfig;
use crate::constants::{prompt, retry};
use crate::storage::{ProjectLayout, write_atomic};
use crate::types::{Result, SmellError, SmellKind};

/// What happened to one prompt
#[derive(Debug)]
enum Outcome {
    Written,
    Skipped,
    Oversize { tokens: usize, limit: usize },
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct DetectionSummary {
    pub written: usize,
    pub skipped: usize,
    /// Prompt stems rejected by the input-token guard
    pub oversize: Vec<String>,
    /// Prompt stem and error message
    pub failed: Vec<(String, String)>,
}

impl DetectionSummary {
    pub fn total(&self) -> usize {
        self.written + self.skipped + self.oversize.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    fn record(&mut self, stem: String, outcome: Outcome) {
        match outcome {
            Outcome::Written => self.written += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Oversize { tokens, limit } => {
                warn!("Skipped {}: {} tokens exceeds {}", stem, tokens, limit);
                self.oversize.push(stem);
            }
            Outcome::Failed(message) => {
                warn!("Detection failed for {}: {}", stem, message);
                self.failed.push((stem, message));
            }
        }
    }
}

pub struct DetectionRunner {
    provider: SharedProvider,
    engine: String,
    settings: DetectionConfig,
    base_delay: Duration,
}

impl DetectionRunner {
    pub fn new(
        provider: SharedProvider,
        engine: impl Into<String>,
        settings: DetectionConfig,
    ) -> Self {
        Self {
            provider,
            engine: engine.into(),
            settings,
            base_delay: Duration::from_millis(retry::BASE_DELAY_MS),
        }
    }

    /// First retry delay; later delays double up to the cap
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(Duration::from_secs(retry::MAX_DELAY_SECS))
            .with_max_times(self.settings.max_retries)
            .with_jitter()
    }

    /// Run every prompt generated for `smell`
    pub async fn run(&self, layout: &ProjectLayout, smell: SmellKind) -> Result<DetectionSummary> {
        let prompts = prompt_set(layout, smell)?;
        info!(
            "Running {} {} prompts for {} on {}",
            prompts.len(),
            smell,
            layout.project(),
            self.engine
        );

        let mut summary = DetectionSummary::default();
        let mut stream = futures::stream::iter(prompts)
            .map(|path| async move {
                let output = layout.llm_output_for(smell, &self.engine, &path);
                let stem = stem_of(&path);
                (stem, self.process(&path, &output).await)
            })
            .buffer_unordered(self.settings.concurrency.max(1));

        while let Some((stem, outcome)) = stream.next().await {
            summary.record(stem, outcome);
        }

        info!(
            "{} {}: {} written, {} skipped, {} oversize, {} failed",
            layout.project(),
            smell,
            summary.written,
            summary.skipped,
            summary.oversize.len(),
            summary.failed.len()
        );
        Ok(summary)
    }

    async fn process(&self, prompt_path: &Path, output: &Path) -> Outcome {
        if self.settings.skip_existing && output.exists() {
            debug!("Answer exists, skipping {}", output.display());
            return Outcome::Skipped;
        }

        let text = match tokio::fs::read_to_string(prompt_path).await {
            Ok(text) => text,
            Err(e) => return Outcome::Failed(format!("cannot read prompt: {}", e)),
        };
        let (_, body) = strip_context_header(&text);
        let body = body.to_string();

        let provider = self.provider.clone();
        let engine = self.engine.clone();
        let result = (move || {
            let provider = provider.clone();
            let body = body.clone();
            async move { provider.generate(&body).await }
        })
        .retry(self.backoff())
        .when(|e: &SmellError| e.is_recoverable())
        .notify(|e: &SmellError, delay: Duration| {
            warn!("{} call failed ({}), retrying in {:?}", engine, e, delay);
        })
        .await;

        match result {
            Ok(response) => match write_atomic(output, response.content) {
                Ok(()) => Outcome::Written,
                Err(e) => Outcome::Failed(e.to_string()),
            },
            Err(SmellError::PromptTooLarge { tokens, limit }) => Outcome::Oversize { tokens, limit },
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

/// Prompt files of the current set: the manifest's stems when there is one,
/// otherwise every prompt file in the directory
fn prompt_set(layout: &ProjectLayout, smell: SmellKind) -> Result<Vec<PathBuf>> {
    let dir = layout.prompts_dir(smell);
    match PromptManifest::load(&layout.prompt_manifest(smell))? {
        Some(manifest) => Ok(manifest
            .iter()
            .map(|(stem, _)| dir.join(format!("{}.{}", stem, prompt::PROMPT_EXTENSION)))
            .collect()),
        None => list_prompts(&dir),
    }
}

/// Prompt files of one set, sorted by name
pub fn list_prompts(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SmellError::missing("prompt directory", dir));
    }

    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        prompt::PROMPT_EXTENSION
    );

    let mut prompts: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| SmellError::Config(format!("Invalid prompt pattern: {}", e)))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    prompts.sort();
    Ok(prompts)
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::PromptGenerator;
    use crate::ai::provider::mock::MockProvider;
    use crate::ai::provider::{GuardedProvider, TokenGuard};
    use crate::ai::tokenizer::TokenCounter;
    use crate::config::{AnalyzerConfig, PathsConfig, PromptConfig};
    use crate::context::fixtures;
    use crate::metrics::{DependencyGraph, GraphAssembler};
    use crate::storage::write_json_atomic;
    use crate::types::{ClassEntity, ErrorCategory, LlmError};
    use std::sync::Arc;
    use tempfile::TempDir;

    const SMELL: SmellKind = SmellKind::GodComponent;

    fn layout(dir: &TempDir) -> ProjectLayout {
        let paths = PathsConfig {
            repositories_dir: dir.path().join("repos"),
            output_dir: dir.path().join("out"),
            templates_dir: dir.path().join("templates"),
        };
        ProjectLayout::new("demo", paths, AnalyzerConfig::default())
    }

    fn write_manifest(layout: &ProjectLayout, stems: &[&str]) {
        let mut manifest = PromptManifest::default();
        for stem in stems {
            manifest.insert(*stem, *stem);
        }
        write_json_atomic(&layout.prompt_manifest(SMELL), &manifest).unwrap();
    }

    fn write_prompt(layout: &ProjectLayout, stem: &str, body: &str) {
        let path = layout.prompts_dir(SMELL).join(format!("{}.txt", stem));
        write_atomic(&path, format!("##CONTEXT_SIZE=3\n\n{}", body)).unwrap();
    }

    fn runner(provider: SharedProvider) -> DetectionRunner {
        DetectionRunner::new(provider, "mock", DetectionConfig::default())
            .with_base_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_run_writes_answers_and_skips_existing() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        write_prompt(&layout, "a", "judge package a");
        write_prompt(&layout, "b", "judge package b");
        write_manifest(&layout, &["a", "b"]);

        let mock = Arc::new(MockProvider::answering("{\"detection\": true}"));
        let summary = runner(mock.clone()).run(&layout, SMELL).await.unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(summary.total(), 2);
        assert_eq!(mock.calls(), 2);
        // annotation never reaches the model
        assert!(mock.prompts.lock().unwrap().iter().all(|p| p.starts_with("judge package")));

        let answer = layout.llm_outputs_dir(SMELL, "mock").join("a.txt");
        assert_eq!(std::fs::read_to_string(answer).unwrap(), "{\"detection\": true}");

        let again = runner(mock.clone()).run(&layout, SMELL).await.unwrap();
        assert_eq!(again.skipped, 2);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_recoverable_errors_are_retried() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        write_prompt(&layout, "a", "judge");

        let mock = Arc::new(MockProvider::new(vec![
            Err(LlmError::new(ErrorCategory::RateLimit, "slow down").into()),
            Err(LlmError::new(ErrorCategory::Transient, "overloaded").into()),
            Ok("{}".to_string()),
        ]));
        let summary = runner(mock.clone()).run(&layout, SMELL).await.unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_fatal_errors_are_reported() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        write_prompt(&layout, "a", "judge");

        let mock = Arc::new(MockProvider::new(vec![Err(
            LlmError::new(ErrorCategory::Auth, "bad key").into(),
        )]));
        let summary = runner(mock.clone()).run(&layout, SMELL).await.unwrap();

        assert!(summary.has_failures());
        assert_eq!(summary.failed[0].0, "a");
        assert_eq!(mock.calls(), 1);
        assert!(!layout.llm_outputs_dir(SMELL, "mock").join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_oversize_prompts_are_skipped() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        write_prompt(&layout, "big", &"public class Parser {}\n".repeat(20));

        let mock = Arc::new(MockProvider::answering("{}"));
        let guarded = Arc::new(GuardedProvider::new(
            mock.clone(),
            TokenGuard::new(10, TokenCounter::default()),
        ));
        let summary = runner(guarded).run(&layout, SMELL).await.unwrap();

        assert_eq!(summary.oversize, vec!["big".to_string()]);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_prompt_directory() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        let mock = Arc::new(MockProvider::answering("{}"));
        let err = runner(mock).run(&layout, SMELL).await.unwrap_err();
        assert!(matches!(err, SmellError::InputMissing { .. }));
    }

    #[tokio::test]
    async fn test_regenerated_set_ignores_stale_prompts() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        let template = layout.template(SMELL);
        std::fs::create_dir_all(template.parent().unwrap()).unwrap();
        std::fs::write(&template, "{SMELL_NAME}\n{INPUT_DATA}").unwrap();

        let generator = PromptGenerator::new(&layout, PromptConfig::default());
        generator.generate(SMELL, &fixtures::model()).unwrap();

        let smaller = GraphAssembler::assemble(
            "demo",
            vec![ClassEntity::new("a", "X")],
            &DependencyGraph::new(),
        );
        let set = generator.generate(SMELL, &smaller).unwrap();
        assert_eq!(set.manifest.len(), 1);
        // files of the previous set are still on disk
        assert!(list_prompts(&set.dir).unwrap().len() > 1);

        let mock = Arc::new(MockProvider::answering("{\"detection\": false}"));
        let summary = runner(mock.clone()).run(&layout, SMELL).await.unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(mock.calls(), set.manifest.len());
        assert!(layout.llm_outputs_dir(SMELL, "mock").join("a.txt").exists());
        assert!(!layout.llm_outputs_dir(SMELL, "mock").join("b.txt").exists());
    }

    #[tokio::test]
    async fn test_run_without_manifest_lists_directory() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        write_prompt(&layout, "a", "judge a");
        write_prompt(&layout, "b", "judge b");

        let mock = Arc::new(MockProvider::answering("{}"));
        let summary = runner(mock.clone()).run(&layout, SMELL).await.unwrap();
        assert_eq!(summary.written, 2);
    }
}

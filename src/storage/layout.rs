//! Per-project file layout
//!
//! Every artifact path is derived from the configured roots plus project, smell
//! and engine, so parallel workers never share an output file.

use std::path::{Path, PathBuf};

use crate::config::{AnalyzerConfig, PathsConfig};
use crate::constants::{model, prompt, scoring};
use crate::types::SmellKind;

/// Which side of the comparison a consolidated label set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    Llm,
    Analyzer,
}

impl LabelSource {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Analyzer => "analyzer",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectLayout {
    project: String,
    paths: PathsConfig,
    analyzer: AnalyzerConfig,
}

impl ProjectLayout {
    pub fn new(project: impl Into<String>, paths: PathsConfig, analyzer: AnalyzerConfig) -> Self {
        Self {
            project: project.into(),
            paths,
            analyzer,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Checkout of the analyzed project
    pub fn project_root(&self) -> PathBuf {
        self.paths.repositories_dir.join(&self.project)
    }

    // ===== Analyzer outputs =====

    pub fn metrics_dir(&self) -> PathBuf {
        self.paths.output_dir.join("metrics").join(&self.project)
    }

    pub fn type_metrics(&self) -> PathBuf {
        self.metrics_dir().join(&self.analyzer.type_metrics_file)
    }

    pub fn method_metrics(&self) -> PathBuf {
        self.metrics_dir().join(&self.analyzer.method_metrics_file)
    }

    pub fn dependency_graph(&self) -> PathBuf {
        self.metrics_dir().join(&self.analyzer.dependency_graph_file)
    }

    /// Analyzer table holding the verdicts for `smell`
    pub fn smell_table(&self, smell: SmellKind) -> PathBuf {
        let file = match smell.analyzer_table() {
            crate::types::AnalyzerTable::Architecture => &self.analyzer.architecture_smells_file,
            crate::types::AnalyzerTable::Design => &self.analyzer.design_smells_file,
        };
        self.metrics_dir().join(file)
    }

    pub fn project_model(&self) -> PathBuf {
        self.metrics_dir().join(model::PROJECT_MODEL_FILE)
    }

    // ===== Prompts =====

    pub fn template(&self, smell: SmellKind) -> PathBuf {
        self.paths.templates_dir.join(smell.template_file())
    }

    pub fn prompts_dir(&self, smell: SmellKind) -> PathBuf {
        self.paths
            .output_dir
            .join("prompts")
            .join("smell_detection")
            .join(smell.slug())
            .join(&self.project)
    }

    pub fn prompt_manifest(&self, smell: SmellKind) -> PathBuf {
        self.prompts_dir(smell).join(prompt::MANIFEST_FILE)
    }

    // ===== LLM outputs =====

    pub fn llm_outputs_dir(&self, smell: SmellKind, engine: &str) -> PathBuf {
        self.paths
            .output_dir
            .join("llm_outputs")
            .join(&self.project)
            .join(smell.slug())
            .join(engine)
    }

    /// Output file answering the prompt at `prompt_file` (same stem)
    pub fn llm_output_for(&self, smell: SmellKind, engine: &str, prompt_file: &Path) -> PathBuf {
        let stem = prompt_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.llm_outputs_dir(smell, engine)
            .join(format!("{}.{}", stem, prompt::PROMPT_EXTENSION))
    }

    // ===== Consolidation and scoring =====

    pub fn consolidated_dir(&self, smell: SmellKind, engine: &str) -> PathBuf {
        self.paths
            .output_dir
            .join("consolidated_detection")
            .join(&self.project)
            .join(smell.slug())
            .join(engine)
    }

    pub fn labels(&self, smell: SmellKind, engine: &str, source: LabelSource) -> PathBuf {
        self.consolidated_dir(smell, engine)
            .join(format!("{}_{}.json", smell.slug(), source.suffix()))
    }

    pub fn metrics_report(&self, smell: SmellKind, engine: &str) -> PathBuf {
        self.consolidated_dir(smell, engine)
            .join(format!("{}_metrics.json", smell.slug()))
    }

    pub fn aggregate_results(&self, engine: &str) -> PathBuf {
        self.paths
            .output_dir
            .join("results")
            .join(&self.project)
            .join(engine)
            .join(scoring::AGGREGATE_RESULTS_FILE)
    }
}

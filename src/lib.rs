//! smellscope - Architectural Smell Detection Benchmark
//!
//! Rebuilds a consistent package/class dependency model of a Java project from
//! static-analyzer outputs, renders smell-specific neighborhoods as LLM prompts,
//! and scores LLM verdicts against the analyzer's own smell detections.
//!
//! ## Pipeline
//!
//! 1. [`metrics`]: metrics table + dependency graph → [`ProjectModel`]
//! 2. [`context`]: model → one record per analyzed package or class
//! 3. [`ai`]: records → prompts → guarded LLM calls → raw answers
//! 4. [`scoring`]: answers and analyzer verdicts → confusion matrix and scores
//!
//! ## Quick Start
//!
//! ```ignore
//! use smellscope::{Config, MetricsCollector, ProjectLayout};
//!
//! let config = Config::default();
//! let layout = ProjectLayout::new("jsoup", config.paths.clone(), config.analyzer.clone());
//! let model = MetricsCollector::new(layout, config.analyzer.clone()).collect()?;
//! println!("{} packages", model.summary().total_packages);
//! ```
//!
//! ## Smells
//!
//! - God Component (package)
//! - Insufficient Modularization (class)
//! - Unstable Dependency (package)
//! - Hub-like Modularization (class)

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod context;
pub mod metrics;
pub mod scoring;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, EngineConfig, PathRootPolicy};

// Error Types
pub use types::error::{ErrorCategory, LlmError, Result, SmellError};

// Model
pub use types::{
    ClassEntity, ClassMetrics, DetectionRecord, Granularity, PackageEntity, PackageMetrics,
    ProjectModel, ProjectSummary, SmellKind,
};

// Storage
pub use storage::{LabelSource, ProjectLayout, write_atomic, write_json_atomic};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use context::{ContextBuilder, ContextItem, ModelIndex, builder_for};
pub use metrics::{DependencyGraph, GraphAssembler, MetricsCollector, MetricsTable, load_model};
pub use scoring::{ConfusionMatrix, EvaluationReport, LabelSet, ScoreMetrics};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    DetectionParser, DetectionRunner, DetectionSummary, GuardedProvider, LlmProvider,
    LlmResponse, OpenAiCompatibleProvider, PromptGenerator, PromptRenderer, TokenCounter,
    create_provider,
};

//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Project model constants
pub mod model {
    /// Package key for classes declared without a package
    pub const DEFAULT_PACKAGE: &str = "default_package";

    /// Path segment marking test sources (excluded from the model)
    pub const TEST_SOURCE_MARKER: &str = "/test/";

    /// File name of the serialized project model
    pub const PROJECT_MODEL_FILE: &str = "project_metrics.json";
}

/// Analyzer output file names
pub mod analyzer {
    pub const TYPE_METRICS_FILE: &str = "TypeMetrics.csv";
    pub const METHOD_METRICS_FILE: &str = "MethodMetrics.csv";
    pub const DEPENDENCY_GRAPH_FILE: &str = "DependencyGraph.graphml";
    pub const ARCHITECTURE_SMELLS_FILE: &str = "ArchitectureSmells.csv";
    pub const DESIGN_SMELLS_FILE: &str = "DesignSmells.csv";
}

/// Prompt generation constants
pub mod prompt {
    /// Prefix of the optional token-count annotation on the first prompt line
    pub const CONTEXT_SIZE_PREFIX: &str = "##CONTEXT_SIZE=";

    /// Prompt and output file extension
    pub const PROMPT_EXTENSION: &str = "txt";

    /// Stem-to-identifier index written next to the prompts
    pub const MANIFEST_FILE: &str = "manifest.json";

    /// Template placeholders
    pub const SMELL_NAME_PLACEHOLDER: &str = "{SMELL_NAME}";
    pub const SMELL_DEFINITION_PLACEHOLDER: &str = "{SMELL_DEFINITION}";
    pub const INPUT_DATA_PLACEHOLDER: &str = "{INPUT_DATA}";
}

/// LLM engine defaults
pub mod engine {
    /// Default maximum prompt size (tokens)
    pub const DEFAULT_MAX_INPUT_TOKENS: usize = 100_000;

    /// Default completion budget for reasoning models
    pub const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 30_720;

    /// Completion budget for chat models
    pub const CHAT_MAX_COMPLETION_TOKENS: u32 = 8_192;

    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Default tokenizer encoding
    pub const DEFAULT_ENCODING: &str = "cl100k_base";
}

/// Retry constants for LLM calls
pub mod retry {
    /// Default maximum retries per prompt
    pub const DEFAULT_MAX_RETRIES: usize = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;

    /// Default number of prompts in flight
    pub const DEFAULT_CONCURRENCY: usize = 4;
}

/// Scoring constants
pub mod scoring {
    /// Decimal places for reported metrics
    pub const METRIC_DECIMALS: i32 = 3;

    /// Aggregate results file name
    pub const AGGREGATE_RESULTS_FILE: &str = "all_smells_results.json";
}

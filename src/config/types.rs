//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Every component receives the section it needs through its constructor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::constants::{analyzer, engine, model, retry};
use crate::types::{Result, SmellError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Input/output directory roots
    pub paths: PathsConfig,

    /// Static analyzer output conventions
    pub analyzer: AnalyzerConfig,

    /// Prompt generation settings
    pub prompts: PromptConfig,

    /// LLM detection batch settings
    pub detection: DetectionConfig,

    /// Named LLM engines
    pub engines: BTreeMap<String, EngineConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            paths: PathsConfig::default(),
            analyzer: AnalyzerConfig::default(),
            prompts: PromptConfig::default(),
            detection: DetectionConfig::default(),
            engines: EngineConfig::defaults(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `SmellError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.detection.concurrency == 0 {
            return Err(SmellError::Config(
                "detection.concurrency must be greater than 0".to_string(),
            ));
        }

        if !self.engines.contains_key(&self.detection.default_engine) {
            return Err(SmellError::Config(format!(
                "detection.default_engine '{}' is not a configured engine",
                self.detection.default_engine
            )));
        }

        if self.analyzer.test_source_marker.trim().is_empty() {
            return Err(SmellError::Config(
                "analyzer.test_source_marker must not be empty".to_string(),
            ));
        }

        for (name, engine) in &self.engines {
            engine.validate(name)?;
        }

        Ok(())
    }

    /// Look up an engine by name
    pub fn engine(&self, name: &str) -> Result<&EngineConfig> {
        self.engines.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.engines.keys().map(String::as_str).collect();
            SmellError::Config(format!(
                "Unknown engine '{}'. Configured engines: {}",
                name,
                known.join(", ")
            ))
        })
    }
}

// =============================================================================
// Paths
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding one checkout per analyzed project
    pub repositories_dir: PathBuf,

    /// Root of every generated artifact
    pub output_dir: PathBuf,

    /// Directory holding the `detection_<smell>.tpl` templates
    pub templates_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            repositories_dir: PathBuf::from("data/repositories"),
            output_dir: PathBuf::from("data/processed"),
            templates_dir: PathBuf::from("prompts/templates"),
        }
    }
}

// =============================================================================
// Analyzer
// =============================================================================

/// What to do when a file path does not contain the project root
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PathRootPolicy {
    /// Keep the raw path unchanged
    #[default]
    FallbackRaw,
    /// Reject the row as malformed
    Strict,
}

impl std::fmt::Display for PathRootPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathRootPolicy::FallbackRaw => write!(f, "fallback_raw"),
            PathRootPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for PathRootPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fallback_raw" | "fallback" => Ok(PathRootPolicy::FallbackRaw),
            "strict" => Ok(PathRootPolicy::Strict),
            _ => Err(format!(
                "Unknown path root policy: {}. Valid values: fallback_raw, strict",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub type_metrics_file: String,
    pub method_metrics_file: String,
    pub dependency_graph_file: String,
    pub architecture_smells_file: String,
    pub design_smells_file: String,

    /// Rows whose file path contains this marker are test code
    pub test_source_marker: String,

    pub path_root_policy: PathRootPolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            type_metrics_file: analyzer::TYPE_METRICS_FILE.to_string(),
            method_metrics_file: analyzer::METHOD_METRICS_FILE.to_string(),
            dependency_graph_file: analyzer::DEPENDENCY_GRAPH_FILE.to_string(),
            architecture_smells_file: analyzer::ARCHITECTURE_SMELLS_FILE.to_string(),
            design_smells_file: analyzer::DESIGN_SMELLS_FILE.to_string(),
            test_source_marker: model::TEST_SOURCE_MARKER.to_string(),
            path_root_policy: PathRootPolicy::default(),
        }
    }
}

// =============================================================================
// Prompts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Prefix each prompt with a `##CONTEXT_SIZE=<tokens>` line
    pub context_size_header: bool,

    /// Tokenizer used for the header count
    pub encoding: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            context_size_header: true,
            encoding: engine::DEFAULT_ENCODING.to_string(),
        }
    }
}

// =============================================================================
// Detection
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Engine used when none is given on the command line
    pub default_engine: String,

    /// Prompts in flight at once
    pub concurrency: usize,

    /// Retries for recoverable LLM failures
    pub max_retries: usize,

    /// Leave existing outputs untouched
    pub skip_existing: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            default_engine: "gpt".to_string(),
            concurrency: retry::DEFAULT_CONCURRENCY,
            max_retries: retry::DEFAULT_MAX_RETRIES,
            skip_existing: true,
        }
    }
}

// =============================================================================
// Engines
// =============================================================================

/// One OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Model identifier sent to the API
    pub model: String,

    /// Base URL (without `/chat/completions`)
    pub api_base: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    pub max_input_tokens: usize,
    pub max_completion_tokens: u32,

    /// Sampling temperature; omitted from requests when unset
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Tokenizer used for the input budget
    pub encoding: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-5-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_input_tokens: engine::DEFAULT_MAX_INPUT_TOKENS,
            max_completion_tokens: engine::DEFAULT_MAX_COMPLETION_TOKENS,
            temperature: None,
            timeout_secs: engine::DEFAULT_TIMEOUT_SECS,
            encoding: engine::DEFAULT_ENCODING.to_string(),
        }
    }
}

impl EngineConfig {
    /// Built-in engines: `gpt`, `deepseek`, `qwen`
    pub fn defaults() -> BTreeMap<String, EngineConfig> {
        let mut engines = BTreeMap::new();

        engines.insert("gpt".to_string(), EngineConfig::default());

        engines.insert(
            "deepseek".to_string(),
            EngineConfig {
                model: "deepseek-chat".to_string(),
                api_base: "https://api.deepseek.com".to_string(),
                api_key_env: "DEEPSEEK_API_KEY".to_string(),
                max_completion_tokens: engine::CHAT_MAX_COMPLETION_TOKENS,
                temperature: Some(0.1),
                ..EngineConfig::default()
            },
        );

        engines.insert(
            "qwen".to_string(),
            EngineConfig {
                model: "qwen/qwen3-coder".to_string(),
                api_base: "https://openrouter.ai/api/v1".to_string(),
                api_key_env: "OPENROUTER_API_KEY".to_string(),
                max_completion_tokens: engine::CHAT_MAX_COMPLETION_TOKENS,
                temperature: Some(0.1),
                ..EngineConfig::default()
            },
        );

        engines
    }

    fn validate(&self, name: &str) -> Result<()> {
        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(SmellError::Config(format!(
                "engines.{}.temperature must be between 0.0 and 2.0, got {}",
                name, temperature
            )));
        }

        if self.timeout_secs == 0 {
            return Err(SmellError::Config(format!(
                "engines.{}.timeout_secs must be greater than 0",
                name
            )));
        }

        if self.max_input_tokens == 0 {
            return Err(SmellError::Config(format!(
                "engines.{}.max_input_tokens must be greater than 0",
                name
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.detection.default_engine, "gpt");
        assert_eq!(config.analyzer.test_source_marker, "/test/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_engines() {
        let config = Config::default();
        let gpt = config.engine("gpt").unwrap();
        assert_eq!(gpt.model, "gpt-5-mini");
        assert_eq!(gpt.max_input_tokens, 100_000);
        assert_eq!(gpt.max_completion_tokens, 30_720);
        assert!(gpt.temperature.is_none());

        let qwen = config.engine("qwen").unwrap();
        assert_eq!(qwen.model, "qwen/qwen3-coder");
        assert_eq!(qwen.max_completion_tokens, 8_192);
        assert_eq!(qwen.temperature, Some(0.1));

        assert!(config.engine("llama").is_err());
    }

    #[test]
    fn test_path_root_policy() {
        assert_eq!(
            "strict".parse::<PathRootPolicy>().unwrap(),
            PathRootPolicy::Strict
        );
        assert_eq!(
            "fallback-raw".parse::<PathRootPolicy>().unwrap(),
            PathRootPolicy::FallbackRaw
        );
        assert_eq!(PathRootPolicy::default().to_string(), "fallback_raw");
        assert!("lenient".parse::<PathRootPolicy>().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.detection.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detection.default_engine = "missing".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        if let Some(engine) = config.engines.get_mut("deepseek") {
            engine.temperature = Some(3.0);
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [detection]
            concurrency = 8

            [engines.local]
            model = "llama3"
            api_base = "http://localhost:11434/v1"
            "#,
        )
        .unwrap();

        assert_eq!(config.detection.concurrency, 8);
        assert!(config.detection.skip_existing);
        let local = config.engine("local").unwrap();
        assert_eq!(local.max_input_tokens, 100_000);
    }
}

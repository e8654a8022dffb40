//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/smellscope/config.toml)
//! 3. Project config (./smellscope.toml) or an explicit `--config` file
//! 4. Environment variables (SMELLSCOPE_* prefix, `__` between nested keys)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, SmellError};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project (or explicit file) → env vars
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(SmellError::missing("config file", path));
                }
                debug!("Loading config from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let project_path = Self::project_config_path();
                if project_path.exists() {
                    debug!("Loading project config from: {}", project_path.display());
                    figment = figment.merge(Toml::file(&project_path));
                }
            }
        }

        // e.g. SMELLSCOPE_DETECTION__CONCURRENCY -> detection.concurrency
        figment = Self::merge_env(figment);

        let config: Config = figment
            .extract()
            .map_err(|e| SmellError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only (no global, no env)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| SmellError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn merge_env(figment: Figment) -> Figment {
        figment.merge(Env::prefixed("SMELLSCOPE_").split("__").lowercase(true))
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/smellscope/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("smellscope"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("smellscope.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render the effective configuration
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            Ok(toml::to_string_pretty(config)?)
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write a project config populated with the defaults.
    ///
    /// An existing file is kept unless `force` is set, but it must load.
    pub fn init_project(dir: &Path, force: bool) -> Result<PathBuf> {
        let config_path = dir.join(Self::project_config_path());

        if config_path.exists() && !force {
            Self::load_from_file(&config_path)?;
            info!("Project config exists: {}", config_path.display());
            return Ok(config_path);
        }

        let body = Self::render(&Config::default(), false)?;
        let content = format!(
            "# smellscope configuration\n\
             # Values here override ~/.config/smellscope/config.toml;\n\
             # SMELLSCOPE_* env vars override both.\n\n{}",
            body
        );
        fs::write(&config_path, content)?;
        info!("Created project config: {}", config_path.display());

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_project_writes_loadable_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigLoader::init_project(temp_dir.path(), false).unwrap();
        assert!(path.exists());

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.detection.default_engine, "gpt");
        assert_eq!(config.engines.len(), 3);
    }

    #[test]
    fn test_init_project_respects_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("smellscope.toml");
        fs::write(&path, "[detection]\nconcurrency = 2\n").unwrap();

        ConfigLoader::init_project(temp_dir.path(), false).unwrap();
        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.detection.concurrency, 2);

        ConfigLoader::init_project(temp_dir.path(), true).unwrap();
        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.detection.concurrency, 4);
    }

    #[test]
    fn test_init_project_rejects_invalid_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("smellscope.toml");
        fs::write(&path, "[detection]\nconcurrency = 0\n").unwrap();

        let err = ConfigLoader::init_project(temp_dir.path(), false).unwrap_err();
        assert!(matches!(err, SmellError::Config(_)));

        ConfigLoader::init_project(temp_dir.path(), true).unwrap();
        assert!(ConfigLoader::load_from_file(&path).is_ok());
    }

    #[test]
    fn test_file_merges_over_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        fs::write(
            &path,
            r#"
[paths]
output_dir = "/tmp/out"

[engines.gpt]
model = "gpt-4o"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.paths.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.engine("gpt").unwrap().model, "gpt-4o");
        assert_eq!(config.engine("gpt").unwrap().max_input_tokens, 100_000);
        assert!(config.engines.contains_key("deepseek"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigLoader::load(Some(Path::new("/nonexistent/smellscope.toml")));
        assert!(matches!(result, Err(SmellError::InputMissing { .. })));
    }

    #[test]
    fn test_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SMELLSCOPE_DETECTION__CONCURRENCY", "9");
            let figment = ConfigLoader::merge_env(
                Figment::new().merge(Serialized::defaults(Config::default())),
            );
            let config: Config = figment.extract()?;
            assert_eq!(config.detection.concurrency, 9);
            Ok(())
        });
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        let json = ConfigLoader::render(&config, true).unwrap();
        assert!(json.contains("\"default_engine\": \"gpt\""));
        let toml = ConfigLoader::render(&config, false).unwrap();
        assert!(toml.contains("[detection]"));
    }
}

//! CLI Common Utilities
//!
//! Shared initialization for command handlers: one loaded configuration, and
//! per-project layouts derived from it.

use std::path::Path;

use crate::config::{Config, ConfigLoader, EngineConfig};
use crate::storage::ProjectLayout;
use crate::types::{Result, SmellError, SmellKind};

/// Command execution context
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Loaded and validated configuration
    pub config: Config,
}

impl CommandContext {
    /// Load configuration (explicit file, or the usual resolution chain)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Ok(Self {
            config: ConfigLoader::load(config_path)?,
        })
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn layout(&self, project: &str) -> Result<ProjectLayout> {
        let project = project.trim();
        if project.is_empty() || project.contains(['/', '\\']) {
            return Err(SmellError::Config(format!(
                "Invalid project name '{}'",
                project
            )));
        }
        Ok(ProjectLayout::new(
            project,
            self.config.paths.clone(),
            self.config.analyzer.clone(),
        ))
    }

    /// Requested engine, or the configured default
    pub fn engine<'a>(&'a self, requested: Option<&'a str>) -> Result<(&'a str, &'a EngineConfig)> {
        let name = requested.unwrap_or(self.config.detection.default_engine.as_str());
        Ok((name, self.config.engine(name)?))
    }
}

/// One smell, or all of them
pub fn selected_smells(smell: Option<SmellKind>) -> Vec<SmellKind> {
    match smell {
        Some(smell) => vec![smell],
        None => SmellKind::ALL.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_rejects_bad_project_names() {
        let ctx = CommandContext::from_config(Config::default());
        assert!(ctx.layout("jsoup").is_ok());
        assert!(ctx.layout("  ").is_err());
        assert!(ctx.layout("../etc").is_err());
    }

    #[test]
    fn test_engine_resolution() {
        let ctx = CommandContext::from_config(Config::default());
        let (name, engine) = ctx.engine(None).unwrap();
        assert_eq!(name, "gpt");
        assert_eq!(engine.model, "gpt-5-mini");
        assert_eq!(ctx.engine(Some("qwen")).unwrap().0, "qwen");
        assert!(ctx.engine(Some("nope")).is_err());
    }

    #[test]
    fn test_selected_smells() {
        assert_eq!(selected_smells(None).len(), 4);
        assert_eq!(
            selected_smells(Some(SmellKind::GodComponent)),
            vec![SmellKind::GodComponent]
        );
    }
}

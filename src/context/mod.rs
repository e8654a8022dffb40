//! Smell-Specific Context Builders
//!
//! Each builder projects the read-only [`ProjectModel`] into one record per analyzed
//! entity. Output order follows identifier order so prompt sets are reproducible.
//!
//! [`ProjectModel`]: crate::types::ProjectModel

pub mod god_component;
pub mod hublike_modularization;
pub mod index;
pub mod insufficient_modularization;
pub mod unstable_dependency;

use serde::Serialize;

pub use god_component::GodComponentContext;
pub use hublike_modularization::HubLikeContext;
pub use index::ModelIndex;
pub use insufficient_modularization::InsufficientModularizationContext;
pub use unstable_dependency::UnstableDependencyContext;

use crate::types::{Result, SmellKind};

/// One prompt-ready record
#[derive(Debug, Clone, PartialEq)]
pub struct ContextItem {
    /// Package name or `package.class`
    pub identifier: String,
    /// File name (without extension) for the prompt and its answer
    pub file_stem: String,
    pub payload: serde_json::Value,
}

impl ContextItem {
    pub fn new<T: Serialize>(identifier: String, file_stem: String, payload: &T) -> Result<Self> {
        Ok(Self {
            identifier,
            file_stem,
            payload: serde_json::to_value(payload)?,
        })
    }
}

pub fn package_stem(package: &str) -> String {
    package.replace('/', "_")
}

pub fn class_stem(package: &str, class: &str) -> String {
    format!("{}_{}", package_stem(package), class)
}

pub trait ContextBuilder: Send + Sync {
    fn smell(&self) -> SmellKind;

    /// Project the model; never mutates it
    fn build(&self, index: &ModelIndex<'_>) -> Result<Vec<ContextItem>>;
}

pub fn builder_for(smell: SmellKind) -> Box<dyn ContextBuilder> {
    match smell {
        SmellKind::GodComponent => Box::new(GodComponentContext),
        SmellKind::InsufficientModularization => Box::new(InsufficientModularizationContext),
        SmellKind::UnstableDependency => Box::new(UnstableDependencyContext),
        SmellKind::HubLikeModularization => Box::new(HubLikeContext),
    }
}

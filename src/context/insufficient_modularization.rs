//! Insufficient Modularization: one record per class, no dependency context

use super::{ContextBuilder, ContextItem, ModelIndex, class_stem};
use crate::types::{Result, SmellKind};

pub struct InsufficientModularizationContext;

impl ContextBuilder for InsufficientModularizationContext {
    fn smell(&self) -> SmellKind {
        SmellKind::InsufficientModularization
    }

    fn build(&self, index: &ModelIndex<'_>) -> Result<Vec<ContextItem>> {
        index
            .classes()
            .map(|(id, class)| {
                ContextItem::new(id.to_string(), class_stem(&class.package, &class.name), class)
            })
            .collect()
    }
}

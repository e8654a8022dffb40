//! God Component: one record per package, whole-package view

use serde::Serialize;

use super::{ContextBuilder, ContextItem, ModelIndex, package_stem};
use crate::types::{ClassEntity, PackageMetrics, Result, SmellKind};

#[derive(Serialize)]
struct PackageView<'a> {
    package: &'a str,
    metrics: PackageMetrics,
    classes: &'a [ClassEntity],
}

pub struct GodComponentContext;

impl ContextBuilder for GodComponentContext {
    fn smell(&self) -> SmellKind {
        SmellKind::GodComponent
    }

    fn build(&self, index: &ModelIndex<'_>) -> Result<Vec<ContextItem>> {
        index
            .packages()
            .map(|package| {
                let view = PackageView {
                    package: package.name(),
                    metrics: package.metrics(),
                    classes: package.classes(),
                };
                ContextItem::new(
                    package.name().to_string(),
                    package_stem(package.name()),
                    &view,
                )
            })
            .collect()
    }
}

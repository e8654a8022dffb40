//! Unstable Dependency: each package with its one-hop outgoing and incoming
//! neighbors. Neighbors carry their own metrics and dependency list but are not
//! expanded further.

use serde::Serialize;

use super::{ContextBuilder, ContextItem, ModelIndex, package_stem};
use crate::types::{PackageEntity, PackageMetrics, Result, SmellKind};

#[derive(Serialize)]
struct PackageNode<'a> {
    package: &'a str,
    metrics: PackageMetrics,
    dependencies: &'a [String],
}

impl<'a> PackageNode<'a> {
    fn of(package: &'a PackageEntity) -> Self {
        Self {
            package: package.name(),
            metrics: package.metrics(),
            dependencies: package.dependencies(),
        }
    }
}

#[derive(Serialize)]
struct UnstableDependencyView<'a> {
    analyzed_package: PackageNode<'a>,
    outgoing_dependencies: Vec<PackageNode<'a>>,
    incoming_dependencies: Vec<PackageNode<'a>>,
}

pub struct UnstableDependencyContext;

impl ContextBuilder for UnstableDependencyContext {
    fn smell(&self) -> SmellKind {
        SmellKind::UnstableDependency
    }

    fn build(&self, index: &ModelIndex<'_>) -> Result<Vec<ContextItem>> {
        index
            .packages()
            .map(|package| {
                let outgoing = package
                    .dependencies()
                    .iter()
                    .filter_map(|name| index.package(name))
                    .map(PackageNode::of)
                    .collect();
                let incoming = index
                    .package_dependents(package.name())
                    .into_iter()
                    .filter_map(|name| index.package(name))
                    .map(PackageNode::of)
                    .collect();

                let view = UnstableDependencyView {
                    analyzed_package: PackageNode::of(package),
                    outgoing_dependencies: outgoing,
                    incoming_dependencies: incoming,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures;

    #[test]
    fn test_neighbors_one_hop() {
        let model = fixtures::model();
        let items = UnstableDependencyContext
            .build(&ModelIndex::new(&model))
            .unwrap();
        let b = items.iter().find(|i| i.identifier == "b").unwrap();

        assert_eq!(b.payload["analyzed_package"]["package"], "b");
        assert_eq!(b.payload["analyzed_package"]["metrics"]["afferent_coupling"], 2);

        let outgoing = b.payload["outgoing_dependencies"].as_array().unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0]["package"], "a");
        assert_eq!(outgoing[0]["dependencies"][0], "b");
        assert!(outgoing[0].get("outgoing_dependencies").is_none());

        let incoming: Vec<&str> = b.payload["incoming_dependencies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["package"].as_str().unwrap())
            .collect();
        assert_eq!(incoming, vec!["a", "c"]);
    }

    #[test]
    fn test_isolated_package() {
        let model = fixtures::model();
        let items = UnstableDependencyContext
            .build(&ModelIndex::new(&model))
            .unwrap();
        let c = items.iter().find(|i| i.identifier == "c").unwrap();

        assert!(c.payload["incoming_dependencies"].as_array().unwrap().is_empty());
        assert_eq!(c.payload["analyzed_package"]["metrics"]["instability"], 1.0);
    }
}

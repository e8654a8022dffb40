//! Graph Assembler
//!
//! Merges extracted class entities with the parsed dependency relations into one
//! consistent [`ProjectModel`]. Whole-project, single pass:
//!
//! 1. group classes by package (`default_package` for none)
//! 2. package dependencies = graph targets ∩ present packages
//! 3. afferent credits from the original adjacency, both endpoints present
//! 4. instability derived on read
//! 5. class dependencies = graph targets ∩ present classes
//!
//! Dangling references (test-only or out-of-scope code) are dropped silently.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::graph::DependencyGraph;
use crate::types::{ClassEntity, PackageEntity, ProjectModel, package_key};

pub struct GraphAssembler;

impl GraphAssembler {
    pub fn assemble(
        project: impl Into<String>,
        entities: Vec<ClassEntity>,
        graph: &DependencyGraph,
    ) -> ProjectModel {
        // ===== Grouping =====
        let mut buckets: BTreeMap<String, Vec<ClassEntity>> = BTreeMap::new();
        for mut entity in entities {
            let key = package_key(&entity.package).to_string();
            entity.package = key.clone();
            buckets.entry(key).or_default().push(entity);
        }

        let valid_packages: BTreeSet<String> = buckets.keys().cloned().collect();
        let valid_classes: BTreeSet<String> = buckets
            .values()
            .flatten()
            .map(ClassEntity::identifier)
            .collect();

        // ===== Afferent credits =====
        let mut afferent: BTreeMap<String, usize> = BTreeMap::new();
        for (source, targets) in &graph.package_dependencies {
            if !valid_packages.contains(source.as_str()) {
                continue;
            }
            for target in targets {
                if target != source && valid_packages.contains(target.as_str()) {
                    *afferent.entry(target.clone()).or_default() += 1;
                }
            }
        }

        // ===== Package and class dependencies =====
        let mut dropped = 0usize;
        let mut packages = Vec::with_capacity(buckets.len());

        for (name, mut classes) in buckets {
            for class in classes.iter_mut() {
                let id = class.identifier();
                class.dependencies = match graph.class_dependencies.get(&id) {
                    Some(targets) => {
                        let kept: Vec<String> = targets
                            .iter()
                            .filter(|t| **t != id && valid_classes.contains(*t))
                            .cloned()
                            .collect();
                        dropped += targets.len() - kept.len();
                        kept
                    }
                    None => Vec::new(),
                };
            }

            let mut package = PackageEntity::new(name.clone(), classes);
            if let Some(targets) = graph.package_dependencies.get(&name) {
                package.set_dependencies(
                    targets
                        .iter()
                        .filter(|t| valid_packages.contains(t.as_str()))
                        .cloned(),
                );
            }
            package.set_afferent_coupling(afferent.get(name.as_str()).copied().unwrap_or(0));
            packages.push(package);
        }

        if dropped > 0 {
            debug!("Dropped {} dangling class dependencies", dropped);
        }

        ProjectModel::new(project, packages)
    }
}

//! Scoped lookup cache over one assembled model
//!
//! Built once per model and dropped with it; never shared across assemblies.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{ClassEntity, PackageEntity, ProjectModel};

pub struct ModelIndex<'a> {
    model: &'a ProjectModel,
    classes: BTreeMap<String, &'a ClassEntity>,
    packages: BTreeMap<&'a str, &'a PackageEntity>,
    incoming_classes: BTreeMap<&'a str, BTreeSet<String>>,
    incoming_packages: BTreeMap<&'a str, BTreeSet<&'a str>>,
}

impl<'a> ModelIndex<'a> {
    pub fn new(model: &'a ProjectModel) -> Self {
        let classes: BTreeMap<String, &ClassEntity> =
            model.classes().map(|c| (c.identifier(), c)).collect();
        let packages: BTreeMap<&str, &PackageEntity> =
            model.packages().iter().map(|p| (p.name(), p)).collect();

        let mut incoming_classes: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for class in model.classes() {
            let id = class.identifier();
            for dep in &class.dependencies {
                incoming_classes
                    .entry(dep.as_str())
                    .or_default()
                    .insert(id.clone());
            }
        }

        let mut incoming_packages: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for package in model.packages() {
            for dep in package.dependencies() {
                incoming_packages
                    .entry(dep.as_str())
                    .or_default()
                    .insert(package.name());
            }
        }

        Self {
            model,
            classes,
            packages,
            incoming_classes,
            incoming_packages,
        }
    }

    pub fn model(&self) -> &'a ProjectModel {
        self.model
    }

    pub fn class(&self, identifier: &str) -> Option<&'a ClassEntity> {
        self.classes.get(identifier).copied()
    }

    pub fn package(&self, name: &str) -> Option<&'a PackageEntity> {
        self.packages.get(name).copied()
    }

    /// Classes in identifier order
    pub fn classes(&self) -> impl Iterator<Item = (&str, &'a ClassEntity)> + '_ {
        self.classes.iter().map(|(id, c)| (id.as_str(), *c))
    }

    /// Packages in name order
    pub fn packages(&self) -> impl Iterator<Item = &'a PackageEntity> + '_ {
        self.packages.values().copied()
    }

    /// Identifiers of classes that depend on `identifier`
    pub fn class_dependents(&self, identifier: &str) -> Vec<&str> {
        self.incoming_classes
            .get(identifier)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Names of packages that depend on `name`
    pub fn package_dependents(&self, name: &str) -> Vec<&'a str> {
        self.incoming_packages
            .get(name)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

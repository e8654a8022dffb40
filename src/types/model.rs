//! Project Model
//!
//! The assembled, read-only view of one analyzed project: packages owning classes,
//! classes referencing classes, packages referencing packages.
//!
//! Derived values (package metrics, project summary) are computed from the live
//! collections on every read and serialized alongside them; they are never stored.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::constants::model::DEFAULT_PACKAGE;

/// Fully-qualified class identifier (`package.class`)
pub fn qualified_name(package: &str, class: &str) -> String {
    format!("{}.{}", package, class)
}

/// Instability = efferent / (efferent + afferent), 0.0 when both are zero
pub fn instability(efferent: usize, afferent: usize) -> f64 {
    let total = efferent + afferent;
    if total == 0 {
        0.0
    } else {
        efferent as f64 / total as f64
    }
}

// =============================================================================
// Class
// =============================================================================

/// Per-class metrics as reported by the static analyzer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassMetrics {
    /// Number of fields
    #[serde(rename = "nof")]
    pub fields: u64,
    /// Number of public fields
    #[serde(rename = "nopf")]
    pub public_fields: u64,
    /// Number of methods
    #[serde(rename = "nom")]
    pub methods: u64,
    /// Number of public methods
    #[serde(rename = "nopm")]
    pub public_methods: u64,
    /// Lines of code
    pub loc: u64,
    /// Weighted methods per class
    pub wmc: u64,
    /// Number of children
    #[serde(rename = "nc")]
    pub children: u64,
    /// Depth of inheritance tree
    pub dit: u64,
    /// Lack of cohesion in methods
    pub lcom: f64,
    #[serde(rename = "fanin")]
    pub fan_in: u64,
    #[serde(rename = "fanout")]
    pub fan_out: u64,
}

/// One production class of the analyzed project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntity {
    pub package: String,
    #[serde(rename = "class")]
    pub name: String,
    /// Source path relative to the project root
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub metrics: ClassMetrics,
    /// Qualified identifiers of referenced classes present in the same model
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ClassEntity {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            file: String::new(),
            metrics: ClassMetrics::default(),
            dependencies: Vec::new(),
        }
    }

    /// `package.class`
    pub fn identifier(&self) -> String {
        qualified_name(&self.package, &self.name)
    }
}

// =============================================================================
// Package
// =============================================================================

/// Derived package metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMetrics {
    pub num_classes: usize,
    pub loc: u64,
    pub efferent_coupling: usize,
    pub afferent_coupling: usize,
    pub instability: f64,
}

/// One package and the classes it owns.
///
/// Fields are private so that `efferent_coupling` cannot drift from the live
/// dependency list and instability is always recomputed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawPackage")]
pub struct PackageEntity {
    package: String,
    classes: Vec<ClassEntity>,
    dependencies: Vec<String>,
    afferent_coupling: usize,
}

impl PackageEntity {
    /// Create a package from its classes; classes are kept sorted by name
    pub fn new(package: impl Into<String>, mut classes: Vec<ClassEntity>) -> Self {
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            package: package.into(),
            classes,
            dependencies: Vec::new(),
            afferent_coupling: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.package
    }

    pub fn classes(&self) -> &[ClassEntity] {
        &self.classes
    }

    /// Packages this package depends on (sorted, distinct)
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub(crate) fn set_dependencies(&mut self, dependencies: impl IntoIterator<Item = String>) {
        let mut deps: Vec<String> = dependencies
            .into_iter()
            .filter(|d| d != &self.package)
            .collect();
        deps.sort();
        deps.dedup();
        self.dependencies = deps;
    }

    pub(crate) fn set_afferent_coupling(&mut self, afferent: usize) {
        self.afferent_coupling = afferent;
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn loc(&self) -> u64 {
        self.classes.iter().map(|c| c.metrics.loc).sum()
    }

    pub fn efferent_coupling(&self) -> usize {
        self.dependencies.len()
    }

    pub fn afferent_coupling(&self) -> usize {
        self.afferent_coupling
    }

    pub fn instability(&self) -> f64 {
        instability(self.efferent_coupling(), self.afferent_coupling)
    }

    pub fn metrics(&self) -> PackageMetrics {
        PackageMetrics {
            num_classes: self.num_classes(),
            loc: self.loc(),
            efferent_coupling: self.efferent_coupling(),
            afferent_coupling: self.afferent_coupling,
            instability: self.instability(),
        }
    }
}

impl Serialize for PackageEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PackageEntity", 4)?;
        state.serialize_field("package", &self.package)?;
        state.serialize_field("metrics", &self.metrics())?;
        state.serialize_field("classes", &self.classes)?;
        state.serialize_field("dependencies", &self.dependencies)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct RawPackage {
    package: String,
    #[serde(default)]
    metrics: RawPackageMetrics,
    #[serde(default)]
    classes: Vec<ClassEntity>,
    #[serde(default)]
    dependencies: Vec<String>,
}

#[derive(Default, Deserialize)]
struct RawPackageMetrics {
    #[serde(default)]
    afferent_coupling: usize,
}

impl From<RawPackage> for PackageEntity {
    fn from(raw: RawPackage) -> Self {
        let mut package = PackageEntity::new(raw.package, raw.classes);
        package.set_dependencies(raw.dependencies);
        package.set_afferent_coupling(raw.metrics.afferent_coupling);
        package
    }
}

// =============================================================================
// Project
// =============================================================================

/// Counts derived from the live package collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub total_packages: usize,
    pub total_classes: usize,
}

/// Root aggregate of one analyzer run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawProject")]
pub struct ProjectModel {
    project: String,
    packages: Vec<PackageEntity>,
}

impl ProjectModel {
    /// Build a model; packages are sorted and unique by name (later duplicates merge
    /// their classes into the first occurrence)
    pub fn new(project: impl Into<String>, packages: Vec<PackageEntity>) -> Self {
        let mut merged: Vec<PackageEntity> = Vec::with_capacity(packages.len());
        let mut sorted = packages;
        sorted.sort_by(|a, b| a.package.cmp(&b.package));

        for package in sorted {
            match merged.last_mut() {
                Some(last) if last.package == package.package => {
                    let mut classes = std::mem::take(&mut last.classes);
                    classes.extend(package.classes);
                    let deps: Vec<String> = last
                        .dependencies
                        .iter()
                        .chain(package.dependencies.iter())
                        .cloned()
                        .collect();
                    let afferent = last.afferent_coupling.max(package.afferent_coupling);
                    *last = PackageEntity::new(package.package, classes);
                    last.set_dependencies(deps);
                    last.set_afferent_coupling(afferent);
                }
                _ => merged.push(package),
            }
        }

        Self {
            project: project.into(),
            packages: merged,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn packages(&self) -> &[PackageEntity] {
        &self.packages
    }

    pub fn package(&self, name: &str) -> Option<&PackageEntity> {
        self.packages
            .binary_search_by(|p| p.package.as_str().cmp(name))
            .ok()
            .map(|idx| &self.packages[idx])
    }

    /// Look up a class by its qualified identifier
    pub fn class(&self, identifier: &str) -> Option<&ClassEntity> {
        self.classes().find(|c| {
            identifier.len() == c.package.len() + 1 + c.name.len()
                && identifier.starts_with(c.package.as_str())
                && identifier.ends_with(c.name.as_str())
                && identifier.as_bytes()[c.package.len()] == b'.'
        })
    }

    /// All classes, in package then class order
    pub fn classes(&self) -> impl Iterator<Item = &ClassEntity> {
        self.packages.iter().flat_map(|p| p.classes.iter())
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            total_packages: self.packages.len(),
            total_classes: self.packages.iter().map(|p| p.num_classes()).sum(),
        }
    }
}

impl Serialize for ProjectModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProjectModel", 3)?;
        state.serialize_field("project", &self.project)?;
        state.serialize_field("summary", &self.summary())?;
        state.serialize_field("packages", &self.packages)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct RawProject {
    project: String,
    #[serde(default)]
    packages: Vec<PackageEntity>,
}

impl From<RawProject> for ProjectModel {
    fn from(raw: RawProject) -> Self {
        ProjectModel::new(raw.project, raw.packages)
    }
}

/// Package key for a possibly-empty package column value
pub fn package_key(package: &str) -> &str {
    let trimmed = package.trim();
    if trimmed.is_empty() {
        DEFAULT_PACKAGE
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(package: &str, name: &str, loc: u64) -> ClassEntity {
        let mut c = ClassEntity::new(package, name);
        c.metrics.loc = loc;
        c
    }

    #[test]
    fn test_instability_zero_denominator() {
        assert_eq!(instability(0, 0), 0.0);
        assert_eq!(instability(1, 0), 1.0);
        assert_eq!(instability(1, 3), 0.25);
    }

    #[test]
    fn test_package_metrics_follow_live_state() {
        let mut pkg = PackageEntity::new("a", vec![class("a", "Y", 5), class("a", "X", 10)]);
        assert_eq!(pkg.classes()[0].name, "X");

        pkg.set_dependencies(vec!["c".to_string(), "b".to_string(), "c".to_string()]);
        pkg.set_afferent_coupling(2);

        let metrics = pkg.metrics();
        assert_eq!(metrics.num_classes, 2);
        assert_eq!(metrics.loc, 15);
        assert_eq!(metrics.efferent_coupling, 2);
        assert_eq!(metrics.afferent_coupling, 2);
        assert_eq!(metrics.instability, 0.5);
        assert_eq!(pkg.dependencies(), &["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_package_never_depends_on_itself() {
        let mut pkg = PackageEntity::new("a", vec![]);
        pkg.set_dependencies(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(pkg.dependencies(), &["b".to_string()]);
    }

    #[test]
    fn test_model_summary_and_lookup() {
        let model = ProjectModel::new(
            "demo",
            vec![
                PackageEntity::new("b", vec![class("b", "Y", 20)]),
                PackageEntity::new("a", vec![class("a", "X", 10), class("a", "Z", 1)]),
            ],
        );

        assert_eq!(
            model.summary(),
            ProjectSummary {
                total_packages: 2,
                total_classes: 3
            }
        );
        assert_eq!(model.packages()[0].name(), "a");
        assert!(model.package("b").is_some());
        assert!(model.package("c").is_none());
        assert_eq!(model.class("a.Z").map(|c| c.metrics.loc), Some(1));
        assert!(model.class("a.Y").is_none());
        assert!(model.class("aX").is_none());
    }

    #[test]
    fn test_duplicate_packages_merge() {
        let model = ProjectModel::new(
            "demo",
            vec![
                PackageEntity::new("a", vec![class("a", "X", 1)]),
                PackageEntity::new("a", vec![class("a", "Y", 2)]),
            ],
        );
        assert_eq!(model.packages().len(), 1);
        assert_eq!(model.packages()[0].num_classes(), 2);
    }

    #[test]
    fn test_serialized_shape() {
        let mut pkg = PackageEntity::new("a", vec![class("a", "X", 10)]);
        pkg.set_dependencies(vec!["b".to_string()]);
        let model = ProjectModel::new("demo", vec![pkg, PackageEntity::new("b", vec![])]);

        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["summary"]["total_packages"], 2);
        assert_eq!(json["summary"]["total_classes"], 1);
        assert_eq!(json["packages"][0]["metrics"]["efferent_coupling"], 1);
        assert_eq!(json["packages"][0]["metrics"]["instability"], 1.0);
        assert_eq!(json["packages"][0]["classes"][0]["class"], "X");
        assert_eq!(json["packages"][0]["classes"][0]["metrics"]["loc"], 10);
    }

    #[test]
    fn test_deserialize_recomputes_derived_fields() {
        let json = r#"{
            "project": "demo",
            "summary": {"total_packages": 99, "total_classes": 99},
            "packages": [{
                "package": "a",
                "metrics": {"num_classes": 7, "loc": 7, "efferent_coupling": 7,
                            "afferent_coupling": 1, "instability": 0.9},
                "classes": [{"package": "a", "class": "X", "file": "", "metrics": {"loc": 3},
                             "dependencies": []}],
                "dependencies": ["b", "b"]
            }]
        }"#;

        let model: ProjectModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.summary().total_packages, 1);
        let pkg = &model.packages()[0];
        assert_eq!(pkg.num_classes(), 1);
        assert_eq!(pkg.loc(), 3);
        assert_eq!(pkg.efferent_coupling(), 1);
        assert_eq!(pkg.afferent_coupling(), 1);
        assert_eq!(pkg.instability(), 0.5);
    }

    #[test]
    fn test_package_key_default() {
        assert_eq!(package_key("  "), DEFAULT_PACKAGE);
        assert_eq!(package_key(" org.demo "), "org.demo");
    }
}

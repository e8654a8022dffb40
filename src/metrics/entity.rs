//! Entity Extractor
//!
//! Turns normalized type-metrics rows into [`ClassEntity`] records. Identity columns
//! are mandatory; metric columns are optional and default to zero.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::table::{MetricsTable, TableRow};
use crate::config::{AnalyzerConfig, PathRootPolicy};
use crate::types::{ClassEntity, ClassMetrics, Result, SmellError, package_key};

pub const PACKAGE_COLUMNS: &[&str] = &["package", "package_name"];
pub const CLASS_COLUMNS: &[&str] = &["class", "type_name", "class_name"];
pub const FILE_COLUMNS: &[&str] = &["file", "file_path"];

#[derive(Debug, Clone)]
pub struct EntityExtractor {
    project_root: String,
    test_marker: String,
    policy: PathRootPolicy,
}

impl EntityExtractor {
    /// `project_root` is the root-path string searched for in raw file paths
    pub fn new(project_root: impl Into<String>) -> Self {
        let defaults = AnalyzerConfig::default();
        Self {
            project_root: project_root.into(),
            test_marker: defaults.test_source_marker,
            policy: defaults.path_root_policy,
        }
    }

    pub fn from_config(project_root: impl Into<String>, config: &AnalyzerConfig) -> Self {
        Self {
            project_root: project_root.into(),
            test_marker: config.test_source_marker.clone(),
            policy: config.path_root_policy,
        }
    }

    pub fn with_policy(mut self, policy: PathRootPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build one entity with empty dependencies
    pub fn extract(&self, row: &TableRow) -> Result<ClassEntity> {
        let package = row.first_of(PACKAGE_COLUMNS).ok_or_else(|| {
            SmellError::malformed_row(row.index, "missing package column")
        })?;
        let class = row
            .first_of(CLASS_COLUMNS)
            .ok_or_else(|| SmellError::malformed_row(row.index, "missing class column"))?;

        if class.is_empty() {
            return Err(SmellError::malformed_row(row.index, "empty class name"));
        }

        let metrics = ClassMetrics {
            fields: count(row, "nof")?,
            public_fields: count(row, "nopf")?,
            methods: count(row, "nom")?,
            public_methods: count(row, "nopm")?,
            loc: count(row, "loc")?,
            wmc: count(row, "wmc")?,
            children: count(row, "nc")?,
            dit: count(row, "dit")?,
            lcom: ratio(row, "lcom")?,
            fan_in: count(row, "fanin")?,
            fan_out: count(row, "fanout")?,
        };

        let file = match row.first_of(FILE_COLUMNS) {
            Some(raw) if !raw.is_empty() => self.relative_file(row.index, raw)?,
            _ => String::new(),
        };

        Ok(ClassEntity {
            package: package_key(package).to_string(),
            name: class.to_string(),
            file,
            metrics,
            dependencies: Vec::new(),
        })
    }

    /// Strip everything before the first occurrence of the project root
    fn relative_file(&self, row: usize, raw: &str) -> Result<String> {
        if self.project_root.is_empty() {
            return Ok(raw.to_string());
        }

        match raw.find(&self.project_root) {
            Some(start) => Ok(raw[start..].to_string()),
            None => match self.policy {
                PathRootPolicy::FallbackRaw => {
                    debug!(
                        "Row {}: '{}' not found in '{}', keeping raw path",
                        row, self.project_root, raw
                    );
                    Ok(raw.to_string())
                }
                PathRootPolicy::Strict => Err(SmellError::malformed_row(
                    row,
                    format!("file path '{}' does not contain '{}'", raw, self.project_root),
                )),
            },
        }
    }

    pub fn is_test_source(&self, entity: &ClassEntity) -> bool {
        entity.file.contains(&self.test_marker)
    }

    /// Extract every production class of a table.
    ///
    /// Test sources are dropped; for duplicate `package.class` rows the first wins.
    pub fn extract_all(&self, table: &MetricsTable) -> Result<Vec<ClassEntity>> {
        if !table.has_column(PACKAGE_COLUMNS) {
            return Err(SmellError::malformed_row(0, "table has no package column"));
        }
        if !table.has_column(CLASS_COLUMNS) {
            return Err(SmellError::malformed_row(0, "table has no class column"));
        }

        let mut seen = BTreeSet::new();
        let mut entities = Vec::with_capacity(table.rows.len());
        let mut tests = 0usize;

        for row in &table.rows {
            let entity = self.extract(row)?;

            if self.is_test_source(&entity) {
                tests += 1;
                continue;
            }

            if !seen.insert(entity.identifier()) {
                warn!(
                    "Row {}: duplicate class {} ignored",
                    row.index,
                    entity.identifier()
                );
                continue;
            }

            entities.push(entity);
        }

        debug!(
            "Extracted {} classes ({} test classes skipped)",
            entities.len(),
            tests
        );
        Ok(entities)
    }
}

// ===== Metric parsing =====

fn number(row: &TableRow, column: &str) -> Result<f64> {
    let raw = match row.get(column) {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(0.0),
    };

    let value: f64 = raw.parse().map_err(|_| {
        SmellError::malformed_row(row.index, format!("{} is not a number: '{}'", column, raw))
    })?;

    if !value.is_finite() {
        return Err(SmellError::malformed_row(
            row.index,
            format!("{} is not finite: '{}'", column, raw),
        ));
    }

    // analyzers report -1 for "not applicable"
    Ok(value.max(0.0))
}

fn count(row: &TableRow, column: &str) -> Result<u64> {
    if let Some(raw) = row.get(column)
        && let Ok(value) = raw.parse::<u64>()
    {
        return Ok(value);
    }
    Ok(number(row, column)?.round() as u64)
}

fn ratio(row: &TableRow, column: &str) -> Result<f64> {
    number(row, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(index: usize, pairs: &[(&str, &str)]) -> TableRow {
        let values: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TableRow::new(index, values)
    }

    #[test]
    fn test_extract_full_row() {
        let extractor = EntityExtractor::new("repositories/jsoup");
        let entity = extractor
            .extract(&row(
                1,
                &[
                    ("package_name", "org.jsoup"),
                    ("type_name", "Jsoup"),
                    ("nof", "2"),
                    ("nom", "14"),
                    ("loc", "120"),
                    ("lcom", "0.75"),
                    ("fanout", "5"),
                    (
                        "file_path",
                        "/tmp/ci/data/repositories/jsoup/src/main/java/org/jsoup/Jsoup.java",
                    ),
                ],
            ))
            .unwrap();

        assert_eq!(entity.identifier(), "org.jsoup.Jsoup");
        assert_eq!(
            entity.file,
            "repositories/jsoup/src/main/java/org/jsoup/Jsoup.java"
        );
        assert_eq!(entity.metrics.fields, 2);
        assert_eq!(entity.metrics.methods, 14);
        assert_eq!(entity.metrics.loc, 120);
        assert_eq!(entity.metrics.lcom, 0.75);
        assert_eq!(entity.metrics.fan_out, 5);
        assert_eq!(entity.metrics.wmc, 0);
        assert!(entity.dependencies.is_empty());
    }

    #[test]
    fn test_absent_fields_default() {
        let extractor = EntityExtractor::new("demo");
        let entity = extractor
            .extract(&row(1, &[("package", "a"), ("class", "X")]))
            .unwrap();
        assert_eq!(entity.file, "");
        assert_eq!(entity.metrics, ClassMetrics::default());
    }

    #[test]
    fn test_negative_and_float_metrics_clamp() {
        let extractor = EntityExtractor::new("demo");
        let entity = extractor
            .extract(&row(
                1,
                &[("package", "a"), ("class", "X"), ("lcom", "-1.0"), ("wmc", "3.0")],
            ))
            .unwrap();
        assert_eq!(entity.metrics.lcom, 0.0);
        assert_eq!(entity.metrics.wmc, 3);
    }

    #[test]
    fn test_identity_fields_required() {
        let extractor = EntityExtractor::new("demo");

        let no_class = extractor.extract(&row(4, &[("package", "a"), ("loc", "3")]));
        assert!(matches!(no_class, Err(SmellError::MalformedRow { row: 4, .. })));

        let empty_class = extractor.extract(&row(5, &[("package", "a"), ("class", "")]));
        assert!(matches!(empty_class, Err(SmellError::MalformedRow { row: 5, .. })));

        let no_package = extractor.extract(&row(6, &[("class", "X")]));
        assert!(matches!(no_package, Err(SmellError::MalformedRow { row: 6, .. })));
    }

    #[test]
    fn test_empty_package_uses_default() {
        let extractor = EntityExtractor::new("demo");
        let entity = extractor
            .extract(&row(1, &[("package", ""), ("class", "Main")]))
            .unwrap();
        assert_eq!(entity.identifier(), "default_package.Main");
    }

    #[test]
    fn test_unparseable_metric() {
        let extractor = EntityExtractor::new("demo");
        let result = extractor.extract(&row(
            2,
            &[("package", "a"), ("class", "X"), ("loc", "many")],
        ));
        assert!(matches!(result, Err(SmellError::MalformedRow { row: 2, .. })));
    }

    #[test]
    fn test_root_path_policies() {
        let raw = &[("package", "a"), ("class", "X"), ("file", "/elsewhere/X.java")];

        let lenient = EntityExtractor::new("repositories/demo");
        assert_eq!(lenient.extract(&row(1, raw)).unwrap().file, "/elsewhere/X.java");

        let strict = EntityExtractor::new("repositories/demo").with_policy(PathRootPolicy::Strict);
        assert!(matches!(
            strict.extract(&row(1, raw)),
            Err(SmellError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_extract_all_filters_tests_and_duplicates() {
        let csv = "package,class,loc,file\n\
                   a,X,10,/w/demo/src/main/java/a/X.java\n\
                   a,XTest,5,/w/demo/src/test/java/a/XTest.java\n\
                   a,X,99,/w/demo/src/main/java/a/X.java\n\
                   b,Y,20,/w/demo/src/main/java/b/Y.java\n";
        let table = MetricsTable::from_reader(csv.as_bytes()).unwrap();
        let entities = EntityExtractor::new("demo").extract_all(&table).unwrap();

        let ids: Vec<String> = entities.iter().map(|e| e.identifier()).collect();
        assert_eq!(ids, vec!["a.X", "b.Y"]);
        assert_eq!(entities[0].metrics.loc, 10);
    }

    #[test]
    fn test_extract_all_requires_identity_columns() {
        let table = MetricsTable::from_reader("type_name,loc\nX,1\n".as_bytes()).unwrap();
        assert!(matches!(
            EntityExtractor::new("demo").extract_all(&table),
            Err(SmellError::MalformedRow { row: 0, .. })
        ));
    }
}

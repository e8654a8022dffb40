//! Label-set consolidation
//!
//! Turns the two raw sources into comparable `DetectionRecord` arrays:
//! per-prompt LLM answers on one side, the analyzer's smell table on the other.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::ai::{DetectionParser, PromptManifest, list_prompts};
use crate::constants::prompt;
use crate::metrics::MetricsTable;
use crate::storage::{LabelSource, ProjectLayout, write_json_atomic};
use crate::types::{DetectionRecord, Granularity, Result, SmellError, SmellKind, package_key};

const SMELL_COLUMNS: &[&str] = &["smell", "architecture_smell", "design_smell", "smell_name"];
const PACKAGE_COLUMNS: &[&str] = &["package", "package_name"];
const CLASS_COLUMNS: &[&str] = &["class", "type_name", "class_name"];
const CAUSE_COLUMNS: &[&str] = &["description", "cause_of_the_smell", "cause"];

/// Consolidated records plus what could not be used
#[derive(Debug, Clone, Default)]
pub struct Consolidation {
    pub records: Vec<DetectionRecord>,
    /// Answers that did not parse; scored as not detected when keyed by a manifest
    pub unparseable: usize,
    /// Manifest entries without an answer file
    pub missing: usize,
}

/// Collect the LLM answers of one engine into `<smell>_llm.json`
pub fn consolidate_llm_outputs(
    layout: &ProjectLayout,
    smell: SmellKind,
    engine: &str,
) -> Result<Consolidation> {
    let outputs = layout.llm_outputs_dir(smell, engine);
    if !outputs.is_dir() {
        return Err(SmellError::missing("LLM output directory", &outputs));
    }

    let parser = DetectionParser::new();
    let consolidation = match PromptManifest::load(&layout.prompt_manifest(smell))? {
        Some(manifest) => from_manifest(&parser, &manifest, &outputs)?,
        None => from_bodies(&parser, &outputs)?,
    };

    if consolidation.unparseable > 0 {
        warn!(
            "{} {} ({}): {} unparseable answers",
            layout.project(),
            smell,
            engine,
            consolidation.unparseable
        );
    }
    if consolidation.missing > 0 {
        info!(
            "{} {} ({}): {} prompts without an answer",
            layout.project(),
            smell,
            engine,
            consolidation.missing
        );
    }

    write_json_atomic(
        &layout.labels(smell, engine, LabelSource::Llm),
        &consolidation.records,
    )?;
    Ok(consolidation)
}

fn from_manifest(
    parser: &DetectionParser,
    manifest: &PromptManifest,
    outputs: &Path,
) -> Result<Consolidation> {
    let mut result = Consolidation::default();

    for (stem, identifier) in manifest.iter() {
        let path = outputs.join(format!("{}.{}", stem, prompt::PROMPT_EXTENSION));
        if !path.exists() {
            debug!("No answer for {}", identifier);
            result.missing += 1;
            continue;
        }

        let raw = std::fs::read_to_string(&path)?;
        match parser.parse_for(&raw, identifier) {
            Some(record) => result.records.push(record),
            None => {
                warn!("Unparseable answer {}, scored as not detected", path.display());
                result.unparseable += 1;
                result.records.push(DetectionRecord::new(identifier, false));
            }
        }
    }

    Ok(result)
}

fn from_bodies(parser: &DetectionParser, outputs: &Path) -> Result<Consolidation> {
    let mut result = Consolidation::default();

    for path in list_prompts(outputs)? {
        let raw = std::fs::read_to_string(&path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        match parser.parse(&raw) {
            Some(records) => {
                for mut record in records {
                    if record.identifier.is_empty() {
                        record.identifier = stem.clone();
                    }
                    result.records.push(record);
                }
            }
            None => {
                warn!("Unparseable answer {}, ignored", path.display());
                result.unparseable += 1;
            }
        }
    }

    Ok(result)
}

/// Collect the analyzer's verdicts for `smell` into `<smell>_analyzer.json`
pub fn consolidate_analyzer_outputs(
    layout: &ProjectLayout,
    smell: SmellKind,
    engine: &str,
) -> Result<Vec<DetectionRecord>> {
    let table = MetricsTable::read(&layout.smell_table(smell), "analyzer smell table")?;
    if !table.has_column(SMELL_COLUMNS) || !table.has_column(PACKAGE_COLUMNS) {
        return Err(SmellError::malformed_row(
            0,
            "analyzer smell table needs smell and package columns",
        ));
    }
    if smell.granularity() == Granularity::Class && !table.has_column(CLASS_COLUMNS) {
        return Err(SmellError::malformed_row(
            0,
            format!("{} verdicts need a class column", smell.display_name()),
        ));
    }

    let mut seen = BTreeSet::new();
    let mut records = Vec::new();

    for row in &table.rows {
        let matches = row
            .first_of(SMELL_COLUMNS)
            .and_then(|name| name.parse::<SmellKind>().ok())
            == Some(smell);
        if !matches {
            continue;
        }

        let package = package_key(row.first_of(PACKAGE_COLUMNS).unwrap_or_default());
        let identifier = match smell.granularity() {
            Granularity::Package => package.to_string(),
            Granularity::Class => match row.first_of(CLASS_COLUMNS).filter(|c| !c.is_empty()) {
                Some(class) => format!("{}.{}", package, class),
                None => {
                    warn!("Row {} names no class, skipped", row.index);
                    continue;
                }
            },
        };

        if !seen.insert(identifier.clone()) {
            continue;
        }

        let record = DetectionRecord::new(identifier, true);
        records.push(match row.first_of(CAUSE_COLUMNS).filter(|c| !c.is_empty()) {
            Some(cause) => record.with_justification(cause),
            None => record,
        });
    }

    info!(
        "{} {}: {} analyzer detections",
        layout.project(),
        smell,
        records.len()
    );
    write_json_atomic(&layout.labels(smell, engine, LabelSource::Analyzer), &records)?;
    Ok(records)
}

/// Read a consolidated label file
pub fn load_labels(path: &Path) -> Result<Vec<DetectionRecord>> {
    if !path.exists() {
        return Err(SmellError::missing("consolidated labels", path));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalyzerConfig, PathsConfig};
    use crate::storage::write_atomic;
    use tempfile::TempDir;

    fn layout(dir: &TempDir) -> ProjectLayout {
        let paths = PathsConfig {
            repositories_dir: dir.path().join("repos"),
            output_dir: dir.path().join("out"),
            templates_dir: dir.path().join("templates"),
        };
        ProjectLayout::new("demo", paths, AnalyzerConfig::default())
    }

    fn answer(layout: &ProjectLayout, smell: SmellKind, stem: &str, body: &str) {
        let path = layout.llm_outputs_dir(smell, "gpt").join(format!("{}.txt", stem));
        write_atomic(&path, body).unwrap();
    }

    #[test]
    fn test_llm_outputs_with_manifest() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        let smell = SmellKind::InsufficientModularization;

        let mut manifest = PromptManifest::default();
        manifest.insert("a_X", "a.X");
        manifest.insert("a_Y", "a.Y");
        manifest.insert("b_Z", "b.Z");
        write_json_atomic(&layout.prompt_manifest(smell), &manifest).unwrap();

        answer(&layout, smell, "a_X", r#"{"class": "X", "detection": true}"#);
        answer(&layout, smell, "a_Y", "I refuse to answer.");

        let result = consolidate_llm_outputs(&layout, smell, "gpt").unwrap();
        assert_eq!(result.unparseable, 1);
        assert_eq!(result.missing, 1);
        assert_eq!(
            result.records,
            vec![DetectionRecord::new("a.X", true), DetectionRecord::new("a.Y", false)]
        );

        let stored = load_labels(&layout.labels(smell, "gpt", LabelSource::Llm)).unwrap();
        assert_eq!(stored, result.records);
    }

    #[test]
    fn test_llm_outputs_without_manifest() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        let smell = SmellKind::GodComponent;
        answer(&layout, smell, "a", r#"{"package": "a", "detection": "true"}"#);
        answer(&layout, smell, "b", "not json at all");

        let result = consolidate_llm_outputs(&layout, smell, "gpt").unwrap();
        assert_eq!(result.records, vec![DetectionRecord::new("a", true)]);
        assert_eq!(result.unparseable, 1);
    }

    #[test]
    fn test_llm_outputs_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err =
            consolidate_llm_outputs(&layout(&dir), SmellKind::GodComponent, "gpt").unwrap_err();
        assert!(matches!(err, SmellError::InputMissing { .. }));
    }

    #[test]
    fn test_analyzer_outputs() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        write_atomic(
            &layout.smell_table(SmellKind::GodComponent),
            "Project Name,Package Name,Architecture Smell,Cause of the Smell\n\
             demo,a,God Component,too big\n\
             demo,a,God Component,duplicate row\n\
             demo,b,Unstable Dependency,unstable\n\
             demo,c,God Component,\n",
        )
        .unwrap();

        let records =
            consolidate_analyzer_outputs(&layout, SmellKind::GodComponent, "gpt").unwrap();
        assert_eq!(
            records,
            vec![
                DetectionRecord::new("a", true).with_justification("too big"),
                DetectionRecord::new("c", true),
            ]
        );
        assert!(layout
            .labels(SmellKind::GodComponent, "gpt", LabelSource::Analyzer)
            .exists());
    }

    #[test]
    fn test_analyzer_class_level_outputs() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        write_atomic(
            &layout.smell_table(SmellKind::HubLikeModularization),
            "Smell,Package,Class,Description\n\
             Hub-like Modularization,b,Y,many deps\n\
             Insufficient Modularization,a,X,large\n\
             Hub-like Modularization,,Main,\n",
        )
        .unwrap();

        let records =
            consolidate_analyzer_outputs(&layout, SmellKind::HubLikeModularization, "gpt").unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["b.Y", "default_package.Main"]);
    }

    #[test]
    fn test_analyzer_table_missing() {
        let dir = TempDir::new().unwrap();
        let err = consolidate_analyzer_outputs(&layout(&dir), SmellKind::GodComponent, "gpt")
            .unwrap_err();
        assert!(matches!(err, SmellError::InputMissing { .. }));
    }
}

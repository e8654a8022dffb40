//! Scoring Engine
//!
//! Compares LLM detections against the analyzer's verdicts, per project, smell
//! and engine. Consolidation produces the two label files; scoring reads them
//! back and writes `<smell>_metrics.json` plus one aggregate per engine.

pub mod confusion;
pub mod consolidate;

pub use confusion::{ConfusionMatrix, EvaluationReport, LabelSet, ScoreMetrics};
pub use consolidate::{
    Consolidation, consolidate_analyzer_outputs, consolidate_llm_outputs, load_labels,
};

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::storage::{LabelSource, ProjectLayout, write_json_atomic};
use crate::types::{Result, SmellError, SmellKind};

/// Score one smell from its consolidated label files
pub fn score_smell(
    layout: &ProjectLayout,
    smell: SmellKind,
    engine: &str,
) -> Result<EvaluationReport> {
    let llm = load_labels(&layout.labels(smell, engine, LabelSource::Llm))?;
    let truth = load_labels(&layout.labels(smell, engine, LabelSource::Analyzer))?;

    let report =
        EvaluationReport::evaluate(&LabelSet::from_records(&llm), &LabelSet::from_records(&truth));
    write_json_atomic(&layout.metrics_report(smell, engine), &report)?;

    info!(
        "{} {} ({}): precision {:.3}, recall {:.3}, f1 {:.3}",
        layout.project(),
        smell,
        engine,
        report.metrics.precision,
        report.metrics.recall,
        report.metrics.f1
    );
    Ok(report)
}

/// Score every smell with label files and write the per-engine aggregate
///
/// Smells whose label files are absent are left out with a warning; any other
/// failure aborts.
pub fn score_all(
    layout: &ProjectLayout,
    smells: &[SmellKind],
    engine: &str,
) -> Result<BTreeMap<String, EvaluationReport>> {
    let mut aggregate = BTreeMap::new();

    for &smell in smells {
        match score_smell(layout, smell, engine) {
            Ok(report) => {
                aggregate.insert(smell.slug().to_string(), report);
            }
            Err(SmellError::InputMissing { what, path }) => {
                warn!("Not scoring {}: missing {} {}", smell, what, path);
            }
            Err(e) => return Err(e),
        }
    }

    write_json_atomic(&layout.aggregate_results(engine), &aggregate)?;
    Ok(aggregate)
}

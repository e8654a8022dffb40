//! Score Command
//!
//! Consolidate both label sets and score the LLM against the analyzer.
//!
//! Usage:
//!   smellscope score <project> [--smell S] [--engine E]

use std::collections::BTreeMap;

use tracing::warn;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, selected_smells};
use crate::scoring::{
    EvaluationReport, consolidate_analyzer_outputs, consolidate_llm_outputs, score_all,
};
use crate::types::{Result, SmellError, SmellKind};

pub fn run(
    ctx: &CommandContext,
    project: &str,
    smell: Option<SmellKind>,
    engine: Option<&str>,
) -> Result<BTreeMap<String, EvaluationReport>> {
    let layout = ctx.layout(project)?;
    let (engine_name, _) = ctx.engine(engine)?;
    let out = Output::new();

    let mut scored = Vec::new();
    for smell in selected_smells(smell) {
        let consolidated = consolidate_llm_outputs(&layout, smell, engine_name)
            .and_then(|llm| consolidate_analyzer_outputs(&layout, smell, engine_name).map(|_| llm));

        match consolidated {
            Ok(llm) => {
                if llm.unparseable > 0 {
                    out.warning(&format!(
                        "{}: {} unparseable answers scored as not detected",
                        smell, llm.unparseable
                    ));
                }
                scored.push(smell);
            }
            Err(SmellError::InputMissing { what, path }) => {
                warn!("Skipping {} for {}: missing {}", smell, project, what);
                out.warning(&format!("{}: missing {} {}", smell, what, path));
            }
            Err(e) => return Err(e),
        }
    }

    let aggregate = score_all(&layout, &scored, engine_name)?;

    out.header(&format!("{} ({})", project, engine_name));
    out.score_table(aggregate.iter().map(|(smell, report)| (smell.as_str(), report)));
    out.field("results", layout.aggregate_results(engine_name).display());

    Ok(aggregate)
}

//! Detect Command
//!
//! Send generated prompts to one engine and store the answers.
//!
//! Usage:
//!   smellscope detect <project> [--smell S] [--engine E]

use crate::ai::{DetectionRunner, DetectionSummary, create_provider};
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, selected_smells};
use crate::types::{Result, SmellKind};

/// Returns the number of prompts that failed
pub async fn run(
    ctx: &CommandContext,
    project: &str,
    smell: Option<SmellKind>,
    engine: Option<&str>,
) -> Result<usize> {
    let layout = ctx.layout(project)?;
    let (engine_name, engine_config) = ctx.engine(engine)?;
    let provider = create_provider(engine_name, engine_config)?;
    let runner = DetectionRunner::new(provider, engine_name, ctx.config.detection.clone());

    let out = Output::new();
    out.header(&format!("{} on {}", project, engine_name));

    let mut total = DetectionSummary::default();
    for smell in selected_smells(smell) {
        let summary = runner.run(&layout, smell).await?;
        out.detection(smell.slug(), &summary);

        total.written += summary.written;
        total.skipped += summary.skipped;
        total.oversize.extend(summary.oversize);
        total.failed.extend(summary.failed);
    }

    Ok(total.failed.len())
}

//! Run Command
//!
//! Full batch over a project list: model → prompts → (detect) → score.
//! A failing project is reported and the batch moves on.
//!
//! Usage:
//!   smellscope run --project P [--project Q ...] [--smell S] [--engine E] [--detect]

use tracing::{error, info};

use super::{detect, model, prompts, score};
use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::types::{Result, SmellKind};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub projects: Vec<String>,
    pub smell: Option<SmellKind>,
    pub engine: Option<String>,
    /// Call the LLM; otherwise score existing answers
    pub detect: bool,
}

/// Returns the projects that failed
pub async fn run(ctx: &CommandContext, options: &RunOptions) -> Vec<String> {
    let out = Output::new();
    let mut failed = Vec::new();

    for project in &options.projects {
        out.header(project);
        match run_project(ctx, project, options).await {
            Ok(()) => info!("Finished {}", project),
            Err(e) => {
                error!("Project {} failed: {}", project, e);
                out.error(&format!("{}: {}", project, e));
                failed.push(project.clone());
            }
        }
    }

    if failed.is_empty() {
        out.success(&format!("{} projects processed", options.projects.len()));
    } else {
        out.warning(&format!(
            "{} of {} projects failed: {}",
            failed.len(),
            options.projects.len(),
            failed.join(", ")
        ));
    }
    failed
}

async fn run_project(ctx: &CommandContext, project: &str, options: &RunOptions) -> Result<()> {
    let engine = options.engine.as_deref();

    model::run(ctx, project)?;
    prompts::run(ctx, project, options.smell)?;

    if options.detect {
        let failures = detect::run(ctx, project, options.smell, engine).await?;
        if failures > 0 {
            // partial answers are still scored
            error!("{} prompts failed for {}", failures, project);
        }
    }

    score::run(ctx, project, options.smell, engine)?;
    Ok(())
}

//! Model Command
//!
//! Build `project_metrics.json` from the analyzer outputs of one project.
//!
//! Usage:
//!   smellscope model <project>

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::metrics::MetricsCollector;
use crate::types::{ProjectModel, Result};

pub fn run(ctx: &CommandContext, project: &str) -> Result<ProjectModel> {
    let layout = ctx.layout(project)?;
    let output_path = layout.project_model();
    let collector = MetricsCollector::new(layout, ctx.config.analyzer.clone());
    let model = collector.collect()?;

    let out = Output::new();
    let summary = model.summary();
    out.success(&format!("Project model built for {}", model.project()));
    out.field("packages", summary.total_packages);
    out.field("classes", summary.total_classes);
    out.field("written", output_path.display());

    Ok(model)
}

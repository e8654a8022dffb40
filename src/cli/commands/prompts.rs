//! Prompts Command
//!
//! Render detection prompts from an existing project model.
//!
//! Usage:
//!   smellscope prompts <project> [--smell S]

use crate::ai::PromptGenerator;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, selected_smells};
use crate::metrics::load_model;
use crate::types::{Result, SmellKind};

pub fn run(ctx: &CommandContext, project: &str, smell: Option<SmellKind>) -> Result<()> {
    let layout = ctx.layout(project)?;
    let model = load_model(&layout.project_model())?;
    let generator = PromptGenerator::new(&layout, ctx.config.prompts.clone());

    let out = Output::new();
    for smell in selected_smells(smell) {
        let set = generator.generate(smell, &model)?;
        out.success(&format!(
            "{}: {} prompts in {}",
            smell,
            set.manifest.len(),
            set.dir.display()
        ));
    }
    Ok(())
}

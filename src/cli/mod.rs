pub mod commands;
pub mod ui;
pub mod util;

pub use commands::run::RunOptions;
pub use util::{CommandContext, selected_smells};

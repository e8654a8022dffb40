pub mod config;
pub mod detect;
pub mod model;
pub mod prompts;
pub mod run;
pub mod score;

//! LLM Answer Validation
//!
//! Answers are untrusted text. `JsonRepairer` recovers a JSON value from the
//! usual formatting damage; `DetectionParser` reads detection verdicts out of it.
//! Neither fails loudly: an unparseable answer is `None`, and the caller counts it.

mod detection;
mod json_repair;

pub use detection::DetectionParser;
pub use json_repair::{JsonRepairer, Repair};

//! Flat-file persistence
//!
//! All state lives in plain files under the configured output directory.

pub mod atomic;
pub mod layout;

pub use atomic::{write_atomic, write_json_atomic};
pub use layout::{LabelSource, ProjectLayout};

//! Metrics graph reconstruction
//!
//! Analyzer tables and dependency graph in, one consistent [`ProjectModel`] out.
//!
//! [`ProjectModel`]: crate::types::ProjectModel

pub mod assembler;
pub mod collector;
pub mod entity;
pub mod graph;
pub mod table;

pub use assembler::GraphAssembler;
pub use collector::{MetricsCollector, load_model};
pub use entity::EntityExtractor;
pub use graph::{Adjacency, DependencyGraph, package_of};
pub use table::{MetricsTable, NormalizedHeaders, TableRow, normalize_header, normalize_headers};

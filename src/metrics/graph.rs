//! Dependency Graph Parser
//!
//! Reads the analyzer's GraphML output. Every `<edge source=".." target="..">` holds two
//! fully-qualified class names; the parser folds them into deduplicated class→class
//! and package→package relations.
//!
//! A missing or malformed graph is an error. An empty relation is only ever the
//! result of a well-formed graph without edges.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::constants::model::DEFAULT_PACKAGE;
use crate::types::{Result, SmellError, qualified_name};

pub type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Package part of a fully-qualified class name.
///
/// Heuristic: trailing segments starting with an uppercase letter are class or
/// nested-class names. Names that break the lowercase-package convention split in
/// the wrong place; an empty segment stops the scan.
pub fn package_of(qualified: &str) -> String {
    let mut parts: Vec<&str> = qualified.split('.').collect();
    while let Some(last) = parts.last() {
        match last.chars().next() {
            Some(c) if c.is_uppercase() => {
                parts.pop();
            }
            _ => break,
        }
    }
    parts.join(".")
}

/// Package key and class identifier of one edge endpoint
fn endpoint(qualified: &str) -> (String, String) {
    let package = package_of(qualified);
    if package.is_empty() {
        (
            DEFAULT_PACKAGE.to_string(),
            qualified_name(DEFAULT_PACKAGE, qualified),
        )
    } else {
        (package, qualified.to_string())
    }
}

/// Deduplicated dependency relations at class and package granularity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    pub package_dependencies: Adjacency,
    pub class_dependencies: Adjacency,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one class-level edge into both relations. Self-edges are discarded.
    ///
    /// Classes without a package arrive as bare names (`Main`) and are keyed as
    /// `default_package.Main`, matching the extracted entities.
    pub fn add_edge(&mut self, source: &str, target: &str) {
        let (source_pkg, source) = endpoint(source);
        let (target_pkg, target) = endpoint(target);

        if source_pkg != target_pkg {
            self.package_dependencies
                .entry(source_pkg)
                .or_default()
                .insert(target_pkg);
        }

        if source != target {
            self.class_dependencies
                .entry(source)
                .or_default()
                .insert(target);
        }
    }

    /// Parse a GraphML file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SmellError::graph(path, "file not found"));
        }
        let xml = fs::read_to_string(path).map_err(|e| SmellError::graph(path, e.to_string()))?;
        Self::parse(&xml, path)
    }

    /// Parse GraphML text; `origin` only labels errors
    pub fn parse(xml: &str, origin: &Path) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut graph = Self::new();
        let mut depth = 0usize;
        let mut saw_element = false;
        let mut edges = 0usize;

        loop {
            let event = reader.read_event().map_err(|e| {
                SmellError::graph(
                    origin,
                    format!("XML error at byte {}: {}", reader.error_position(), e),
                )
            })?;

            match event {
                Event::Start(e) => {
                    saw_element = true;
                    depth += 1;
                    if e.local_name().as_ref() == b"edge" {
                        let (source, target) = edge_endpoints(&e, origin)?;
                        graph.add_edge(&source, &target);
                        edges += 1;
                    }
                }
                Event::Empty(e) => {
                    saw_element = true;
                    if e.local_name().as_ref() == b"edge" {
                        let (source, target) = edge_endpoints(&e, origin)?;
                        graph.add_edge(&source, &target);
                        edges += 1;
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_element {
            return Err(SmellError::graph(origin, "document has no elements"));
        }
        if depth != 0 {
            return Err(SmellError::graph(origin, "unexpected end of document"));
        }

        debug!(
            "Parsed {} edges: {} classes and {} packages with dependencies",
            edges,
            graph.class_dependencies.len(),
            graph.package_dependencies.len()
        );
        Ok(graph)
    }
}

fn edge_endpoints(element: &BytesStart<'_>, origin: &Path) -> Result<(String, String)> {
    let read = |name: &str| -> Result<String> {
        let attr = element
            .try_get_attribute(name)
            .map_err(|e| SmellError::graph(origin, format!("bad edge attribute: {}", e)))?
            .ok_or_else(|| SmellError::graph(origin, format!("edge without '{}'", name)))?;
        let value = attr
            .unescape_value()
            .map_err(|e| SmellError::graph(origin, format!("bad '{}' value: {}", name, e)))?;
        Ok(value.trim().to_string())
    };

    Ok((read("source")?, read("target")?))
}

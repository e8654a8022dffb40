//! Hub-like Modularization: each class with its one-hop class neighbors.
//!
//! `outgoing_dependencies` and `incoming_dependencies` list identifiers; every
//! neighbor's detail appears once in `neighbors`, tagged with its direction.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{ContextBuilder, ContextItem, ModelIndex, class_stem};
use crate::types::{ClassEntity, Result, SmellKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

impl Direction {
    fn merge(self, other: Direction) -> Direction {
        if self == other { self } else { Direction::Both }
    }
}

#[derive(Serialize)]
struct ClassNode<'a> {
    package: &'a str,
    class: &'a str,
    dependencies: &'a [String],
}

impl<'a> ClassNode<'a> {
    fn of(class: &'a ClassEntity) -> Self {
        Self {
            package: &class.package,
            class: &class.name,
            dependencies: &class.dependencies,
        }
    }
}

#[derive(Serialize)]
struct Neighbor<'a> {
    #[serde(flatten)]
    node: ClassNode<'a>,
    direction: Direction,
}

#[derive(Serialize)]
struct HubLikeView<'a> {
    analyzed_class: ClassNode<'a>,
    outgoing_dependencies: Vec<&'a str>,
    incoming_dependencies: Vec<&'a str>,
    neighbors: Vec<Neighbor<'a>>,
}

pub struct HubLikeContext;

impl ContextBuilder for HubLikeContext {
    fn smell(&self) -> SmellKind {
        SmellKind::HubLikeModularization
    }

    fn build(&self, index: &ModelIndex<'_>) -> Result<Vec<ContextItem>> {
        index
            .classes()
            .map(|(id, class)| {
                let outgoing: Vec<&str> = class
                    .dependencies
                    .iter()
                    .map(String::as_str)
                    .filter(|dep| index.class(dep).is_some())
                    .collect();
                let incoming = index.class_dependents(id);

                let mut directions: BTreeMap<&str, Direction> = BTreeMap::new();
                for dep in &outgoing {
                    directions.insert(*dep, Direction::Outgoing);
                }
                for dep in &incoming {
                    directions
                        .entry(*dep)
                        .and_modify(|d| *d = d.merge(Direction::Incoming))
                        .or_insert(Direction::Incoming);
                }

                let neighbors = directions
                    .into_iter()
                    .filter_map(|(neighbor, direction)| {
                        index.class(neighbor).map(|c| Neighbor {
                            node: ClassNode::of(c),
                            direction,
                        })
                    })
                    .collect();

                let view = HubLikeView {
                    analyzed_class: ClassNode::of(class),
                    outgoing_dependencies: outgoing,
                    incoming_dependencies: incoming,
                    neighbors,
                };
                ContextItem::new(id.to_string(), class_stem(&class.package, &class.name), &view)
            })
            .collect()
    }
}

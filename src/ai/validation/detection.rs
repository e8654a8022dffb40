//! Detection answer parsing
//!
//! Accepted shapes (after JSON repair):
//!
//! ```text
//! {"package"|"class"|"identifier": "...", "detection": true, "justification": "..."}
//! {"package": "a", "detections": [{"class": "X", "detection": false, ...}, ...]}
//! {"class": "a.X", "outgoing": {"detection": true, ...}, "incoming": {...}}
//! [ any of the above ]
//! ```
//!
//! `detection` may be a JSON bool, `"true"`/`"false"` (any case), `"yes"`/`"no"`
//! or `1`/`0`. An entry without a readable `detection` makes the whole answer
//! unparseable.

use serde_json::{Map, Value};

use super::json_repair::{JsonRepairer, Repair};
use crate::types::DetectionRecord;

#[derive(Debug, Clone, Default)]
pub struct DetectionParser {
    repairer: JsonRepairer,
}

impl DetectionParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record found in the answer, identifiers taken from the body
    pub fn parse(&self, raw: &str) -> Option<Vec<DetectionRecord>> {
        self.parse_with_repair(raw).map(|(records, _)| records)
    }

    pub fn parse_with_repair(&self, raw: &str) -> Option<(Vec<DetectionRecord>, Repair)> {
        let (value, repair) = self.repairer.parse(raw)?;
        let records = match value {
            Value::Array(items) => {
                let mut records = Vec::new();
                for item in &items {
                    records.extend(records_from(item.as_object()?)?);
                }
                records
            }
            Value::Object(map) => records_from(&map)?,
            _ => return None,
        };
        if records.is_empty() {
            return None;
        }
        Some((records, repair))
    }

    /// One verdict for a known entity
    ///
    /// The answer's own identifiers are ignored: the entity is detected when any
    /// record in the answer is detected.
    pub fn parse_for(&self, raw: &str, identifier: &str) -> Option<DetectionRecord> {
        let records = self.parse(raw)?;
        let detected = records.iter().any(|r| r.detection);
        let justification = records
            .iter()
            .filter(|r| r.detection == detected)
            .find_map(|r| r.justification.clone());

        let record = DetectionRecord::new(identifier, detected);
        Some(match justification {
            Some(text) => record.with_justification(text),
            None => record,
        })
    }
}

fn records_from(map: &Map<String, Value>) -> Option<Vec<DetectionRecord>> {
    if let Some(Value::Array(entries)) = map.get("detections") {
        let package = string_field(map, &["package"]);
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.as_object()?;
            let mut record = single_record(entry)?;
            if let Some(package) = &package
                && !record.identifier.is_empty()
                && !record.identifier.contains('.')
            {
                record.identifier = format!("{}.{}", package, record.identifier);
            }
            records.push(record);
        }
        return Some(records);
    }

    if map.contains_key("outgoing") || map.contains_key("incoming") {
        return hub_like_record(map).map(|r| vec![r]);
    }

    single_record(map).map(|r| vec![r])
}

fn single_record(map: &Map<String, Value>) -> Option<DetectionRecord> {
    let detection = detection_value(map.get("detection")?)?;
    let record = DetectionRecord::new(identifier_of(map), detection);
    Some(match string_field(map, &["justification"]) {
        Some(text) => record.with_justification(text),
        None => record,
    })
}

/// Detected when either direction is
fn hub_like_record(map: &Map<String, Value>) -> Option<DetectionRecord> {
    let mut detected = false;
    let mut seen = false;
    let mut notes = Vec::new();

    for side in ["outgoing", "incoming"] {
        let Some(value) = map.get(side) else {
            continue;
        };
        let (flag, note) = match value {
            Value::Object(inner) => (
                detection_value(inner.get("detection")?)?,
                string_field(inner, &["justification"]),
            ),
            other => (detection_value(other)?, None),
        };
        seen = true;
        detected |= flag;
        if let Some(note) = note {
            notes.push(format!("{}: {}", side, note));
        }
    }

    if let Some(value) = map.get("detection") {
        detected |= detection_value(value)?;
        seen = true;
    }
    if !seen {
        return None;
    }

    if let Some(text) = string_field(map, &["justification"]) {
        notes.insert(0, text);
    }

    let record = DetectionRecord::new(identifier_of(map), detected);
    Some(if notes.is_empty() {
        record
    } else {
        record.with_justification(notes.join("\n"))
    })
}

fn identifier_of(map: &Map<String, Value>) -> String {
    if let Some(id) = string_field(map, &["identifier"]) {
        return id;
    }
    let package = string_field(map, &["package"]);
    let class = string_field(map, &["class", "analyzed_class"]);
    match (package, class) {
        (Some(p), Some(c)) if !c.contains('.') => format!("{}.{}", p, c),
        (_, Some(c)) => c,
        (Some(p), None) => p,
        (None, None) => String::new(),
    }
}

fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn detection_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

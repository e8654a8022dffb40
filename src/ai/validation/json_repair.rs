//! JSON Repair for LLM answers
//!
//! Detection answers are meant to be a single JSON object but arrive as:
//! - fenced blocks (```json ... ```), possibly after a prose preamble
//! - objects with trailing commas or a truncated tail
//! - Python-style literals (`True`, `False`, `None`)
//! - JSON embedded in explanatory text
//!
//! Repair never fails loudly: callers get `None` and decide how to count it.

use serde_json::Value;
use tracing::debug;

/// How the value was recovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// Parsed as-is after trimming and fence removal
    None,
    /// Needed syntax fixes (commas, literals, closers)
    Patched,
    /// Cut out of surrounding prose
    Extracted,
}

#[derive(Debug, Clone, Copy)]
pub struct JsonRepairer {
    max_passes: usize,
}

impl Default for JsonRepairer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRepairer {
    pub fn new() -> Self {
        Self { max_passes: 2 }
    }

    /// Recover a JSON value from raw model output
    pub fn parse(&self, raw: &str) -> Option<(Value, Repair)> {
        let cleaned = preprocess(raw);
        if cleaned.is_empty() {
            return None;
        }

        if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
            return Some((value, Repair::None));
        }

        for pass in 1..=self.max_passes {
            let patched = patch(&cleaned, pass);
            if let Ok(value) = serde_json::from_str::<Value>(&patched) {
                debug!("JSON repaired on pass {}", pass);
                return Some((value, Repair::Patched));
            }
        }

        // Prose may carry brackets of its own; try every opening bracket in turn.
        // Objects (or arrays holding objects) beat bare scalars and lists.
        let mut fallback = None;
        for start in bracket_starts(&cleaned).take(MAX_EXTRACTION_CANDIDATES) {
            let Some(value) = self.parse_candidate(balanced_from(&cleaned, start)) else {
                continue;
            };
            if holds_object(&value) {
                debug!("JSON extracted from mixed content at offset {}", start);
                return Some((value, Repair::Extracted));
            }
            fallback.get_or_insert(value);
        }
        fallback.map(|value| (value, Repair::Extracted))
    }

    fn parse_candidate(&self, candidate: &str) -> Option<Value> {
        serde_json::from_str::<Value>(candidate)
            .or_else(|_| serde_json::from_str::<Value>(&patch(candidate, self.max_passes)))
            .ok()
    }
}

// ===== Preprocessing =====

fn preprocess(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    match fenced_block(trimmed) {
        Some(inner) => inner.trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Body of the first ``` fence, wherever it starts
fn fenced_block(s: &str) -> Option<&str> {
    let open = s.find("```")?;
    let after = &s[open + 3..];
    // skip the info string (`json`, `JSON`, ...)
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```").unwrap_or(body.len());
    Some(&body[..end])
}

// ===== Patching =====

fn patch(s: &str, pass: usize) -> String {
    let mut result = replace_python_literals(s);
    result = drop_trailing_commas(&result);
    if pass >= 2 {
        result = close_open_structures(&result);
        result = drop_trailing_commas(&result);
    }
    result
}

/// Map `True`/`False`/`None` outside strings to JSON literals
fn replace_python_literals(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escape = false;
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        match word.as_str() {
            "True" => out.push_str("true"),
            "False" => out.push_str("false"),
            "None" => out.push_str("null"),
            other => out.push_str(other),
        }
        word.clear();
    };

    for ch in s.chars() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch.is_ascii_alphabetic() {
            word.push(ch);
            continue;
        }

        flush(&mut word, &mut out);
        if ch == '"' {
            in_string = true;
        }
        out.push(ch);
    }
    flush(&mut word, &mut out);
    out
}

fn drop_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escape = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            out.push(ch);
            continue;
        }

        match ch {
            '"' => in_string = true,
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some(']') | Some('}') | None) {
                    continue;
                }
            }
            _ => {}
        }
        out.push(ch);
    }
    out
}

/// Close an unterminated string and any open brackets, innermost first
fn close_open_structures(s: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for ch in s.chars() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = s.trim_end().to_string();
    if in_string {
        out.push('"');
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

// ===== Extraction =====

const MAX_EXTRACTION_CANDIDATES: usize = 64;

fn bracket_starts(s: &str) -> impl Iterator<Item = usize> + '_ {
    s.char_indices()
        .filter(|(_, ch)| matches!(ch, '{' | '['))
        .map(|(i, _)| i)
}

fn holds_object(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().any(Value::is_object),
        _ => false,
    }
}

/// Balanced `{...}` or `[...]` opening at `start`; the unbalanced tail otherwise
fn balanced_from(s: &str, start: usize) -> &str {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (offset, ch) in s[start..].char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &s[start..start + offset + 1];
                }
            }
            _ => {}
        }
    }

    // unbalanced tail: hand it to the patcher
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Option<(Value, Repair)> {
        JsonRepairer::new().parse(raw)
    }

    #[test]
    fn test_valid_json() {
        let (value, repair) = parse(r#"{"package": "a", "detection": true}"#).unwrap();
        assert_eq!(repair, Repair::None);
        assert_eq!(value["detection"], true);
    }

    #[test]
    fn test_fenced_after_preamble() {
        let raw = "Here is my verdict:\n\
                   ```json\n{\"package\": \"a\", \"detection\": false}\n```\nThanks";
        let (value, repair) = parse(raw).unwrap();
        assert_eq!(repair, Repair::None);
        assert_eq!(value["package"], "a");
    }

    #[test]
    fn test_trailing_comma_and_python_literals() {
        let raw = r#"{"class": "X", "detection": True, "justification": "None of it",}"#;
        let (value, repair) = parse(raw).unwrap();
        assert_eq!(repair, Repair::Patched);
        assert_eq!(value["detection"], true);
        assert_eq!(value["justification"], "None of it");
    }

    #[test]
    fn test_truncated_tail() {
        let raw = r#"{"package": "a", "detections": [{"class": "X", "detection": false"#;
        let (value, _) = parse(raw).unwrap();
        assert_eq!(value["detections"][0]["class"], "X");
    }

    #[test]
    fn test_extract_from_prose() {
        let raw = r#"The package is fine. {"package": "a", "detection": false} Let me know."#;
        let (value, repair) = parse(raw).unwrap();
        assert_eq!(repair, Repair::Extracted);
        assert_eq!(value["detection"], false);
    }

    #[test]
    fn test_brackets_in_prose_before_json() {
        let raw = "Analysis [step 1] done.\n{\"package\": \"a\", \"detection\": true}";
        let (value, repair) = parse(raw).unwrap();
        assert_eq!(repair, Repair::Extracted);
        assert_eq!(value["package"], "a");
        assert_eq!(value["detection"], true);
    }

    #[test]
    fn test_object_preferred_over_prose_list() {
        let raw = "Checked [1, 2] metrics. {\"class\": \"X\", \"detection\": false}";
        let (value, _) = parse(raw).unwrap();
        assert_eq!(value["class"], "X");
    }

    #[test]
    fn test_unrecoverable() {
        assert!(parse("").is_none());
        assert!(parse("I cannot determine this.").is_none());
    }
}

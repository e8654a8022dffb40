//! Tabular Normalizer
//!
//! Analyzer tables arrive with inconsistent headers (`Package Name`, `\u{feff}package`,
//! ` LOC `). Headers are rewritten to one canonical snake_case key set before any
//! row is interpreted.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::types::{Result, SmellError};

const BOM: char = '\u{feff}';

/// Canonical form of one header: BOM removed, trimmed, lower-cased, spaces → `_`
pub fn normalize_header(header: &str) -> String {
    header
        .replace(BOM, "")
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}

/// Normalized headers plus the original text behind each (for diagnostics)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedHeaders {
    pub columns: Vec<String>,
    pub original: BTreeMap<String, String>,
}

/// Normalize a header row. Total over any input.
///
/// The diagnostic mapping keeps the cleaned original (BOM removed, trimmed) of the
/// first header that produced each normalized name.
pub fn normalize_headers<I, S>(headers: I) -> NormalizedHeaders
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = NormalizedHeaders::default();

    for header in headers {
        let raw = header.as_ref();
        let normalized = normalize_header(raw);
        let clean = raw.replace(BOM, "").trim().to_string();
        result.original.entry(normalized.clone()).or_insert(clean);
        result.columns.push(normalized);
    }

    result
}

// =============================================================================
// Rows
// =============================================================================

/// One data row keyed by normalized header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// 1-based data row index (header excluded)
    pub index: usize,
    values: BTreeMap<String, String>,
}

impl TableRow {
    pub fn new(index: usize, values: BTreeMap<String, String>) -> Self {
        Self { index, values }
    }

    /// Value of a column, if the column exists
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Value of the first present column among `aliases`
    pub fn first_of(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| self.get(alias))
    }
}

/// A parsed analyzer table with normalized headers
#[derive(Debug, Clone, Default)]
pub struct MetricsTable {
    pub headers: NormalizedHeaders,
    pub rows: Vec<TableRow>,
}

impl MetricsTable {
    /// Read a CSV table from disk
    pub fn read(path: &Path, what: &'static str) -> Result<Self> {
        if !path.exists() {
            return Err(SmellError::missing(what, path));
        }
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse CSV from any reader. Short rows are padded as absent columns.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = normalize_headers(csv_reader.headers()?.iter());
        let mut rows = Vec::new();

        for (idx, record) in csv_reader.records().enumerate() {
            let record = record?;
            let mut values = BTreeMap::new();
            for (column, value) in headers.columns.iter().zip(record.iter()) {
                // first occurrence of a duplicated column wins
                values
                    .entry(column.clone())
                    .or_insert_with(|| value.trim().to_string());
            }
            rows.push(TableRow::new(idx + 1, values));
        }

        Ok(Self { headers, rows })
    }

    pub fn has_column(&self, aliases: &[&str]) -> bool {
        self.headers
            .columns
            .iter()
            .any(|c| aliases.contains(&c.as_str()))
    }
}

//! Confusion matrix and derived scores
//!
//! The left side is always the LLM label set, the right side always the
//! analyzer (ground truth). Identifiers missing from a side count as not detected.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::constants::scoring;
use crate::types::DetectionRecord;

/// Identifier → detected, last write wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: BTreeMap<String, bool>,
}

impl LabelSet {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a DetectionRecord>) -> Self {
        let mut labels = BTreeMap::new();
        for record in records {
            labels.insert(record.identifier.clone(), record.detection);
        }
        Self { labels }
    }

    pub fn insert(&mut self, identifier: impl Into<String>, detected: bool) {
        self.labels.insert(identifier.into(), detected);
    }

    pub fn is_detected(&self, identifier: &str) -> bool {
        self.labels.get(identifier).copied().unwrap_or(false)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        let mut set = Self::default();
        for (id, detected) in iter {
            set.insert(id, detected);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    #[serde(rename = "TP")]
    pub tp: usize,
    #[serde(rename = "TN")]
    pub tn: usize,
    #[serde(rename = "FP")]
    pub fp: usize,
    #[serde(rename = "FN")]
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn compute(llm: &LabelSet, truth: &LabelSet) -> Self {
        let union: BTreeSet<&str> = llm.identifiers().chain(truth.identifiers()).collect();

        let mut matrix = Self::default();
        for id in union {
            match (llm.is_detected(id), truth.is_detected(id)) {
                (true, true) => matrix.tp += 1,
                (false, false) => matrix.tn += 1,
                (true, false) => matrix.fp += 1,
                (false, true) => matrix.fn_ += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }
}

/// Scores rounded for reporting; 0.0 whenever a denominator is zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ScoreMetrics {
    pub fn from_matrix(m: &ConfusionMatrix) -> Self {
        let precision = ratio(m.tp, m.tp + m.fp);
        let recall = ratio(m.tp, m.tp + m.fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy: round(ratio(m.tp + m.tn, m.total())),
            precision: round(precision),
            recall: round(recall),
            f1: round(f1),
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn round(value: f64) -> f64 {
    let factor = 10f64.powi(scoring::METRIC_DECIMALS);
    (value * factor).round() / factor
}

/// Per smell, per engine evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub confusion_matrix: ConfusionMatrix,
    pub metrics: ScoreMetrics,
}

impl EvaluationReport {
    pub fn evaluate(llm: &LabelSet, truth: &LabelSet) -> Self {
        let confusion_matrix = ConfusionMatrix::compute(llm, truth);
        Self {
            metrics: ScoreMetrics::from_matrix(&confusion_matrix),
            confusion_matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_two_sided_example() {
        let llm: LabelSet = [("a", true), ("b", false)].into_iter().collect();
        let truth: LabelSet = [("a", true), ("b", true), ("c", false)].into_iter().collect();

        let report = EvaluationReport::evaluate(&llm, &truth);
        let m = report.confusion_matrix;
        assert_eq!((m.tp, m.fp, m.fn_), (1, 0, 1));
        // "c" is false on both sides
        assert_eq!(m.tn, 1);
        assert_eq!(m.total(), 3);
        assert_eq!(report.metrics.recall, 0.5);
        assert_eq!(report.metrics.precision, 1.0);
        assert_eq!(report.metrics.f1, 0.667);
        assert_eq!(report.metrics.accuracy, 0.667);
    }

    #[test]
    fn test_empty_sets_score_zero() {
        let report = EvaluationReport::evaluate(&LabelSet::default(), &LabelSet::default());
        assert_eq!(report.confusion_matrix.total(), 0);
        assert_eq!(report.metrics, ScoreMetrics::default());
    }

    #[test]
    fn test_last_write_wins() {
        let records = vec![
            DetectionRecord::new("a", true),
            DetectionRecord::new("a", false),
        ];
        let set = LabelSet::from_records(&records);
        assert_eq!(set.len(), 1);
        assert!(!set.is_detected("a"));
        assert!(!set.is_detected("missing"));
    }

    #[test]
    fn test_report_serialization() {
        let llm: LabelSet = [("a", true)].into_iter().collect();
        let report = EvaluationReport::evaluate(&llm, &LabelSet::default());
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["confusion_matrix"]["FP"], 1);
        assert_eq!(json["metrics"]["precision"], 0.0);
    }

    proptest! {
        #[test]
        fn prop_totals_match_union(
            llm in proptest::collection::btree_map("[a-h]", any::<bool>(), 0..5),
            truth in proptest::collection::btree_map("[a-h]", any::<bool>(), 0..5),
        ) {
            let union: BTreeSet<&String> = llm.keys().chain(truth.keys()).collect();
            let llm_set: LabelSet = llm.clone().into_iter().collect();
            let truth_set: LabelSet = truth.clone().into_iter().collect();

            let report = EvaluationReport::evaluate(&llm_set, &truth_set);
            prop_assert_eq!(report.confusion_matrix.total(), union.len());

            let m = report.metrics;
            for score in [m.accuracy, m.precision, m.recall, m.f1] {
                prop_assert!((0.0..=1.0).contains(&score));
            }
        }
    }
}

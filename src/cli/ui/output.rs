use console::style;

use crate::ai::DetectionSummary;
use crate::scoring::EvaluationReport;

/// Styled terminal output for command results
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    /// Indented `label: value` line
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<14} {}", style(format!("{}:", label)).dim(), value);
    }

    pub fn detection(&self, smell: &str, summary: &DetectionSummary) {
        let line = format!(
            "{}: {} written, {} skipped, {} oversize, {} failed",
            smell,
            summary.written,
            summary.skipped,
            summary.oversize.len(),
            summary.failed.len()
        );
        if summary.has_failures() {
            self.warning(&line);
            for (stem, message) in &summary.failed {
                println!("    {} {}", style(stem).dim(), message);
            }
        } else {
            self.success(&line);
        }
    }

    pub fn score_table<'a>(&self, rows: impl IntoIterator<Item = (&'a str, &'a EvaluationReport)>) {
        println!(
            "  {:<30} {:>4} {:>4} {:>4} {:>4} {:>7} {:>7} {:>7} {:>7}",
            style("smell").bold(),
            "TP",
            "TN",
            "FP",
            "FN",
            "acc",
            "prec",
            "recall",
            "f1"
        );
        for (smell, report) in rows {
            let m = &report.confusion_matrix;
            let s = &report.metrics;
            println!(
                "  {:<30} {:>4} {:>4} {:>4} {:>4} {:>7.3} {:>7.3} {:>7.3} {:>7.3}",
                smell, m.tp, m.tn, m.fp, m.fn_, s.accuracy, s.precision, s.recall, s.f1
            );
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

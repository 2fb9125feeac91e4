//! Report rendering.
//!
//! Two independent layouts are produced from the catalog and the result
//! store: a flat CSV-like summary with one line per catalog entry, and a
//! LaTeX table body grouped by category. Benchmarks without an outcome are
//! left blank (flat) or skipped (table), never reported as errors.

use std::fmt::{Display, Write};

use crate::{
    catalog::{BenchmarkEntry, Catalog},
    runner::RunOutcome,
    store::ResultStore,
};

/// Timing columns in the table layout.
///
/// The table has several timing columns but a run records a single elapsed
/// time, so every timing column shows the same value.
pub const TIMING_COLUMNS: usize = 4;

/// `name,` or `name,<secs>,` for every entry, in catalog order.
#[must_use]
pub fn render_flat(catalog: &Catalog, store: &ResultStore) -> String {
    let mut out = String::new();
    for entry in catalog.entries() {
        out.push_str(&entry.name);
        out.push(',');
        if let Some(outcome) = store.get(&entry.name) {
            let _ = write!(out, "{:.2},", outcome.elapsed_secs());
        }
        out.push('\n');
    }
    out
}

/// Table body grouped by category, followed by one summary record per
/// entry of a summarized section that has an outcome.
#[must_use]
pub fn render_table(catalog: &Catalog, store: &ResultStore) -> String {
    let mut out = String::new();
    for category in catalog.categories() {
        let _ = writeln!(
            out,
            "\\multirow{{{}}}{{*}}[-2pt]{{\\rotatebox{{90}}{{{}}}}}",
            category.entries.len(),
            category.name
        );
        for entry in &category.entries {
            if let Some(outcome) = store.get(&entry.name) {
                out.push_str(&table_row(catalog, entry, outcome).render());
                out.push('\n');
            }
        }
        out.push_str("\\hline\n");
    }

    for entry in catalog.uncategorised().filter(|e| e.summarized) {
        if let Some(outcome) = store.get(&entry.name) {
            out.push_str(&summary_record(&entry.name, outcome));
            out.push('\n');
        }
    }
    out
}

fn table_row(catalog: &Catalog, entry: &BenchmarkEntry, outcome: &RunOutcome) -> TableRow {
    let metrics = outcome.metrics;
    let time = format!("{:.2}", outcome.elapsed_secs());
    TableRow::new()
        .cell(entry.display_label())
        // The tabular reserves a column here that is never filled.
        .cell("")
        .cell(optional(metrics.map(|m| m.measures)))
        .cell(optional(metrics.map(|m| m.components)))
        .cell(catalog.components_used(&entry.name))
        .cell(optional(metrics.map(|m| m.solution_size)))
        .repeated(time, TIMING_COLUMNS)
}

/// `name, time, size, spec size, measures, components`.
fn summary_record(name: &str, outcome: &RunOutcome) -> String {
    let metrics = outcome.metrics;
    format!(
        "{name}, {:.2}, {}, {}, {}, {}",
        outcome.elapsed_secs(),
        optional(metrics.map(|m| m.solution_size)),
        optional(metrics.map(|m| m.spec_size)),
        optional(metrics.map(|m| m.measures)),
        optional(metrics.map(|m| m.components)),
    )
}

fn optional(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One table row. The leading category cell is left to the group header,
/// so the row starts with a column separator.
#[derive(Debug, Default)]
struct TableRow {
    cells: Vec<String>,
}

impl TableRow {
    fn new() -> Self {
        Self::default()
    }

    fn cell(mut self, value: impl Display) -> Self {
        self.cells.push(value.to_string());
        self
    }

    /// Fill `columns` cells with the same value.
    fn repeated(mut self, value: impl Display, columns: usize) -> Self {
        let value = value.to_string();
        self.cells.extend(std::iter::repeat_n(value, columns));
        self
    }

    fn render(&self) -> String {
        format!(" & {} \\\\", self.cells.join(" & "))
    }
}

//! Parsing of the size annotations the synthesis tool prints after a solution.
//!
//! A successful run ends with four lines, in this order:
//!
//! ```text
//! (Size: 12) ...
//! (Spec size: 30) ...
//! (#measures: 2) ...
//! (#components: 1) ...
//! ```
//!
//! Only the tail of the invocation's output is inspected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of trailing output lines searched for the annotation block.
pub const TAIL_LINES: usize = 5;

const SIZE: &str = "Size";
const SPEC_SIZE: &str = "Spec size";
const MEASURES: &str = "#measures";
const COMPONENTS: &str = "#components";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSet {
    pub solution_size: u64,
    pub spec_size: u64,
    pub measures: u64,
    pub components: u64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("no `({}: N)` annotation in the last {} lines of output", SIZE, TAIL_LINES)]
    MissingAnnotations,
    #[error("expected `({label}: N)` annotation, found {found:?}")]
    Mismatch { label: &'static str, found: String },
}

/// Extract the metric block from the output of one invocation.
///
/// The block starts at the first `(Size: N)` line within the last
/// [`TAIL_LINES`] lines; the three lines that follow must be the spec size,
/// measure count and component count annotations, in that order.
pub fn extract(output: &str) -> Result<MetricSet, MetricError> {
    let lines: Vec<&str> = output.lines().collect();
    let tail = &lines[lines.len().saturating_sub(TAIL_LINES)..];

    let start = tail
        .iter()
        .position(|line| labeled_value(line, SIZE).is_some())
        .ok_or(MetricError::MissingAnnotations)?;
    let mut block = tail[start..].iter().copied();
    let mut next = |label: &'static str| {
        let line = block.next().unwrap_or_default();
        labeled_value(line, label).ok_or_else(|| MetricError::Mismatch {
            label,
            found: line.to_string(),
        })
    };

    Ok(MetricSet {
        solution_size: next(SIZE)?,
        spec_size: next(SPEC_SIZE)?,
        measures: next(MEASURES)?,
        components: next(COMPONENTS)?,
    })
}

/// Match `(<label>: <digits>)` at the start of `line`; anything may follow.
fn labeled_value(line: &str, label: &str) -> Option<u64> {
    let rest = line
        .trim_end()
        .strip_prefix('(')?
        .strip_prefix(label)?
        .strip_prefix(": ")?;
    let (digits, _) = rest.split_once(')')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_annotation_block() {
        let output = "(Size: 3)\n(Spec size: 5)\n(#measures: 1)\n(#components: 2)\n";
        assert_eq!(
            extract(output).unwrap(),
            MetricSet {
                solution_size: 3,
                spec_size: 5,
                measures: 1,
                components: 2,
            }
        );
    }

    #[test]
    fn skips_leading_solution_text_and_trailing_line() {
        let output = "\
List-Append :: xs: List a -> ys: List a -> List a
append = \\xs . \\ys .
  match xs with
    Nil -> ys
    Cons x3 x4 -> Cons x3 (append x4 ys)
(Size: 17) Total solution size
(Spec size: 23)
(#measures: 2) len elems
(#components: 0)

";
        let metrics = extract(output).unwrap();
        assert_eq!(metrics.solution_size, 17);
        assert_eq!(metrics.spec_size, 23);
        assert_eq!(metrics.measures, 2);
        assert_eq!(metrics.components, 0);
    }

    #[test]
    fn out_of_order_annotations_are_rejected() {
        let output = "(Size: 3)\n(#measures: 1)\n(Spec size: 5)\n(#components: 2)\n";
        assert_eq!(
            extract(output).unwrap_err(),
            MetricError::Mismatch {
                label: SPEC_SIZE,
                found: "(#measures: 1)".to_string(),
            }
        );
    }

    #[test]
    fn missing_block_is_an_error() {
        let err = extract("Synthesis succeeded\n").unwrap_err();
        assert_eq!(err, MetricError::MissingAnnotations);
        assert_eq!(extract("").unwrap_err(), MetricError::MissingAnnotations);
    }

    #[test]
    fn truncated_block_reports_missing_label() {
        let err = extract("(Size: 3)\n(Spec size: 5)\n").unwrap_err();
        assert!(matches!(err, MetricError::Mismatch { label: MEASURES, .. }));
    }

    #[test]
    fn annotations_outside_the_tail_are_ignored() {
        let output = "(Size: 3)\n(Spec size: 5)\n(#measures: 1)\n(#components: 2)\na\nb\nc\nd\ne\n";
        assert_eq!(extract(output).unwrap_err(), MetricError::MissingAnnotations);
    }

    #[test]
    fn labeled_value_requires_digits() {
        assert_eq!(labeled_value("(Size: 42) nodes", SIZE), Some(42));
        assert_eq!(labeled_value("(Size: -1)", SIZE), None);
        assert_eq!(labeled_value("(Size: +1)", SIZE), None);
        assert_eq!(labeled_value("(Size: )", SIZE), None);
        assert_eq!(labeled_value("Size: 4", SIZE), None);
    }
}

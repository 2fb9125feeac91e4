//! Regression check against an oracle log.
//!
//! The oracle is the combined log of an earlier run. Any line that differs
//! from the current log shows up as a zero-context unified diff hunk.

use std::{
    fmt::Write,
    fs, iter,
    ops::{Index, IndexMut},
    path::Path,
};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Equal,
    Delete,
    Insert,
}

/// A run of consecutive changes: `removed` oracle lines starting at
/// `old_start` replaced by `added` log lines starting at `new_start`
/// (both zero based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub new_start: usize,
    pub removed: Vec<String>,
    pub added: Vec<String>,
}

/// Diff the current log against the oracle file.
///
/// Returns `Ok(None)` when the oracle does not exist, and an empty string
/// when the two logs are identical.
pub fn diff_against_oracle(oracle: &Path, log: &Path) -> Result<Option<String>> {
    if !oracle.is_file() {
        log::debug!("no oracle at {}, skipping diff", oracle.display());
        return Ok(None);
    }
    let expected = read_lossy(oracle)?;
    let actual = read_lossy(log)?;
    Ok(Some(unified_diff(
        &oracle.display().to_string(),
        &log.display().to_string(),
        &expected,
        &actual,
    )))
}

/// Logs are compared as text, but a stray non-UTF-8 byte from the tool must
/// show up in the diff rather than abort it.
fn read_lossy(path: &Path) -> std::io::Result<String> {
    Ok(String::from_utf8_lossy(&fs::read(path)?).into_owned())
}

/// Unified diff with zero context lines. Empty when the inputs agree.
#[must_use]
pub fn unified_diff(old_label: &str, new_label: &str, old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let hunks = diff_hunks(&old_lines, &new_lines);
    if hunks.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let _ = writeln!(out, "--- {old_label}");
    let _ = writeln!(out, "+++ {new_label}");
    for hunk in &hunks {
        let _ = writeln!(
            out,
            "@@ -{} +{} @@",
            format_range(hunk.old_start, hunk.removed.len()),
            format_range(hunk.new_start, hunk.added.len())
        );
        for line in &hunk.removed {
            let _ = writeln!(out, "-{line}");
        }
        for line in &hunk.added {
            let _ = writeln!(out, "+{line}");
        }
    }
    out
}

/// Unified range notation: `start` for one line, `start,len` otherwise,
/// where an empty range names the line before it.
fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{len}", start + 1),
    }
}

/// Group a line diff into hunks of consecutive changes.
#[must_use]
pub fn diff_hunks(old: &[&str], new: &[&str]) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut current: Option<Hunk> = None;
    let (mut i, mut j) = (0, 0);

    for edit in shortest_edit_script(old, new) {
        match edit {
            Edit::Equal => {
                hunks.extend(current.take());
                i += 1;
                j += 1;
            }
            Edit::Delete => {
                current
                    .get_or_insert_with(|| Hunk::starting_at(i, j))
                    .removed
                    .push(old[i].to_string());
                i += 1;
            }
            Edit::Insert => {
                current
                    .get_or_insert_with(|| Hunk::starting_at(i, j))
                    .added
                    .push(new[j].to_string());
                j += 1;
            }
        }
    }
    hunks.extend(current);
    hunks
}

impl Hunk {
    fn starting_at(old_start: usize, new_start: usize) -> Self {
        Self {
            old_start,
            new_start,
            removed: Vec::new(),
            added: Vec::new(),
        }
    }
}

/// Myers' shortest edit script between two line sequences.
///
/// Uses the linear-space variant: find the middle snake of the edit graph,
/// then solve both halves independently. Memory stays proportional to the
/// input even when the logs share nothing.
fn shortest_edit_script(old: &[&str], new: &[&str]) -> Vec<Edit> {
    let mut edits = Vec::with_capacity(old.len().max(new.len()));
    conquer(old, new, &mut edits);
    edits
}

fn conquer(old: &[&str], new: &[&str], edits: &mut Vec<Edit>) {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    edits.extend(iter::repeat_n(Edit::Equal, prefix));
    let (old, new) = (&old[prefix..], &new[prefix..]);

    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let (old, new) = (&old[..old.len() - suffix], &new[..new.len() - suffix]);

    if old.is_empty() {
        edits.extend(iter::repeat_n(Edit::Insert, new.len()));
    } else if new.is_empty() {
        edits.extend(iter::repeat_n(Edit::Delete, old.len()));
    } else if let Some((x, y)) = middle_snake(old, new) {
        conquer(&old[..x], &new[..y], edits);
        conquer(&old[x..], &new[y..], edits);
    } else {
        edits.extend(iter::repeat_n(Edit::Delete, old.len()));
        edits.extend(iter::repeat_n(Edit::Insert, new.len()));
    }

    edits.extend(iter::repeat_n(Edit::Equal, suffix));
}

/// Furthest x reached on each diagonal `k = x - y`, indexed by signed `k`.
struct Frontier {
    offset: isize,
    xs: Vec<isize>,
}

impl Frontier {
    #[allow(clippy::cast_sign_loss)]
    fn new(max_d: isize) -> Self {
        Self {
            offset: max_d + 1,
            xs: vec![0; (2 * max_d + 3) as usize],
        }
    }
}

impl Index<isize> for Frontier {
    type Output = isize;

    #[allow(clippy::cast_sign_loss)]
    fn index(&self, k: isize) -> &isize {
        &self.xs[(k + self.offset) as usize]
    }
}

impl IndexMut<isize> for Frontier {
    #[allow(clippy::cast_sign_loss)]
    fn index_mut(&mut self, k: isize) -> &mut isize {
        &mut self.xs[(k + self.offset) as usize]
    }
}

/// Split point of an optimal path through the edit graph of two non-empty
/// sequences with no common prefix or suffix.
///
/// Runs the forward search from `(0, 0)` and the reverse search from
/// `(n, m)` until they overlap. The returned point is strictly inside the
/// graph, so both halves are smaller than the input.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn middle_snake(old: &[&str], new: &[&str]) -> Option<(usize, usize)> {
    let (n, m) = (old.len() as isize, new.len() as isize);
    let delta = n - m;
    let odd = delta & 1 == 1;
    let max_d = (n + m + 1) / 2 + 1;
    let mut forward = Frontier::new(max_d);
    let mut backward = Frontier::new(max_d);
    let inside = |x: isize, y: isize| {
        (0..=n).contains(&x) && (0..=m).contains(&y) && (x, y) != (0, 0) && (x, y) != (n, m)
    };

    for d in 0..max_d {
        for k in (-d..=d).step_by(2) {
            let mut x = if k == -d || (k != d && forward[k - 1] < forward[k + 1]) {
                forward[k + 1]
            } else {
                forward[k - 1] + 1
            };
            let (x0, y0) = (x, x - k);
            let mut y = y0;
            while x < n && y < m && old[x as usize] == new[y as usize] {
                x += 1;
                y += 1;
            }
            forward[k] = x;
            if odd && (k - delta).abs() < d && x + backward[delta - k] >= n && inside(x0, y0) {
                return Some((x0 as usize, y0 as usize));
            }
        }

        // Reverse search, in coordinates measured back from (n, m).
        for k in (-d..=d).step_by(2) {
            let mut x = if k == -d || (k != d && backward[k - 1] < backward[k + 1]) {
                backward[k + 1]
            } else {
                backward[k - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && old[(n - x - 1) as usize] == new[(m - y - 1) as usize] {
                x += 1;
                y += 1;
            }
            backward[k] = x;
            if !odd
                && (k - delta).abs() <= d
                && x + forward[delta - k] >= n
                && inside(n - x, m - y)
            {
                return Some(((n - x) as usize, (m - y) as usize));
            }
        }
    }
    None
}

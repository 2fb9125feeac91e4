//! The benchmark catalog: an ordered, immutable list of entries.
//!
//! Entries may belong to a named category (rendered as one block of the
//! table report) or to an uncategorised section that is run after the
//! categories; entries of a summarized section become plain summary records.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::{Error, Result};

/// One named test case plus its extra invocation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkEntry {
    pub name: String,
    pub label: Option<String>,
    pub args: Vec<String>,
    /// Input file stem when it differs from the identifier.
    pub input: Option<String>,
    pub category: Option<String>,
    /// Title of the uncategorised section this entry belongs to.
    pub section: Option<String>,
    /// Directory prefix of the input file, e.g. `abstract/`.
    pub prefix: Option<String>,
    /// Listed as a summary record after the table's category blocks.
    pub summarized: bool,
}

impl BenchmarkEntry {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            args: Vec::new(),
            input: None,
            category: None,
            section: None,
            prefix: None,
            summarized: false,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    #[must_use]
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn in_section(mut self, title: impl Into<String>) -> Self {
        self.section = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn summarized(mut self) -> Self {
        self.summarized = true;
        self
    }

    /// Input file argument: `<prefix><input or name>.<extension>`.
    #[must_use]
    pub fn input_path(&self, extension: &str) -> String {
        format!(
            "{}{}.{extension}",
            self.prefix.as_deref().unwrap_or(""),
            self.input.as_deref().unwrap_or(&self.name)
        )
    }

    /// Label used in the table report, falling back to the identifier.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// A category together with its entries, in declaration order.
#[derive(Debug)]
pub struct Category<'a> {
    pub name: &'a str,
    pub entries: Vec<&'a BenchmarkEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<BenchmarkEntry>,
    components: BTreeMap<String, String>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate identifiers.
    pub fn new(
        entries: Vec<BenchmarkEntry>,
        components: BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(Error::DuplicateBenchmark(entry.name.clone()));
            }
        }
        Ok(Self {
            entries,
            components,
        })
    }

    #[must_use]
    pub fn entries(&self) -> &[BenchmarkEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Categories in order of first appearance.
    #[must_use]
    pub fn categories(&self) -> Vec<Category<'_>> {
        let mut categories: Vec<Category<'_>> = Vec::new();
        for entry in &self.entries {
            let Some(name) = entry.category.as_deref() else {
                continue;
            };
            match categories.iter_mut().find(|c| c.name == name) {
                Some(category) => category.entries.push(entry),
                None => categories.push(Category {
                    name,
                    entries: vec![entry],
                }),
            }
        }
        categories
    }

    pub fn uncategorised(&self) -> impl Iterator<Item = &BenchmarkEntry> {
        self.entries.iter().filter(|e| e.category.is_none())
    }

    /// Static "components used" annotation, empty when unknown.
    #[must_use]
    pub fn components_used(&self, name: &str) -> &str {
        self.components.get(name).map_or("", String::as_str)
    }
}

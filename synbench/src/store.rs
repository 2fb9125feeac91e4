use std::collections::BTreeMap;

use serde::Serialize;

use crate::runner::RunOutcome;

/// Outcomes of the benchmarks that ran successfully, keyed by identifier.
///
/// Failed and never-run benchmarks are both absent.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ResultStore {
    outcomes: BTreeMap<String, RunOutcome>,
}

impl ResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome, returning the one it replaces.
    pub fn insert(&mut self, name: impl Into<String>, outcome: RunOutcome) -> Option<RunOutcome> {
        self.outcomes.insert(name.into(), outcome)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RunOutcome> {
        self.outcomes.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.outcomes.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Pretty JSON object mapping identifiers to outcomes.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

//! YAML suite files: harness settings plus the benchmark catalog.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{
    catalog::{BenchmarkEntry, Catalog},
    error::{Error, Result},
};

#[derive(Debug, Clone, Deserialize)]
pub struct SuiteConfig {
    #[serde(default = "default_tool")]
    pub tool: PathBuf,
    #[serde(default)]
    pub common_opts: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_input_extension")]
    pub input_extension: String,
    /// Parse the size annotations printed at the end of a successful run.
    #[serde(default = "default_extract_metrics")]
    pub extract_metrics: bool,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_csv_file")]
    pub csv_file: PathBuf,
    #[serde(default)]
    pub table_file: Option<PathBuf>,
    #[serde(default = "default_oracle")]
    pub oracle: PathBuf,
    #[serde(default)]
    pub summary_json: Option<PathBuf>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
    #[serde(default)]
    pub components: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub category: String,
    pub benchmarks: Vec<BenchmarkConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    /// Add a summary record per entry below the table.
    #[serde(default)]
    pub summarize: bool,
    pub benchmarks: Vec<BenchmarkConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkConfig {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Input file stem, defaulting to `name`.
    #[serde(default)]
    pub input: Option<String>,
}

fn default_tool() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("../src/Synquid.exe")
    } else {
        PathBuf::from("../dist/build/synquid/synquid")
    }
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_input_extension() -> String {
    "sq".to_string()
}

fn default_extract_metrics() -> bool {
    true
}

fn default_log_file() -> PathBuf {
    PathBuf::from("run_all.log")
}

fn default_csv_file() -> PathBuf {
    PathBuf::from("run_all.csv")
}

fn default_oracle() -> PathBuf {
    if cfg!(target_os = "linux") {
        PathBuf::from("oracle_nx")
    } else {
        PathBuf::from("oracle")
    }
}

impl SuiteConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents).map_err(|source| Error::Suite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Flatten groups then sections into a catalog, preserving declaration order.
    pub fn catalog(&self) -> Result<Catalog> {
        let grouped = self.groups.iter().flat_map(|group| {
            group
                .benchmarks
                .iter()
                .map(move |bench| bench.to_entry().in_category(&group.category))
        });
        let sectioned = self.sections.iter().flat_map(|section| {
            section.benchmarks.iter().map(move |bench| {
                let mut entry = bench.to_entry();
                entry.section.clone_from(&section.title);
                entry.prefix.clone_from(&section.prefix);
                entry.summarized = section.summarize;
                entry
            })
        });
        Catalog::new(grouped.chain(sectioned).collect(), self.components.clone())
    }
}

impl BenchmarkConfig {
    fn to_entry(&self) -> BenchmarkEntry {
        let mut entry = BenchmarkEntry::new(&self.name).with_args(self.args.iter().cloned());
        entry.label.clone_from(&self.label);
        entry.input.clone_from(&self.input);
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = r"
common_opts: ['--print-solution-size=True']
table_file: run_all.tex
groups:
  - category: Integer
    benchmarks:
      - { name: Int-Max2, label: maximum of 2 elements }
      - { name: Int-Add, label: addition }
  - category: List
    benchmarks:
      - { name: List-Append, label: append two lists, args: ['-m=1'] }
sections:
  - title: Abstract refinements
    prefix: abstract/
    summarize: true
    benchmarks:
      - { name: List-Fold, args: ['-e'] }
  - title: Red-Black-Trees
    prefix: abstract/
    benchmarks:
      - { name: RBT-Balance }
components:
  Int-Add: integer
";

    #[test]
    fn defaults_fill_missing_fields() {
        let config = SuiteConfig::from_yaml("groups: []").unwrap();
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.input_extension, "sq");
        assert!(config.extract_metrics);
        assert_eq!(config.log_file, PathBuf::from("run_all.log"));
        assert_eq!(config.csv_file, PathBuf::from("run_all.csv"));
        assert!(config.table_file.is_none());
        assert!(config.common_opts.is_empty());
    }

    #[test]
    fn catalog_flattens_groups_before_sections() {
        let config = SuiteConfig::from_yaml(SUITE).unwrap();
        let catalog = config.catalog().unwrap();
        let names: Vec<_> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["Int-Max2", "Int-Add", "List-Append", "List-Fold", "RBT-Balance"]
        );

        let append = &catalog.entries()[2];
        assert_eq!(append.category.as_deref(), Some("List"));
        assert_eq!(append.args, ["-m=1"]);
        assert_eq!(append.display_label(), "append two lists");

        let fold = &catalog.entries()[3];
        assert_eq!(fold.category, None);
        assert_eq!(fold.section.as_deref(), Some("Abstract refinements"));
        assert_eq!(fold.input_path(&config.input_extension), "abstract/List-Fold.sq");
        assert!(fold.summarized);
        assert!(!catalog.entries()[4].summarized);
        assert_eq!(catalog.components_used("Int-Add"), "integer");
    }

    #[test]
    fn duplicate_names_across_groups_fail() {
        let config = SuiteConfig::from_yaml(
            r"
groups:
  - category: A
    benchmarks: [{ name: X }]
sections:
  - benchmarks: [{ name: X }]
",
        )
        .unwrap();
        assert!(matches!(config.catalog(), Err(Error::DuplicateBenchmark(_))));
    }

    #[test]
    fn shipped_suites_parse() {
        for suite in ["synquid.yaml", "synquid-current.yaml"] {
            let path = Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("../suites")
                .join(suite);
            let config = SuiteConfig::load(&path).unwrap();
            assert!(!config.catalog().unwrap().is_empty(), "{suite} is empty");
        }
    }

    #[test]
    fn current_suite_points_at_its_own_build() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../suites/synquid-current.yaml");
        let config = SuiteConfig::load(&path).unwrap();
        assert_eq!(config.tool, PathBuf::from("../../dist/build/synquid/synquid"));
        assert!(!config.extract_metrics);
    }
}

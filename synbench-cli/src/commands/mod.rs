pub mod diff;
pub mod run;

pub use diff::{DiffArgs, DiffCommand};
pub use run::{RunArgs, RunCommand};

#[cfg(test)]
pub(crate) mod tests {
    use std::{fs, path::PathBuf};

    pub(crate) fn make_temp_dir(prefix: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let suffix: u64 = rand::random();
        path.push(format!("{prefix}-{suffix}"));
        fs::create_dir_all(&path).expect("create temp dir");
        path
    }
}

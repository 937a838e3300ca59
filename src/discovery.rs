// src/discovery.rs
//
// Test case discovery.
//
// Guarantees:
// - One case per regular `.c` file (or link to one), at any depth
// - A `.c` name that is not UTF-8 is skipped with a warning
// - No deduplication across directories
// - Deterministic order (directory, then base name)
//

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::logger::{LogLevel, Logger};

pub const SOURCE_EXTENSION: &str = "c";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TestCase {
    pub directory: PathBuf,
    pub base_name: String,
}

impl TestCase {
    pub fn source_file_name(&self) -> String {
        format!("{}.{}", self.base_name, SOURCE_EXTENSION)
    }

    pub fn source_path(&self) -> PathBuf {
        self.directory.join(self.source_file_name())
    }

    /// `<directory>/<base_name>.<suffix>`
    pub fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", self.base_name, suffix))
    }
}

/// Walks `root` and returns every `.c` fixture, sorted.
///
/// Entries the walk cannot read are skipped with a warning. When `filter` is
/// set, only cases whose source path relative to `root` matches are kept.
pub fn discover(root: &Path, filter: Option<&Pattern>, logger: &mut Logger) -> Vec<TestCase> {
    let mut cases = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                logger.log(LogLevel::Warn, format!("skipping unreadable entry: {e}"));
                continue;
            }
        };

        // file links count as fixtures; directory links stay unfollowed
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file || !has_source_extension(entry.path()) {
            continue;
        }

        let Some(case) = case_from_path(entry.path()) else {
            logger.log(
                LogLevel::Warn,
                format!(
                    "skipping {}: file name is not valid UTF-8",
                    entry.path().display()
                ),
            );
            continue;
        };

        if let Some(pattern) = filter {
            if !matches_filter(root, &case, pattern) {
                continue;
            }
        }

        cases.push(case);
    }

    cases.sort();
    cases
}

fn has_source_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)
}

fn case_from_path(path: &Path) -> Option<TestCase> {
    let base_name = path.file_stem()?.to_str()?.to_string();
    let directory = path.parent()?.to_path_buf();

    Some(TestCase {
        directory,
        base_name,
    })
}

fn matches_filter(root: &Path, case: &TestCase, pattern: &Pattern) -> bool {
    let source = case.source_path();
    let relative = source.strip_prefix(root).unwrap_or(source.as_path());

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    pattern.matches_path_with(relative, options)
}

// src/snapshot.rs
//
// Received/approved snapshot files and the comparator seam.
//
// The received file always has exactly two lines:
//
//     Return code of main:
//     <code>
//

use std::fmt::Display;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use similar::{ChangeTag, TextDiff};

use crate::discovery::TestCase;
use crate::state::Verdict;

pub const RECORD_HEADER: &str = "Return code of main:";
pub const DEFAULT_RECEIVED_SUFFIX: &str = "received.txt";
pub const DEFAULT_APPROVED_SUFFIX: &str = "approaved.txt";

pub fn render_received(exit_code: i32) -> String {
    format!("{RECORD_HEADER}\n{exit_code}\n")
}

fn record_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\AReturn code of main:\r?\n(-?[0-9]+)\r?\n?\z").unwrap())
}

/// Exit code stored in a record, if the text is a well-formed record.
pub fn parse_received(text: &str) -> Option<i32> {
    record_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/* ---------- comparators ---------- */

/// Turns received and approved content into a verdict.
pub trait VerdictComparator {
    /// Whether the approved file should be read at all.
    fn reads_baseline(&self) -> bool {
        true
    }

    fn compare(&self, received: &str, approved: Option<&str>) -> Verdict;
}

/// Records only. The approved file is never opened.
pub struct NoVerdict;

impl VerdictComparator for NoVerdict {
    fn reads_baseline(&self) -> bool {
        false
    }

    fn compare(&self, _received: &str, _approved: Option<&str>) -> Verdict {
        Verdict::Unchecked
    }
}

/// Byte-for-byte equality with the approved file.
pub struct ExactMatch;

impl VerdictComparator for ExactMatch {
    fn compare(&self, received: &str, approved: Option<&str>) -> Verdict {
        match approved {
            None => Verdict::MissingBaseline,
            Some(approved) if approved == received => Verdict::Match,
            Some(approved) => Verdict::Mismatch {
                diff: line_diff(approved, received),
            },
        }
    }
}

struct LineNo(Option<usize>);

impl Display for LineNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            None => write!(f, "    "),
            Some(idx) => write!(f, "{:<4}", idx + 1),
        }
    }
}

/// Line diff from `expected` to `actual`, one gutter column per side.
pub fn line_diff(expected: &str, actual: &str) -> String {
    let diff = TextDiff::from_lines(expected, actual);
    let mut out = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };

        out.push_str(&format!(
            "{} {} |{}{}",
            LineNo(change.old_index()),
            LineNo(change.new_index()),
            sign,
            change.value()
        ));
        if change.missing_newline() {
            out.push('\n');
        }
    }

    out
}

/* ---------- files ---------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotStore {
    pub received_suffix: String,
    pub approved_suffix: String,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self {
            received_suffix: DEFAULT_RECEIVED_SUFFIX.to_string(),
            approved_suffix: DEFAULT_APPROVED_SUFFIX.to_string(),
        }
    }
}

impl SnapshotStore {
    pub fn received_path(&self, case: &TestCase) -> PathBuf {
        case.artifact_path(&self.received_suffix)
    }

    pub fn approved_path(&self, case: &TestCase) -> PathBuf {
        case.artifact_path(&self.approved_suffix)
    }

    /// Overwrites the received file and returns what was written.
    pub fn write_received(&self, case: &TestCase, exit_code: i32) -> Result<String, String> {
        let path = self.received_path(case);
        let content = render_received(exit_code);
        fs::write(&path, &content)
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
        Ok(content)
    }

    /// `Ok(None)` when there is no approved file yet.
    pub fn read_approved(&self, case: &TestCase) -> Result<Option<String>, String> {
        let path = self.approved_path(case);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(format!("failed to read {}: {}", path.display(), e)),
        }
    }

    pub fn approve(&self, case: &TestCase, received: &str) -> Result<PathBuf, String> {
        let path = self.approved_path(case);
        fs::write(&path, received)
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
        Ok(path)
    }

    /// Runs `comparator` against the approved file, reading it only when asked to.
    /// Returns the verdict together with the approved content that was read.
    pub fn judge(
        &self,
        case: &TestCase,
        received: &str,
        comparator: &dyn VerdictComparator,
    ) -> Result<(Verdict, Option<String>), String> {
        if !comparator.reads_baseline() {
            return Ok((comparator.compare(received, None), None));
        }

        let approved = self.read_approved(case)?;
        let verdict = comparator.compare(received, approved.as_deref());
        Ok((verdict, approved))
    }
}

// Machine-readable run report (`--report`).

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::state::{CaseOutcome, CaseRecord, RunSummary};

#[derive(Debug, Serialize)]
pub struct CaseReport {
    pub source: String,
    pub outcome: &'static str,
    pub exit_code: Option<i32>,
    pub compiler_code: Option<i32>,
    pub verdict: Option<&'static str>,
    pub expected_code: Option<i32>,
    pub approved: bool,
    pub failed: bool,
    pub duration_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub generated_at: String,
    pub root: String,
    pub compare: bool,
    pub elapsed_ms: u128,
    pub summary: RunSummary,
    pub cases: Vec<CaseReport>,
    pub problems: Vec<String>,
}

impl CaseReport {
    fn from_record(record: &CaseRecord) -> Self {
        let (outcome, exit_code, compiler_code, verdict) = match &record.outcome {
            CaseOutcome::CompileFailed { compiler_code } => {
                ("compile_failed", None, Some(*compiler_code), None)
            }
            CaseOutcome::Recorded { exit_code, verdict } => {
                ("recorded", Some(*exit_code), Some(0), Some(verdict.label()))
            }
        };

        Self {
            source: record.case.source_path().display().to_string(),
            outcome,
            exit_code,
            compiler_code,
            verdict,
            expected_code: record.expected_code,
            approved: record.approved,
            failed: record.failed(),
            duration_ms: record.duration.as_millis(),
        }
    }
}

impl RunReport {
    pub fn new(
        root: &Path,
        compare: bool,
        records: &[CaseRecord],
        summary: &RunSummary,
        elapsed: Duration,
        problems: Vec<String>,
    ) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            root: root.display().to_string(),
            compare,
            elapsed_ms: elapsed.as_millis(),
            summary: summary.clone(),
            cases: records.iter().map(CaseReport::from_record).collect(),
            problems,
        }
    }
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }
    }

    let text = serde_json::to_string_pretty(report).map_err(|e| e.to_string())?;
    fs::write(path, text).map_err(|e| format!("failed to write {}: {}", path.display(), e))
}

use std::process::ExitCode;
use std::time::Duration;

use serde::Serialize;

use crate::discovery::TestCase;

/* ---------- verdicts ---------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// No comparison was attempted.
    Unchecked,
    Match,
    Mismatch { diff: String },
    MissingBaseline,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Unchecked => "unchecked",
            Verdict::Match => "match",
            Verdict::Mismatch { .. } => "mismatch",
            Verdict::MissingBaseline => "missing_baseline",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Mismatch { .. } | Verdict::MissingBaseline)
    }
}

/* ---------- per-case outcome ---------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaseOutcome {
    CompileFailed { compiler_code: i32 },
    Recorded { exit_code: i32, verdict: Verdict },
}

#[derive(Clone, Debug)]
pub struct CaseRecord {
    pub case: TestCase,
    pub outcome: CaseOutcome,
    /// Code stored in the approved file, when one was read.
    pub expected_code: Option<i32>,
    pub approved: bool,
    pub duration: Duration,
}

impl CaseRecord {
    pub fn failed(&self) -> bool {
        match &self.outcome {
            CaseOutcome::CompileFailed { .. } => true,
            CaseOutcome::Recorded { verdict, .. } => !self.approved && verdict.is_failure(),
        }
    }
}

/* ---------- run summary ---------- */

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub compiled: usize,
    pub compile_failed: usize,
    pub ran: usize,
    pub passed: usize,
    pub failed: usize,
    pub unchecked: usize,
    pub approved: usize,
}

impl RunSummary {
    pub fn record(&mut self, record: &CaseRecord) {
        match &record.outcome {
            CaseOutcome::CompileFailed { .. } => {
                self.compile_failed += 1;
            }
            CaseOutcome::Recorded { verdict, .. } => {
                self.compiled += 1;
                self.ran += 1;

                if record.approved {
                    self.approved += 1;
                    return;
                }

                match verdict {
                    Verdict::Unchecked => self.unchecked += 1,
                    Verdict::Match => self.passed += 1,
                    Verdict::Mismatch { .. } | Verdict::MissingBaseline => self.failed += 1,
                }
            }
        }
    }

    pub fn all_ok(&self) -> bool {
        self.compile_failed == 0 && self.failed == 0
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.all_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }

    pub fn line(&self, elapsed: Duration) -> String {
        format!(
            "{} cases: {} compiled, {} failed to compile, {} ran, {} passed, {} failed, {} unchecked ({:.2}s)",
            self.total,
            self.compiled,
            self.compile_failed,
            self.ran,
            self.passed,
            self.failed,
            self.unchecked,
            elapsed.as_secs_f64()
        )
    }
}

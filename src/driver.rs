use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;

use crate::config::HarnessConfig;
use crate::discovery::{discover, TestCase};
use crate::executor::{compile_and_run, RunResult};
use crate::logger::{LogLevel, Logger};
use crate::report::{write_report, RunReport};
use crate::snapshot::{parse_received, ExactMatch, NoVerdict, VerdictComparator};
use crate::state::{CaseOutcome, CaseRecord, RunSummary, Verdict};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, default_value = ".", help = "Directory tree to scan for .c fixtures")]
    pub root: PathBuf,

    #[arg(long, help = "Compiler executable (default: mcc inside each case directory)")]
    pub mcc: Option<PathBuf>,

    #[arg(long, help = "Only run cases whose path relative to --root matches this glob")]
    pub filter: Option<String>,

    #[arg(
        long,
        default_value_t = false,
        help = "Compare received output against approved baselines"
    )]
    pub compare: bool,

    #[arg(
        long,
        default_value_t = false,
        help = "Accept received output as the new baseline on mismatch (implies --compare)"
    )]
    pub approve: bool,

    #[arg(long, help = "Write a JSON run report to this file")]
    pub report: Option<PathBuf>,

    #[arg(
        short,
        long,
        default_value_t = false,
        help = "Only print failures and the summary"
    )]
    pub quiet: bool,

    #[arg(long, help = "Configuration file (default: <root>/mccsnap.toml)")]
    pub config: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<RunSummary, Box<dyn Error>> {
    let config = HarnessConfig::resolve(args)?;
    let mut logger = Logger::new(config.quiet);
    run_suite(&config, &mut logger)
}

/// Discovery, then every case in order, then the summary.
pub fn run_suite(config: &HarnessConfig, logger: &mut Logger) -> Result<RunSummary, Box<dyn Error>> {
    let started = Instant::now();

    if let Some(path) = &config.config_file {
        logger.log(LogLevel::Info, format!("Using config {}", path.display()));
    }

    let comparator: Box<dyn VerdictComparator> = if config.compare {
        Box::new(ExactMatch)
    } else {
        Box::new(NoVerdict)
    };

    let cases = discover(&config.root, config.filter.as_ref(), logger);
    let total = cases.len();
    logger.log(LogLevel::Info, format!("Total {} test cases", total));

    let mut summary = RunSummary {
        total,
        ..RunSummary::default()
    };
    let mut records = Vec::with_capacity(total);

    for (i, case) in cases.iter().enumerate() {
        logger.log(
            LogLevel::Info,
            format!("[{}/{}] Testing {}", i + 1, total, case.source_path().display()),
        );

        let record = execute_case(case, config, comparator.as_ref(), logger)?;
        report_verdict(&record, config, logger);

        summary.record(&record);
        records.push(record);
    }

    let elapsed = started.elapsed();
    let level = if summary.all_ok() {
        LogLevel::Success
    } else {
        LogLevel::Error
    };
    logger.announce(level, summary.line(elapsed));

    if let Some(path) = &config.report {
        let report = RunReport::new(
            &config.root,
            config.compare,
            &records,
            &summary,
            elapsed,
            logger.problems(),
        );
        write_report(path, &report)?;
        logger.log(LogLevel::Info, format!("Report written to {}", path.display()));
    }

    Ok(summary)
}

/// Compile, run, record, and judge one case.
///
/// A compile failure is an outcome. Anything the filesystem refuses is an
/// error and ends the run.
fn execute_case(
    case: &TestCase,
    config: &HarnessConfig,
    comparator: &dyn VerdictComparator,
    logger: &mut Logger,
) -> Result<CaseRecord, String> {
    let started = Instant::now();
    let store = &config.store;

    let mut expected_code = None;
    let mut approved = false;

    let outcome = match compile_and_run(case, &config.toolchain)? {
        RunResult::CompileFailed { compiler_code } => {
            logger.log(
                LogLevel::Error,
                format!("Failed to compile {}", case.source_path().display()),
            );
            CaseOutcome::CompileFailed { compiler_code }
        }
        RunResult::Ran { exit_code } => {
            let received = store.write_received(case, exit_code)?;
            let (verdict, baseline) = store.judge(case, &received, comparator)?;
            expected_code = baseline.as_deref().and_then(parse_received);

            if config.approve && verdict.is_failure() {
                store.approve(case, &received)?;
                approved = true;
            }

            CaseOutcome::Recorded { exit_code, verdict }
        }
    };

    Ok(CaseRecord {
        case: case.clone(),
        outcome,
        expected_code,
        approved,
        duration: started.elapsed(),
    })
}

fn report_verdict(record: &CaseRecord, config: &HarnessConfig, logger: &mut Logger) {
    // without a comparator every case "passes"
    if !config.compare {
        logger.log(LogLevel::Success, "Pass!");
        return;
    }

    let source = record.case.source_path();

    match &record.outcome {
        CaseOutcome::CompileFailed { .. } => {
            logger.log(LogLevel::Error, "Fail!");
        }
        CaseOutcome::Recorded { .. } if record.approved => {
            let path = config.store.approved_path(&record.case);
            logger.log(LogLevel::Success, format!("Approved {}", path.display()));
        }
        CaseOutcome::Recorded { verdict, exit_code } => match verdict {
            Verdict::Match | Verdict::Unchecked => logger.log(LogLevel::Success, "Pass!"),
            Verdict::MissingBaseline => {
                let path = config.store.approved_path(&record.case);
                logger.log(
                    LogLevel::Error,
                    format!(
                        "Missing approved baseline: {} (for {})",
                        path.display(),
                        source.display()
                    ),
                );
            }
            Verdict::Mismatch { diff } => {
                let mut msg = format!("Mismatch! {}", source.display());
                if let Some(expected) = record.expected_code {
                    msg.push_str(&format!(
                        "\nExpected return code: {} Actual return code: {}",
                        expected, exit_code
                    ));
                }
                msg.push('\n');
                msg.push_str(diff.trim_end_matches('\n'));
                logger.log(LogLevel::Error, msg);
            }
        },
    }
}

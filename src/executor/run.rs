//src/executor/run.rs
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Runs `program` with `args` inside `working_dir` and waits for it.
///
/// Stdio is inherited. The harness never changes its own working directory;
/// the child gets it as a spawn parameter.
pub fn run_in(program: &Path, args: &[&str], working_dir: &Path) -> Result<i32, String> {
    let status = Command::new(program)
        .args(args)
        .current_dir(working_dir)
        .status()
        .map_err(|e| format!("failed to run {}: {}", program.display(), e))?;

    Ok(raw_exit_code(status))
}

/// Exit code as the platform reports it. A signal-terminated child on Unix
/// yields the negated signal number.
pub fn raw_exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    -1
}

// Compile-then-run for one test case. No recording, no comparison.

pub mod run;

use std::fs;
use std::path::{Path, PathBuf};

use crate::discovery::TestCase;

pub use run::run_in;

pub const DEFAULT_COMPILER: &str = "mcc";
pub const DEFAULT_EXECUTABLE: &str = "file";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toolchain {
    /// Absolute compiler path. `None` means `mcc` inside each case directory.
    pub compiler: Option<PathBuf>,
    /// Name of the program the compiler leaves in the case directory.
    pub executable: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: None,
            executable: DEFAULT_EXECUTABLE.to_string(),
        }
    }
}

impl Toolchain {
    fn compiler_in(&self, workdir: &Path) -> PathBuf {
        match &self.compiler {
            Some(path) => path.clone(),
            None => workdir.join(DEFAULT_COMPILER),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunResult {
    CompileFailed { compiler_code: i32 },
    Ran { exit_code: i32 },
}

/// Compiles `case` and, when that succeeds, runs the produced program.
///
/// A non-zero compiler exit is a normal result. Failing to spawn either
/// process is an error.
pub fn compile_and_run(case: &TestCase, toolchain: &Toolchain) -> Result<RunResult, String> {
    let workdir = fs::canonicalize(&case.directory)
        .map_err(|e| format!("cannot resolve {}: {}", case.directory.display(), e))?;

    let compiler = toolchain.compiler_in(&workdir);
    let source = case.source_file_name();

    let compiler_code = run_in(&compiler, &[source.as_str()], &workdir)?;
    if compiler_code != 0 {
        return Ok(RunResult::CompileFailed { compiler_code });
    }

    let program = workdir.join(&toolchain.executable);
    let exit_code = run_in(&program, &[], &workdir)?;

    Ok(RunResult::Ran { exit_code })
}

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::Deserialize;

use crate::driver::RunArgs;
use crate::executor::{Toolchain, DEFAULT_EXECUTABLE};
use crate::snapshot::{SnapshotStore, DEFAULT_APPROVED_SUFFIX, DEFAULT_RECEIVED_SUFFIX};

pub const CONFIG_FILE_NAME: &str = "mccsnap.toml";

/// `mccsnap.toml`. Every key is optional; CLI flags win.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    compiler: Option<PathBuf>,
    executable: Option<String>,
    received_suffix: Option<String>,
    approved_suffix: Option<String>,
    filter: Option<String>,
    compare: Option<bool>,
    quiet: Option<bool>,
    report: Option<PathBuf>,
}

/// Fully resolved settings for one run.
#[derive(Debug)]
pub struct HarnessConfig {
    pub root: PathBuf,
    pub toolchain: Toolchain,
    pub store: SnapshotStore,
    pub filter: Option<Pattern>,
    pub compare: bool,
    pub approve: bool,
    pub quiet: bool,
    pub report: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

fn user_config_path() -> Option<PathBuf> {
    let mut dir = dirs::config_dir()?;
    dir.push("mccsnap");
    dir.push("config.toml");
    Some(dir)
}

fn locate_config(args: &RunArgs) -> Option<PathBuf> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }

    let local = args.root.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    user_config_path().filter(|p| p.is_file())
}

fn load_file(path: &Path) -> Result<FileConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&raw).map_err(|e| format!("invalid config {}: {}", path.display(), e))
}

/// Relative paths in a config file are relative to that file.
fn relative_to(file: &Path, value: PathBuf) -> PathBuf {
    if value.is_absolute() {
        return value;
    }
    match file.parent() {
        Some(dir) => dir.join(value),
        None => value,
    }
}

fn validate_suffix(name: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{name} must not be empty"));
    }
    if value == "c" || value.ends_with(".c") {
        return Err(format!("{name} `{value}` would be picked up as a test source"));
    }
    Ok(())
}

impl HarnessConfig {
    pub fn resolve(args: &RunArgs) -> Result<Self, String> {
        let config_file = locate_config(args);
        let file = match &config_file {
            Some(path) => load_file(path)?,
            None => FileConfig::default(),
        };

        if !args.root.is_dir() {
            return Err(format!("{} is not a directory", args.root.display()));
        }

        let compiler = match (&args.mcc, file.compiler, &config_file) {
            (Some(cli), _, _) => Some(cli.clone()),
            (None, Some(path), Some(origin)) => Some(relative_to(origin, path)),
            (None, Some(path), None) => Some(path),
            (None, None, _) => None,
        };
        let compiler = match compiler {
            Some(path) => Some(
                fs::canonicalize(&path)
                    .map_err(|e| format!("cannot resolve compiler {}: {}", path.display(), e))?,
            ),
            None => None,
        };

        let executable = file
            .executable
            .unwrap_or_else(|| DEFAULT_EXECUTABLE.to_string());
        if executable.is_empty() || executable.contains(|c: char| c == '/' || c == '\\') {
            return Err(format!("executable must be a bare file name, got `{executable}`"));
        }

        let store = SnapshotStore {
            received_suffix: file
                .received_suffix
                .unwrap_or_else(|| DEFAULT_RECEIVED_SUFFIX.to_string()),
            approved_suffix: file
                .approved_suffix
                .unwrap_or_else(|| DEFAULT_APPROVED_SUFFIX.to_string()),
        };
        validate_suffix("received_suffix", &store.received_suffix)?;
        validate_suffix("approved_suffix", &store.approved_suffix)?;
        if store.received_suffix == store.approved_suffix {
            return Err("received_suffix and approved_suffix must differ".to_string());
        }

        let filter = match args.filter.clone().or(file.filter) {
            Some(raw) => Some(
                Pattern::new(&raw).map_err(|e| format!("invalid filter `{raw}`: {e}"))?,
            ),
            None => None,
        };

        let report = match (&args.report, file.report, &config_file) {
            (Some(cli), _, _) => Some(cli.clone()),
            (None, Some(path), Some(origin)) => Some(relative_to(origin, path)),
            (None, other, _) => other,
        };

        let approve = args.approve;
        let compare = approve || args.compare || file.compare.unwrap_or(false);
        let quiet = args.quiet || file.quiet.unwrap_or(false);

        Ok(Self {
            root: args.root.clone(),
            toolchain: Toolchain {
                compiler,
                executable,
            },
            store,
            filter,
            compare,
            approve,
            quiet,
            report,
            config_file,
        })
    }
}

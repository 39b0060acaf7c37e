//! CLI handler for the pre-commit run.
//!
//! Loads the configuration, checks the analyzer binaries, runs the hook
//! pipeline and turns the outcome into status lines and an exit code.

use std::path::Path;

use phpgate_core::git::Repository;
use phpgate_core::inspect::ProcessRunner;
use phpgate_core::preflight::check_tools;
use phpgate_core::{run_pre_commit, Config};
use tracing::debug;

use crate::output::Reporter;

/// Exit code for configuration, preflight and internal failures.
pub const FAILURE: i32 = 1;

/// Runs the hook and returns the process exit code.
///
/// The scratch directory is gone by the time this returns.
pub fn run_pre_commit_hook(config_override: Option<&Path>, reporter: &mut Reporter) -> i32 {
    let config_path = match config_override {
        Some(p) => Some(p.to_path_buf()),
        None => Config::sibling_path(),
    };

    let config = match Config::load(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            reporter.error(&format!("Failed to load config: {e}"));
            return FAILURE;
        }
    };

    if let Err(e) = check_tools(&config) {
        reporter.error(&e.to_string());
        return FAILURE;
    }

    let cwd = match std::env::current_dir() {
        Ok(c) => c,
        Err(e) => {
            reporter.error(&format!("Cannot get current directory: {e}"));
            return FAILURE;
        }
    };

    let repo = match Repository::discover(&cwd) {
        Ok(r) => r,
        Err(e) => {
            reporter.error(&format!("{e}"));
            return FAILURE;
        }
    };

    match run_pre_commit(&repo, &config, &ProcessRunner) {
        Ok(outcome) => {
            reporter.report_stages(outcome.stages());
            let code = outcome.exit_code();
            debug!(code, "pre-commit finished");
            code
        }
        Err(e) => {
            reporter.error(&format!("Pre-commit check failed: {e}"));
            FAILURE
        }
    }
}

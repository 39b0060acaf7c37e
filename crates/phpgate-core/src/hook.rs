//! The pre-commit pipeline: select, snapshot, inspect, clean up.

use tracing::debug;

use crate::config::Config;
use crate::error::GateError;
use crate::git::Repository;
use crate::inspect::{run_inspection, StageReport, StageStatus, ToolRunner};
use crate::snapshot::Snapshot;
use crate::staged::staged_files;

/// How a pre-commit run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// No staged file matched; nothing was snapshotted or run.
    NothingToInspect,
    /// Every analyzer passed or was disabled.
    Passed { stages: Vec<StageReport> },
    /// An analyzer reported issues. The last stage holds its output.
    Rejected { stages: Vec<StageReport>, code: i32 },
}

impl HookOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            HookOutcome::NothingToInspect | HookOutcome::Passed { .. } => 0,
            HookOutcome::Rejected { code, .. } => *code,
        }
    }

    /// Stage reports in run order (empty when nothing was inspected).
    pub fn stages(&self) -> &[StageReport] {
        match self {
            HookOutcome::NothingToInspect => &[],
            HookOutcome::Passed { stages } | HookOutcome::Rejected { stages, .. } => {
                stages.as_slice()
            }
        }
    }
}

/// Runs the pre-commit checks for `repo`.
///
/// The scratch directory only exists while the analyzers run. It is removed
/// before this function returns, whatever the outcome.
///
/// # Errors
///
/// Returns an error if git cannot be queried, the snapshot cannot be
/// written, or an analyzer cannot be started. Analyzer findings are not
/// errors; they come back as [`HookOutcome::Rejected`].
pub fn run_pre_commit(
    repo: &Repository,
    config: &Config,
    runner: &dyn ToolRunner,
) -> Result<HookOutcome, GateError> {
    let selected = staged_files(repo, config)?;
    if selected.is_empty() {
        debug!("no staged files match FILE_PATTERN");
        return Ok(HookOutcome::NothingToInspect);
    }

    // An absolute TMP_STAGING replaces the repository root here.
    let staging = repo.root().join(&config.staging_dir);
    let snapshot = Snapshot::build(&staging, &selected, repo)?;
    debug!(root = %snapshot.root().display(), files = snapshot.files().len(), "snapshot ready");
    let stages = run_inspection(config, snapshot.files(), runner)?;

    let failed = stages.iter().find_map(|report| match &report.status {
        StageStatus::Failed(result) => Some(result.code),
        _ => None,
    });

    Ok(match failed {
        Some(code) => HookOutcome::Rejected { stages, code },
        None => HookOutcome::Passed { stages },
    })
}

//! Selection of the staged files that get inspected.

use tracing::debug;

use crate::config::Config;
use crate::error::GateError;
use crate::git::{Repository, StagedEntry};

/// Filters staged entries down to the ones the analyzers should see.
///
/// Entries matching `EXCLUDE_PATTERN` are dropped first, then only entries
/// matching `FILE_PATTERN` are kept. Both patterns are searched anywhere in
/// the `/`-separated relative path, not anchored to it.
pub fn select(entries: Vec<StagedEntry>, config: &Config) -> Vec<StagedEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            let path = entry.path.to_string_lossy();
            if let Some(exclude) = &config.exclude_pattern {
                if exclude.is_match(&path) {
                    debug!(path = %path, "excluded by EXCLUDE_PATTERN");
                    return false;
                }
            }
            config.file_pattern.is_match(&path)
        })
        .collect()
}

/// Staged files in `repo` that are eligible for inspection.
///
/// Diffs the index against `HEAD` (or the empty tree before the first
/// commit) and applies [`select`].
///
/// # Errors
///
/// Returns [`GateError::Git`] or [`GateError::Spawn`] if git cannot be queried.
pub fn staged_files(repo: &Repository, config: &Config) -> Result<Vec<StagedEntry>, GateError> {
    let base = repo.diff_base()?;
    let entries = repo.staged_entries(&base)?;
    let candidates = entries.len();
    let selected = select(entries, config);
    debug!(candidates, selected = selected.len(), "selected staged files");
    Ok(selected)
}

//! Checks that must pass before any repository work starts.

use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::error::GateError;

/// Verifies that both analyzer binaries exist and are executable.
///
/// Both paths are checked regardless of which analyzers are active.
///
/// # Errors
///
/// Returns [`GateError::ToolsMissing`] naming both configured paths if
/// either binary is unusable.
pub fn check_tools(config: &Config) -> Result<(), GateError> {
    let phpcs_ok = is_executable(&config.phpcs.bin);
    let phpmd_ok = is_executable(&config.phpmd.bin);
    debug!(
        phpcs = %config.phpcs.bin.display(),
        phpcs_ok,
        phpmd = %config.phpmd.bin.display(),
        phpmd_ok,
        "preflight"
    );

    if phpcs_ok && phpmd_ok {
        Ok(())
    } else {
        Err(GateError::ToolsMissing {
            phpcs: config.phpcs.bin.clone(),
            phpmd: config.phpmd.bin.clone(),
        })
    }
}

/// Returns `true` if `path` is a regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    meta.is_file() && has_exec_bit(&meta)
}

#[cfg(unix)]
fn has_exec_bit(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_exec_bit(_meta: &std::fs::Metadata) -> bool {
    true
}

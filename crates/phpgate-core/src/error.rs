use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("`git {command}` failed: {message}")]
    Git { command: String, message: String },

    #[error(
        "Analyzer binaries not found or not executable. \
         Check PHPCS_BIN={phpcs_bin} and PHPMD_BIN={phpmd_bin}",
        phpcs_bin = .phpcs.display(),
        phpmd_bin = .phpmd.display()
    )]
    ToolsMissing { phpcs: PathBuf, phpmd: PathBuf },

    #[error("Refusing to use {dir} as the scratch directory: {reason}", dir = .path.display())]
    UnsafeStaging { path: PathBuf, reason: &'static str },

    #[error("Failed to run {bin}: {source}", bin = .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

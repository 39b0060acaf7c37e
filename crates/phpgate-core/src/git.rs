//! Thin wrapper over the `git` plumbing commands the hook needs.
//!
//! Everything runs as a `git` subprocess inside the repository top level,
//! reading the index (never the working tree) so that inspection sees
//! exactly what is about to be committed.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::error::GateError;

/// A staged path together with the blob id recorded for it in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    /// Path relative to the repository top level.
    pub path: PathBuf,
    /// Object id of the staged content.
    pub blob: String,
    /// Diff status letter (`A`, `C`, `M` or `R`).
    pub status: char,
}

/// A git working copy, addressed by its top-level directory.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
}

impl Repository {
    /// Finds the repository containing `start`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Git`] if `start` is not inside a git working tree.
    pub fn discover(start: &Path) -> Result<Self, GateError> {
        let stdout = run_git(start, &["rev-parse", "--show-toplevel"])?;
        let root = String::from_utf8_lossy(&stdout).trim_end().to_string();
        debug!(root = %root, "discovered repository");
        Ok(Self {
            root: PathBuf::from(root),
        })
    }

    /// Top-level directory of the working tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `HEAD` when the repository has a commit, otherwise the
    /// [empty tree](Repository::empty_tree).
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Spawn`] if `git` cannot be started, or
    /// [`GateError::Git`] if the empty tree id cannot be computed.
    pub fn diff_base(&self) -> Result<String, GateError> {
        let output = git_command(&self.root, &["rev-parse", "--verify", "--quiet", "HEAD"])?;
        let base = if output.status.success() {
            "HEAD".to_string()
        } else {
            self.empty_tree()?
        };
        debug!(base = %base, "chose diff base");
        Ok(base)
    }

    /// Object id of the empty tree in this repository's hash format.
    ///
    /// Computed by hashing empty input rather than hardcoded, so SHA-1 and
    /// SHA-256 repositories both work.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Git`] if `git hash-object` fails.
    pub fn empty_tree(&self) -> Result<String, GateError> {
        let stdout = run_git(&self.root, &["hash-object", "-t", "tree", "--stdin"])?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Lists staged paths that were added, copied, modified or renamed
    /// relative to `base`.
    ///
    /// Deleted and type-changed paths are never returned. For copies and
    /// renames the destination path is reported.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Git`] if the diff fails or its output cannot be
    /// parsed.
    pub fn staged_entries(&self, base: &str) -> Result<Vec<StagedEntry>, GateError> {
        let stdout = run_git(
            &self.root,
            &["diff-index", "--cached", "-M", "--diff-filter=ACMR", "-z", base],
        )?;
        parse_raw_diff(&stdout)
    }

    /// Reads the raw bytes of a blob from the object store.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Git`] if the object does not exist or is not a blob.
    pub fn read_blob(&self, id: &str) -> Result<Vec<u8>, GateError> {
        run_git(&self.root, &["cat-file", "blob", id])
    }
}

fn git_command(dir: &Path, args: &[&str]) -> Result<Output, GateError> {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| GateError::Spawn {
            program: PathBuf::from("git"),
            source,
        })
}

fn run_git(dir: &Path, args: &[&str]) -> Result<Vec<u8>, GateError> {
    let output = git_command(dir, args)?;
    if !output.status.success() {
        return Err(GateError::Git {
            command: args.join(" "),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Parses `git diff-index -z` raw output.
///
/// Records look like `:<mode> <mode> <src-id> <dst-id> <status>\0<path>\0`,
/// with a second path for copies and renames.
fn parse_raw_diff(raw: &[u8]) -> Result<Vec<StagedEntry>, GateError> {
    let mut fields = raw.split(|b| *b == 0).filter(|f| !f.is_empty());
    let mut entries = Vec::new();

    while let Some(header) = fields.next() {
        let header = String::from_utf8_lossy(header).into_owned();
        let parts: Vec<&str> = header.trim_start_matches(':').split_whitespace().collect();
        if parts.len() != 5 {
            return Err(malformed(&header));
        }

        let blob = parts[3].to_string();
        let status = parts[4]
            .chars()
            .next()
            .ok_or_else(|| malformed(&header))?;

        let mut path = fields.next().ok_or_else(|| malformed("missing path"))?;
        if matches!(status, 'R' | 'C') {
            path = fields
                .next()
                .ok_or_else(|| malformed("missing destination path"))?;
        }

        if !matches!(status, 'A' | 'C' | 'M' | 'R') {
            continue;
        }

        entries.push(StagedEntry {
            path: path_from_bytes(path),
            blob,
            status,
        });
    }

    Ok(entries)
}

fn malformed(what: &str) -> GateError {
    GateError::Git {
        command: "diff-index".into(),
        message: format!("unexpected output: {what}"),
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

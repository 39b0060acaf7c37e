//! RAII-owned scratch copy of the staged files.
//!
//! [`Snapshot::build`] writes the index version of every selected file into
//! a scratch directory, keeping relative paths. The analyzers run against
//! those copies, so unstaged working-tree edits are never inspected.
//!
//! The scratch directory lives exactly as long as the [`Snapshot`]. Dropping
//! it (normal return, early return or `?` propagation) removes the
//! directory. A directory left behind by a killed run is wiped before the
//! next build. Only directories carrying the [`SCRATCH_MARKER`] file count
//! as leftovers; any other existing path is refused rather than deleted.
//!
//! ```no_run
//! use phpgate_core::git::Repository;
//! use phpgate_core::snapshot::Snapshot;
//! use std::path::Path;
//!
//! fn inspect(repo: &Repository) -> Result<(), phpgate_core::GateError> {
//!     let base = repo.diff_base()?;
//!     let entries = repo.staged_entries(&base)?;
//!     let snapshot = Snapshot::build(Path::new("/tmp/stage"), &entries, repo)?;
//!     // ... run tools against snapshot.files() ...
//!     Ok(())
//! } // scratch directory removed here
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::GateError;
use crate::git::{Repository, StagedEntry};

/// File written into every scratch directory this crate creates.
pub const SCRATCH_MARKER: &str = ".phpgate-scratch";

/// Scratch directory holding staged file contents. Removed on drop.
#[derive(Debug)]
pub struct Snapshot {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl Snapshot {
    /// Creates a fresh scratch directory at `root` and fills it with the
    /// staged content of each entry.
    ///
    /// A directory left at `root` by an earlier run is deleted first.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnsafeStaging`] if `root` contains the repository
    /// or already exists without the [`SCRATCH_MARKER`]. Nothing is deleted
    /// in that case. Returns [`GateError::Io`] if the directory or a file
    /// cannot be written, or [`GateError::Git`] if a blob cannot be read. The
    /// partial snapshot is removed before the error is returned.
    pub fn build(
        root: &Path,
        entries: &[StagedEntry],
        repo: &Repository,
    ) -> Result<Self, GateError> {
        if is_leftover(root, repo)? {
            debug!(root = %root.display(), "removing stale scratch directory");
            fs::remove_dir_all(root)?;
        }
        fs::create_dir_all(root)?;

        let mut snapshot = Self {
            root: root.to_path_buf(),
            files: Vec::with_capacity(entries.len()),
        };
        fs::write(root.join(SCRATCH_MARKER), "")?;

        for entry in entries {
            let content = repo.read_blob(&entry.blob)?;
            let target = snapshot.root.join(&entry.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, content)?;
            debug!(
                path = %entry.path.display(),
                blob = %entry.blob,
                status = %entry.status,
                "snapshotted"
            );
            snapshot.files.push(target);
        }

        Ok(snapshot)
    }

    /// The scratch directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshotted files under [`root`](Snapshot::root), in selection order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Decides whether an existing `root` is a scratch directory from an
/// earlier run. Returns `false` when nothing exists there yet.
fn is_leftover(root: &Path, repo: &Repository) -> Result<bool, GateError> {
    let meta = match fs::symlink_metadata(root) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let refuse = |reason: &'static str| GateError::UnsafeStaging {
        path: root.to_path_buf(),
        reason,
    };
    if repo.root().canonicalize()?.starts_with(root.canonicalize()?) {
        return Err(refuse("it contains the repository"));
    }
    if !meta.is_dir() || !root.join(SCRATCH_MARKER).is_file() {
        return Err(refuse("the path exists and was not created by phpgate"));
    }
    Ok(true)
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(root = %self.root.display(), error = %e, "failed to remove scratch directory");
            }
        }
    }
}

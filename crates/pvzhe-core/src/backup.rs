//! Timestamped copies of the game's save directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Backup directory name format. Sorting names lexicographically sorts
/// them chronologically.
pub const NAME_FORMAT: &str = "%Y.%m.%d %H-%M-%S";

/// Marks an in-progress copy; never listed as a backup
const STAGING_PREFIX: &str = ".";
const STAGING_SUFFIX: &str = ".partial";

pub struct BackupManager {
    root: PathBuf,
    keep: usize,
}

impl BackupManager {
    pub fn new<P: AsRef<Path>>(root: P, keep: usize) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            keep,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy `save_dir` into a new backup named after the current local time
    pub fn create_from<P: AsRef<Path>>(&self, save_dir: P) -> Result<PathBuf> {
        self.create_at(save_dir, Local::now())
    }

    /// Copy `save_dir` into a backup named after `now`.
    ///
    /// The copy is staged in a hidden sibling directory and renamed into
    /// place once complete, so a failed copy never shows up as a backup.
    pub fn create_at<P: AsRef<Path>>(&self, save_dir: P, now: DateTime<Local>) -> Result<PathBuf> {
        let save_dir = save_dir.as_ref();
        ensure_not_nested(save_dir, &self.root)?;

        let name = now.format(NAME_FORMAT).to_string();
        let dest = self.root.join(&name);
        let staging = self.root.join(format!("{}{}{}", STAGING_PREFIX, name, STAGING_SUFFIX));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }

        if let Err(e) = copy_dir(save_dir, &staging).and_then(|()| replace_dir(&staging, &dest)) {
            if staging.exists() {
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    warn!("Failed to remove {}: {}", staging.display(), cleanup);
                }
            }
            return Err(e);
        }

        info!("Backup created: {}", dest.display());
        Ok(dest)
    }

    /// Backup names, newest first. A missing root yields an empty list.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() && !name.starts_with(STAGING_PREFIX) {
                names.push(name);
            }
        }
        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    /// Delete the oldest backups beyond the retention count.
    ///
    /// Returns the names that were removed. A backup that cannot be removed
    /// is logged and skipped.
    pub fn prune(&self) -> Result<Vec<String>> {
        let names = self.list()?;
        let mut removed = Vec::new();
        for name in names.into_iter().skip(self.keep) {
            match fs::remove_dir_all(self.root.join(&name)) {
                Ok(()) => {
                    debug!("Pruned backup {}", name);
                    removed.push(name);
                }
                Err(e) => warn!("Failed to remove backup {}: {}", name, e),
            }
        }
        Ok(removed)
    }

    /// Copy backup `name` over `save_dir`
    pub fn restore<P: AsRef<Path>>(&self, name: &str, save_dir: P) -> Result<()> {
        let source = self.root.join(name);
        if name.is_empty() || !source.is_dir() {
            return Err(Error::BackupNotFound(name.to_string()));
        }

        let save_dir = save_dir.as_ref();
        copy_dir(&source, save_dir)?;
        info!("Restored backup {} to {}", name, save_dir.display());
        Ok(())
    }
}

/// Recursively copy the contents of `src` into `dst`, creating directories
/// as needed and overwriting existing files.
///
/// Fails before writing anything if `dst` is `src` or lies inside it.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    ensure_not_nested(src, dst)?;
    copy_tree(src, dst)
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Move a finished staging directory to `dest`, replacing an older backup
/// taken in the same second
fn replace_dir(staging: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        debug!("Replacing existing backup {}", dest.display());
        fs::remove_dir_all(dest)?;
    }
    fs::rename(staging, dest)?;
    Ok(())
}

fn ensure_not_nested(src: &Path, dst: &Path) -> Result<()> {
    let src = fs::canonicalize(src)?;
    let dst = absolute(dst)?;
    if dst.starts_with(&src) {
        return Err(Error::NestedCopy { src, dst });
    }
    Ok(())
}

/// Canonical form of a path that may not exist yet
fn absolute(path: &Path) -> Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                return Err(e.into());
            };
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            Ok(absolute(parent)?.join(name))
        }
        Err(e) => Err(e.into()),
    }
}

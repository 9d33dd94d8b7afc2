use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::plugin::error::{PluginError, Result};

pub const LOCK_FILE: &str = ".plugin-orchestrator.lock";

/// Advisory exclusive lock on a plugin root, released on drop.
///
/// plugman itself does not guard against two writers in the same
/// `--plugins_dir`, so concurrent build jobs serialize here instead.
#[derive(Debug)]
pub struct RootLock {
    file: File,
    path: PathBuf,
}

impl RootLock {
    pub fn acquire(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        let path = root.join(LOCK_FILE);
        let lock_err = |source| PluginError::Lock {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(lock_err)?;

        if file.try_lock_exclusive().is_err() {
            tracing::info!("waiting for lock on {}", root.display());
            file.lock_exclusive().map_err(lock_err)?;
        }

        Ok(Self { file, path })
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!("failed to unlock {}: {err}", self.path.display());
        }
    }
}

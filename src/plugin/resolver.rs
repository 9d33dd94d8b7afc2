use std::path::{Path, PathBuf};

use crate::plugin::error::{PluginError, Result};

/// Maps a user supplied reference onto a directory that exists on disk.
#[derive(Debug, Clone)]
pub struct PathResolver {
    global_root: PathBuf,
    local_root: PathBuf,
}

impl PathResolver {
    pub fn new(global_root: impl Into<PathBuf>, local_root: impl Into<PathBuf>) -> Self {
        Self {
            global_root: global_root.into(),
            local_root: local_root.into(),
        }
    }

    /// Explicit path wins over the global cache, which wins over the local install.
    ///
    /// Only directories count; a stray file with the same name is skipped.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let found = self
            .candidates(reference)
            .into_iter()
            .find(|candidate| candidate.is_dir());

        match found {
            Some(path) => {
                tracing::debug!("resolved {reference} to {}", path.display());
                Ok(path)
            }
            None => Err(PluginError::UnresolvedReference(reference.to_string())),
        }
    }

    fn candidates(&self, reference: &str) -> [PathBuf; 3] {
        let direct = Path::new(reference);
        [
            direct.to_path_buf(),
            self.global_root.join(direct),
            self.local_root.join(direct),
        ]
    }
}

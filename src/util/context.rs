//! Global context for conanfest operations.
//!
//! Provides centralized access to configuration, paths, and manifest
//! discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::format::ManifestFormat;
use crate::util::config::{self, Config};

/// Manifest names searched for, in priority order.
pub const MANIFEST_CANDIDATES: [ManifestFormat; 2] =
    [ManifestFormat::ConanfilePy, ManifestFormat::ConanfileTxt];

/// Error while locating a manifest.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("could not find conanfile.py or conanfile.txt in {} or any parent directory", dir.display())]
    NotFound { dir: PathBuf },

    #[error("both conanfile.py and conanfile.txt exist in {}", dir.display())]
    Ambiguous { dir: PathBuf },
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Merged global + project configuration
    config: Config,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::with_cwd(cwd)
    }

    /// Create a GlobalContext rooted at a specific directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let project_root = find_manifest_dir(&cwd).unwrap_or_else(|| cwd.clone());
        let global = config::global_config_path();
        let config = config::load_config(global.as_deref(), &config::project_config_path(&project_root));

        Ok(GlobalContext { cwd, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Find the manifest file starting from cwd and searching upward.
    ///
    /// Returns an error if both `conanfile.py` and `conanfile.txt` exist in
    /// the same directory, as Conan itself refuses to pick one.
    pub fn find_manifest(&self) -> Result<PathBuf, DiscoveryError> {
        let mut current = self.cwd.clone();
        loop {
            let found: Vec<PathBuf> = MANIFEST_CANDIDATES
                .iter()
                .map(|format| current.join(format.file_name()))
                .filter(|path| path.is_file())
                .collect();

            match found.len() {
                0 => {
                    if !current.pop() {
                        return Err(DiscoveryError::NotFound {
                            dir: self.cwd.clone(),
                        });
                    }
                }
                1 => return Ok(found.into_iter().next().unwrap_or_default()),
                _ => return Err(DiscoveryError::Ambiguous { dir: current }),
            }
        }
    }

    /// The lockfile that belongs to a manifest.
    pub fn lockfile_for(&self, manifest_path: &Path) -> PathBuf {
        manifest_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(self.config.lockfile_name())
    }

    /// Project config path for the manifest nearest to cwd.
    pub fn project_config_path(&self) -> PathBuf {
        let root = find_manifest_dir(&self.cwd).unwrap_or_else(|| self.cwd.clone());
        config::project_config_path(&root)
    }
}

fn find_manifest_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| {
            MANIFEST_CANDIDATES
                .iter()
                .any(|format| dir.join(format.file_name()).is_file())
        })
        .map(Path::to_path_buf)
}

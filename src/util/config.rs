//! Configuration file support for conanfest.
//!
//! conanfest supports two configuration file locations:
//! - Global: `~/.conanfest/config.toml` - User-wide defaults
//! - Project: `.conanfest/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use toml_edit::{Array, DocumentMut, Item, Table};

use crate::core::format::ManifestFormat;
use crate::util::fs;

/// conanfest configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Manifest settings
    pub manifest: ManifestConfig,

    /// Directory scan settings
    pub scan: ScanConfig,

    /// Lockfile settings
    pub lock: LockConfig,
}

/// Manifest-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Default format for new manifests (py, txt)
    pub format: Option<String>,

    /// Sort requirements by scope and name whenever a manifest is rewritten
    pub sort: Option<bool>,
}

/// Scan-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Glob patterns (relative to the scan root) to skip
    pub exclude: Option<Vec<String>>,

    /// Follow symbolic links while walking
    pub follow_links: Option<bool>,
}

/// Lockfile-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Lockfile path relative to the manifest directory (default: conan.lock)
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.manifest.format.is_some() {
            self.manifest.format = other.manifest.format;
        }
        if let Some(sort) = other.manifest.sort {
            self.manifest.sort = Some(sort);
        }

        if let Some(exclude) = other.scan.exclude {
            self.scan.exclude = Some(exclude);
        }
        if let Some(follow_links) = other.scan.follow_links {
            self.scan.follow_links = Some(follow_links);
        }

        if other.lock.path.is_some() {
            self.lock.path = other.lock.path;
        }
    }

    /// Parse the default manifest format from config.
    pub fn manifest_format(&self) -> Option<ManifestFormat> {
        self.manifest.format.as_ref().and_then(|s| s.parse().ok())
    }

    pub fn sort(&self) -> bool {
        self.manifest.sort.unwrap_or(false)
    }

    pub fn scan_exclude(&self) -> &[String] {
        self.scan.exclude.as_deref().unwrap_or_default()
    }

    pub fn follow_links(&self) -> bool {
        self.scan.follow_links.unwrap_or(false)
    }

    /// Lockfile name, relative to the manifest directory.
    pub fn lockfile_name(&self) -> &str {
        self.lock
            .path
            .as_deref()
            .unwrap_or(ManifestFormat::ConanLock.file_name())
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.conanfest/config.toml)
/// 2. Global config (~/.conanfest/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global conanfest config directory (~/.conanfest).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".conanfest"))
}

/// Get the global config path (~/.conanfest/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.conanfest/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".conanfest").join("config.toml")
}

/// Set a dotted `section.key` in a config file, preserving its formatting.
///
/// Values are typed by key: `scan.exclude` takes a comma-separated list,
/// boolean keys take `true`/`false`, everything else is a string.
pub fn set_value(path: &Path, key: &str, raw: &str) -> Result<()> {
    let (section, field) = key
        .split_once('.')
        .with_context(|| format!("config key `{}` must look like `section.key`", key))?;

    let value = match key {
        "manifest.format" => {
            raw.parse::<ManifestFormat>().map_err(anyhow::Error::msg)?;
            toml_edit::value(raw)
        }
        "manifest.sort" | "scan.follow_links" => {
            let b: bool = raw
                .parse()
                .with_context(|| format!("`{}` expects true or false, got `{}`", key, raw))?;
            toml_edit::value(b)
        }
        "scan.exclude" => {
            let mut array = Array::new();
            for pattern in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                array.push(pattern);
            }
            toml_edit::value(array)
        }
        "lock.path" => toml_edit::value(raw),
        _ => bail!("unknown config key `{}`", key),
    };

    let content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };
    let mut doc: DocumentMut = content
        .parse()
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    if !doc.contains_key(section) {
        doc[section] = Item::Table(Table::new());
    }
    let Some(table) = doc[section].as_table_like_mut() else {
        bail!("`{}` in {} is not a table", section, path.display());
    };
    table.insert(field, value);

    fs::write_string(path, &doc.to_string())
}

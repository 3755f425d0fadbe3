//! Manifest file formats and file identification.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Package URL type for every file this crate understands.
pub const ECOSYSTEM: &str = "conan";

/// Distinguishes declared requirements from locked resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Manifest,
    Lockfile,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Manifest => f.write_str("manifest"),
            Kind::Lockfile => f.write_str("lockfile"),
        }
    }
}

/// The on-disk format of a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestFormat {
    /// `conanfile.py` recipe
    ConanfilePy,
    /// `conanfile.txt` consumer manifest
    ConanfileTxt,
    /// `conan.lock` JSON lockfile
    ConanLock,
}

impl ManifestFormat {
    pub const ALL: [ManifestFormat; 3] = [
        ManifestFormat::ConanfilePy,
        ManifestFormat::ConanfileTxt,
        ManifestFormat::ConanLock,
    ];

    /// Canonical file name for this format.
    pub fn file_name(&self) -> &'static str {
        match self {
            ManifestFormat::ConanfilePy => "conanfile.py",
            ManifestFormat::ConanfileTxt => "conanfile.txt",
            ManifestFormat::ConanLock => "conan.lock",
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            ManifestFormat::ConanLock => Kind::Lockfile,
            _ => Kind::Manifest,
        }
    }

    /// Whether this format can carry a package name and version.
    pub fn has_package_descriptor(&self) -> bool {
        matches!(self, ManifestFormat::ConanfilePy)
    }
}

impl fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for ManifestFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "py" | "python" | "conanfile.py" => Ok(ManifestFormat::ConanfilePy),
            "txt" | "text" | "conanfile.txt" => Ok(ManifestFormat::ConanfileTxt),
            "lock" | "lockfile" | "conan.lock" => Ok(ManifestFormat::ConanLock),
            _ => Err(format!(
                "invalid manifest format '{}'; expected 'py', 'txt', or 'lock'",
                s
            )),
        }
    }
}

/// Identify a Conan file by its base name.
pub fn identify(path: &Path) -> Option<ManifestFormat> {
    let base = path.file_name()?.to_str()?;
    ManifestFormat::ALL
        .into_iter()
        .find(|format| format.file_name() == base)
}

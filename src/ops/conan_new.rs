//! Implementation of `conanfest init`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::format::ManifestFormat;
use crate::core::manifest::{Manifest, PackageDescriptor};
use crate::core::reference::Reference;
use crate::core::requirement::Requirement;
use crate::util::context::MANIFEST_CANDIDATES;
use crate::util::fs;

/// Options for creating a new manifest.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// `conanfile.py` or `conanfile.txt`
    pub format: ManifestFormat,

    /// Package name (recipes only; defaults to the directory name)
    pub name: Option<String>,

    /// Package version (recipes only)
    pub version: String,

    /// Initial runtime requirements
    pub requires: Vec<Reference>,
}

impl Default for InitOptions {
    fn default() -> Self {
        InitOptions {
            format: ManifestFormat::ConanfilePy,
            name: None,
            version: "0.1.0".to_string(),
            requires: Vec::new(),
        }
    }
}

/// Write a fresh manifest into `dir`.
///
/// Refuses to run when the directory already has a `conanfile.py` or
/// `conanfile.txt`.
pub fn init_manifest(dir: &Path, opts: &InitOptions) -> Result<PathBuf> {
    if opts.format == ManifestFormat::ConanLock {
        bail!("`init` creates a recipe or consumer manifest; use `lock` for lockfiles");
    }

    for format in MANIFEST_CANDIDATES {
        let existing = dir.join(format.file_name());
        if existing.exists() {
            bail!("`{}` already exists in `{}`", format.file_name(), dir.display());
        }
    }

    fs::ensure_dir(dir)?;

    let mut manifest = Manifest::new(opts.format);
    if opts.format.has_package_descriptor() {
        let name = match opts.name.clone() {
            Some(name) => name,
            None => default_name(dir)?,
        };
        manifest = manifest.with_package(PackageDescriptor::new(name, opts.version.clone()));
    } else if opts.name.is_some() {
        tracing::warn!("{} has no package name; ignoring --name", opts.format);
    }

    for reference in &opts.requires {
        manifest = manifest.with_requirement(Requirement::runtime(reference.clone()));
    }

    let path = dir.join(opts.format.file_name());
    manifest.path = path.clone();
    manifest.save(&path)?;
    Ok(path)
}

/// Package name derived from a directory: lowercased, with characters Conan
/// rejects replaced by `-`.
fn default_name(dir: &Path) -> Result<String> {
    let base = dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();

    let name: String = base
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let name = name.trim_matches(|c: char| !c.is_ascii_alphanumeric()).to_string();

    if name.is_empty() {
        bail!(
            "cannot derive a package name from `{}`; pass --name",
            dir.display()
        );
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_recipe() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("My Project");

        let path = init_manifest(
            &dir,
            &InitOptions {
                requires: vec![Reference::parse("zlib/1.2.11").unwrap()],
                ..InitOptions::default()
            },
        )
        .unwrap();

        let m = Manifest::load(&path).unwrap();
        let pkg = m.package().unwrap();
        assert_eq!(pkg.name, "my-project");
        assert_eq!(pkg.version, "0.1.0");
        assert_eq!(m.requirements.len(), 1);
    }

    #[test]
    fn test_init_text() {
        let tmp = TempDir::new().unwrap();
        let path = init_manifest(
            tmp.path(),
            &InitOptions {
                format: ManifestFormat::ConanfileTxt,
                ..InitOptions::default()
            },
        )
        .unwrap();

        assert_eq!(path, tmp.path().join("conanfile.txt"));
        assert!(Manifest::load(&path).unwrap().requirements.is_empty());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("conanfile.txt"), "[requires]\n").unwrap();

        let err = init_manifest(
            tmp.path(),
            &InitOptions {
                name: Some("demo".into()),
                ..InitOptions::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(!tmp.path().join("conanfile.py").exists());
    }
}

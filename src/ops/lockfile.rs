//! Lockfile operations: writing `conan.lock` from a manifest and checking
//! a manifest against an existing lockfile.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::core::format::{Kind, ManifestFormat};
use crate::core::manifest::Manifest;
use crate::core::requirement::{Requirement, Scope};
use crate::ops::convert::ensure_pinned;

/// The lockfile list a scope is recorded in.
fn lock_scope(scope: Scope) -> Scope {
    match scope {
        Scope::Test => Scope::Runtime,
        other => other,
    }
}

/// Write a lockfile for a manifest's pinned requirements.
///
/// Revisions and `config_requires` already recorded in an existing lockfile
/// are kept for entries whose version did not change.
pub fn write_lockfile(manifest_path: &Path, lock_path: &Path) -> Result<Manifest> {
    let manifest = Manifest::load_strict(manifest_path)?;
    if manifest.kind() == Kind::Lockfile {
        bail!("{} is already a lockfile", manifest_path.display());
    }
    ensure_pinned(&manifest)?;

    let previous = if lock_path.exists() {
        Some(Manifest::load(lock_path)?)
    } else {
        None
    };

    let mut lock = manifest.with_format(ManifestFormat::ConanLock);
    lock.path = lock_path.to_path_buf();

    if let Some(previous) = previous {
        for requirement in &mut lock.requirements {
            let kept = previous.requirements.iter().find(|locked| {
                lock_scope(locked.scope) == lock_scope(requirement.scope)
                    && locked.reference.without_revision() == requirement.reference.without_revision()
            });
            if let Some(locked) = kept {
                if requirement.reference.revision().is_none() {
                    requirement.reference = locked.reference.clone();
                }
            }
        }
        lock.extra_sections = previous.extra_sections;
    }

    lock.save(lock_path)?;
    tracing::debug!(
        "wrote {} with {} entries",
        lock_path.display(),
        lock.requirements.len()
    );
    Ok(lock)
}

/// A manifest requirement whose locked entry does not satisfy it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub declared: Requirement,
    pub locked: Requirement,
}

/// How a manifest and its lockfile disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LockStatus {
    /// Declared but not locked
    pub missing: Vec<Requirement>,
    /// Locked at a version or qualifier the declaration does not accept
    pub mismatched: Vec<Mismatch>,
    /// Locked but not declared (may be transitive)
    pub unused: Vec<Requirement>,
}

impl LockStatus {
    /// True when every declaration is satisfied by the lockfile.
    ///
    /// Unused entries do not count: Conan records transitive packages too.
    pub fn is_up_to_date(&self) -> bool {
        self.missing.is_empty() && self.mismatched.is_empty()
    }
}

/// Compare a manifest against a lockfile.
///
/// A declaration is satisfied when the lockfile has an entry with the same
/// name and qualifier in the matching list whose version equals the pinned
/// version, or falls inside the declared range.
pub fn check_lockfile(manifest: &Manifest, lock: &Manifest) -> LockStatus {
    let mut status = LockStatus::default();
    let mut used: HashSet<usize> = HashSet::new();

    for declared in &manifest.requirements {
        let candidates: Vec<(usize, &Requirement)> = lock
            .requirements
            .iter()
            .enumerate()
            .filter(|(_, locked)| {
                locked.name() == declared.name()
                    && lock_scope(locked.scope) == lock_scope(declared.scope)
            })
            .collect();

        if candidates.is_empty() {
            status.missing.push(declared.clone());
            continue;
        }

        let satisfied = candidates.iter().find(|(_, locked)| satisfies(declared, locked));
        match satisfied {
            Some((idx, _)) => {
                used.insert(*idx);
            }
            None => {
                let (idx, locked) = candidates[0];
                used.insert(idx);
                status.mismatched.push(Mismatch {
                    declared: declared.clone(),
                    locked: locked.clone(),
                });
            }
        }
    }

    status.unused = lock
        .requirements
        .iter()
        .enumerate()
        .filter(|(idx, _)| !used.contains(idx))
        .map(|(_, r)| r.clone())
        .collect();

    status
}

fn satisfies(declared: &Requirement, locked: &Requirement) -> bool {
    if declared.qualifier() != locked.qualifier() {
        return false;
    }
    if let Some(rev) = declared.reference.revision_hash() {
        if locked.reference.revision_hash() != Some(rev) {
            return false;
        }
    }
    match declared.reference.accepts(locked.version()) {
        Some(accepted) => accepted,
        None => {
            tracing::warn!(
                "cannot evaluate range {} against {}; treating as mismatch",
                declared.version(),
                locked.version()
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::Reference;
    use tempfile::TempDir;

    fn req(s: &str, scope: Scope) -> Requirement {
        Requirement::new(Reference::parse(s).unwrap(), scope)
    }

    fn manifest(reqs: &[(&str, Scope)]) -> Manifest {
        reqs.iter()
            .fold(Manifest::new(ManifestFormat::ConanfileTxt), |m, (r, s)| {
                m.with_requirement(req(r, *s))
            })
    }

    fn lock(reqs: &[(&str, Scope)]) -> Manifest {
        let mut m = manifest(reqs);
        m.format = ManifestFormat::ConanLock;
        m
    }

    #[test]
    fn test_check_clean() {
        let m = manifest(&[
            ("zlib/1.2.11", Scope::Runtime),
            ("boost/1.76.0@user/channel", Scope::Runtime),
            ("gtest/1.14.0", Scope::Test),
        ]);
        let l = lock(&[
            ("zlib/1.2.11#abc%1.0", Scope::Runtime),
            ("boost/1.76.0@user/channel#def", Scope::Runtime),
            ("gtest/1.14.0", Scope::Runtime),
            ("bzip2/1.0.8", Scope::Runtime),
        ]);

        let status = check_lockfile(&m, &l);
        assert!(status.is_up_to_date());
        assert_eq!(status.unused.len(), 1);
        assert_eq!(status.unused[0].name(), "bzip2");
    }

    #[test]
    fn test_check_reports_drift() {
        let m = manifest(&[
            ("zlib/1.3.1", Scope::Runtime),
            ("boost/1.76.0", Scope::Runtime),
            ("fmt/10.2.1", Scope::Runtime),
            ("cmake/3.21.0", Scope::Build),
        ]);
        let l = lock(&[
            ("zlib/1.2.11", Scope::Runtime),
            ("boost/1.76.0@user/channel", Scope::Runtime),
            ("cmake/3.21.0", Scope::Runtime),
        ]);

        let status = check_lockfile(&m, &l);
        assert!(!status.is_up_to_date());

        let mismatched: Vec<&str> = status.mismatched.iter().map(|m| m.declared.name()).collect();
        assert_eq!(mismatched, vec!["zlib", "boost"]);

        let missing: Vec<&str> = status.missing.iter().map(Requirement::name).collect();
        assert_eq!(missing, vec!["fmt", "cmake"]);

        // cmake is locked in the wrong list, so it is both missing and unused.
        assert_eq!(status.unused.len(), 1);
        assert_eq!(status.unused[0].name(), "cmake");
    }

    #[test]
    fn test_check_ranges() {
        let m = manifest(&[("zlib/[>=1.2 <2]", Scope::Runtime)]);

        let ok = check_lockfile(&m, &lock(&[("zlib/1.3.1", Scope::Runtime)]));
        assert!(ok.is_up_to_date());

        let too_new = check_lockfile(&m, &lock(&[("zlib/2.0.0", Scope::Runtime)]));
        assert_eq!(too_new.mismatched.len(), 1);
    }

    #[test]
    fn test_write_lockfile_keeps_revisions() {
        let tmp = TempDir::new().unwrap();
        let manifest_path = tmp.path().join("conanfile.txt");
        std::fs::write(
            &manifest_path,
            "[requires]\nzlib/1.2.11\nfmt/10.2.1\n[tool_requires]\ncmake/3.21.0\n",
        )
        .unwrap();
        let lock_path = tmp.path().join("conan.lock");
        std::fs::write(
            &lock_path,
            r#"{"version": "0.5", "requires": ["zlib/1.2.11#abc%1680620582.1", "fmt/9.0.0#old"], "config_requires": ["myconf/1.0"]}"#,
        )
        .unwrap();

        let lock = write_lockfile(&manifest_path, &lock_path).unwrap();
        assert_eq!(lock.format, ManifestFormat::ConanLock);

        let reloaded = Manifest::load(&lock_path).unwrap();
        let zlib = reloaded.requirement("zlib").unwrap();
        assert_eq!(zlib.reference.revision(), Some("abc%1680620582.1"));
        let fmt = reloaded.requirement("fmt").unwrap();
        assert_eq!(fmt.version(), "10.2.1");
        assert!(fmt.reference.revision().is_none());
        assert_eq!(reloaded.requirement("cmake").unwrap().scope, Scope::Build);
        assert_eq!(reloaded.extra_sections[0].lines, vec!["myconf/1.0"]);

        let manifest = Manifest::load(&manifest_path).unwrap();
        assert!(check_lockfile(&manifest, &reloaded).is_up_to_date());
    }

    #[test]
    fn test_write_lockfile_rejects_ranges() {
        let tmp = TempDir::new().unwrap();
        let manifest_path = tmp.path().join("conanfile.txt");
        std::fs::write(&manifest_path, "[requires]\nzlib/[>=1.2 <2]\n").unwrap();

        let err = write_lockfile(&manifest_path, &tmp.path().join("conan.lock")).unwrap_err();
        assert!(err.to_string().contains("cannot lock version ranges"));
    }
}

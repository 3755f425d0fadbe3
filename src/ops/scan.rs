//! Implementation of `conanfest scan`.
//!
//! Walks a directory tree, identifies every Conan file and parses them in
//! parallel. A file that fails to parse is reported, not fatal.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use rayon::prelude::*;
use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::core::format::{identify, ManifestFormat};
use crate::core::manifest::Manifest;
use crate::util::fs::relative_path;

/// Directories that never contain first-party manifests.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "build"];

/// Options for scanning a directory.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Glob patterns, relative to the scan root, to skip
    pub exclude: Vec<String>,

    /// Follow symbolic links
    pub follow_links: bool,
}

/// Summary of one successfully parsed file.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub requirements: usize,
    pub fingerprint: String,
}

/// Parse result for one file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanOutcome {
    Parsed(ScanSummary),
    Failed { error: String },
}

/// One Conan file found during a scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanEntry {
    /// Path relative to the scan root
    pub path: PathBuf,
    pub format: ManifestFormat,
    pub outcome: ScanOutcome,
}

impl ScanEntry {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, ScanOutcome::Parsed(_))
    }
}

/// Find Conan files under `root` without parsing them.
pub fn discover(root: &Path, opts: &ScanOptions) -> Result<Vec<(PathBuf, ManifestFormat)>> {
    let patterns = opts
        .exclude
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("invalid exclude pattern `{}`", p)))
        .collect::<Result<Vec<_>>>()?;

    let is_excluded = |entry: &DirEntry| {
        let rel = relative_path(root, entry.path());
        patterns.iter().any(|p| p.matches_path(&rel))
    };

    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(opts.follow_links)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || (!is_skipped_dir(entry) && !is_excluded(entry)));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(format) = identify(entry.path()) {
            found.push((entry.into_path(), format));
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

/// Parse the Conan files [`discover`] found under `root`.
///
/// `on_parsed` is called from worker threads once per file.
pub fn scan<F>(root: &Path, files: &[(PathBuf, ManifestFormat)], on_parsed: F) -> Vec<ScanEntry>
where
    F: Fn(&Path) + Sync,
{
    tracing::debug!("parsing {} Conan file(s) under {}", files.len(), root.display());

    let mut entries: Vec<ScanEntry> = files
        .par_iter()
        .map(|(path, format)| {
            let outcome = match Manifest::load(path) {
                Ok(manifest) => ScanOutcome::Parsed(ScanSummary {
                    package: manifest
                        .package
                        .as_ref()
                        .map(|p| format!("{}/{}", p.name, p.version)),
                    requirements: manifest.requirements.len(),
                    fingerprint: manifest.fingerprint(),
                }),
                Err(e) => {
                    tracing::warn!("failed to parse {}: {:#}", path.display(), e);
                    ScanOutcome::Failed {
                        error: format!("{:#}", e),
                    }
                }
            };
            let rel = relative_path(root, path);
            on_parsed(&rel);
            ScanEntry {
                path: rel,
                format: *format,
                outcome,
            }
        })
        .collect();

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "conanfile.txt", "[requires]\nzlib/1.2.11\n");
        write(
            root,
            "libs/core/conanfile.py",
            "from conan import ConanFile\n\nclass Core(ConanFile):\n    name = \"core\"\n    version = \"0.1.0\"\n    requires = \"fmt/10.2.1\"\n",
        );
        write(root, "libs/core/conan.lock", r#"{"version": "0.5", "requires": ["fmt/10.2.1"]}"#);
        write(root, "broken/conan.lock", "{ not json");
        write(root, "partial/conanfile.txt", "[requires]\nnot-a-reference\nfmt/10.2.1\n");
        write(root, ".git/conanfile.txt", "[requires]\nzlib/1.2.11\n");
        write(root, "build/conanfile.txt", "[requires]\nzlib/1.2.11\n");
        write(root, "third_party/x/conanfile.txt", "[requires]\nzlib/1.2.11\n");
        write(root, "README.md", "# not a manifest\n");
        tmp
    }

    #[test]
    fn test_scan_finds_and_parses() {
        let tmp = tree();
        let seen = AtomicUsize::new(0);
        let opts = ScanOptions {
            exclude: vec!["third_party/**".into()],
            follow_links: false,
        };
        let files = discover(tmp.path(), &opts).unwrap();
        let entries = scan(tmp.path(), &files, |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let paths: Vec<String> = entries
            .iter()
            .map(|e| e.path.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(
            paths,
            vec![
                "broken/conan.lock",
                "conanfile.txt",
                "libs/core/conan.lock",
                "libs/core/conanfile.py",
                "partial/conanfile.txt",
            ]
        );
        assert_eq!(seen.load(Ordering::SeqCst), 5);

        assert!(!entries[0].is_ok());
        match &entries[4].outcome {
            ScanOutcome::Parsed(summary) => assert_eq!(summary.requirements, 1),
            ScanOutcome::Failed { error } => panic!("unexpected failure: {error}"),
        }
        let core = &entries[3];
        assert_eq!(core.format, ManifestFormat::ConanfilePy);
        match &core.outcome {
            ScanOutcome::Parsed(summary) => {
                assert_eq!(summary.package.as_deref(), Some("core/0.1.0"));
                assert_eq!(summary.requirements, 1);
            }
            ScanOutcome::Failed { error } => panic!("unexpected failure: {error}"),
        }
    }

    #[test]
    fn test_scan_only_parses_given_files() {
        let tmp = tree();
        let opts = ScanOptions {
            exclude: vec!["third_party/**".into(), "broken/**".into()],
            follow_links: false,
        };
        let files = discover(tmp.path(), &opts).unwrap();
        assert_eq!(files.len(), 4);

        let entries = scan(tmp.path(), &files[..2], |_| {});
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(ScanEntry::is_ok));
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let tmp = TempDir::new().unwrap();
        let opts = ScanOptions {
            exclude: vec!["[".into()],
            follow_links: false,
        };
        assert!(discover(tmp.path(), &opts).is_err());
    }
}

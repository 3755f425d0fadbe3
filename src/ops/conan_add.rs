//! Implementation of `conanfest add` and `conanfest remove`.
//!
//! `conanfile.py` is edited in place so the rest of the recipe survives.
//! `conanfile.txt` and `conan.lock` are loaded, changed and re-rendered.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::codec::{self, ParseMode};
use crate::core::format::{identify, ManifestFormat};
use crate::core::manifest::Manifest;
use crate::core::reference::Reference;
use crate::core::requirement::{Requirement, Scope};
use crate::ops::convert::UnpinnedError;
use crate::util::fs;

/// Options for adding a requirement.
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Reference to declare
    pub reference: Reference,

    /// Scope to declare it in
    pub scope: Scope,

    /// Compute the new content without writing it
    pub dry_run: bool,

    /// Sort requirements before writing (txt and lock only)
    pub sort: bool,
}

impl AddOptions {
    pub fn new(reference: Reference, scope: Scope) -> Self {
        AddOptions {
            reference,
            scope,
            dry_run: false,
            sort: false,
        }
    }
}

/// What `add` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddResult {
    /// The requirement was not declared before.
    Added(Requirement),
    /// A requirement with the same name and scope was replaced.
    Updated { old: Requirement, new: Requirement },
    /// The exact requirement was already declared.
    Unchanged(Requirement),
}

/// Options for removing a requirement.
#[derive(Debug, Clone)]
pub struct RemoveOptions {
    /// Package name to remove
    pub name: String,

    /// Only remove from this scope
    pub scope: Option<Scope>,

    /// Compute the new content without writing it
    pub dry_run: bool,
}

/// What `remove` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveResult {
    Removed(Vec<Requirement>),
    NotFound,
}

/// The outcome of an edit, with the content that was (or would be) written.
#[derive(Debug, Clone)]
pub struct Edit<R> {
    pub result: R,
    pub content: String,
    pub written: bool,
}

/// Add a requirement to a manifest file.
pub fn add_requirement(manifest_path: &Path, opts: &AddOptions) -> Result<Edit<AddResult>> {
    let format = format_of(manifest_path)?;
    let original = fs::read_to_string(manifest_path)?;
    let mut manifest =
        Manifest::parse_with(&original, format, manifest_path, parse_mode(format))?;

    let requirement = Requirement::new(opts.reference.clone(), opts.scope);

    if format == ManifestFormat::ConanLock && requirement.reference.is_range() {
        return Err(UnpinnedError {
            ranges: vec![requirement.reference.to_string()],
        }
        .into());
    }
    if format == ManifestFormat::ConanfileTxt && opts.scope == Scope::Python {
        bail!("conanfile.txt cannot declare python_requires");
    }

    let existing = manifest
        .requirements_in(opts.scope)
        .find(|r| r.name() == requirement.name())
        .cloned();

    if existing.as_ref() == Some(&requirement) {
        tracing::debug!("{} already declares {}", manifest_path.display(), requirement.reference);
        return Ok(Edit {
            result: AddResult::Unchanged(requirement),
            content: original,
            written: false,
        });
    }

    let content = match format {
        ManifestFormat::ConanfilePy => {
            let file = manifest_path.display().to_string();
            let mut source = original.clone();
            if existing.is_some() {
                let (stripped, removed) =
                    codec::python::remove_requirement(&source, requirement.name(), Some(opts.scope));
                if removed.is_empty() {
                    bail!(
                        "`{}` is declared in a class attribute of {}; edit it by hand",
                        requirement.name(),
                        file
                    );
                }
                source = stripped;
            }
            codec::python::insert_requirement(&source, &file, &requirement)?
        }
        ManifestFormat::ConanfileTxt | ManifestFormat::ConanLock => {
            manifest.upsert_requirement(requirement.clone());
            if opts.sort {
                manifest.sort_requirements();
            }
            manifest.render()?
        }
    };

    let result = match existing {
        Some(old) => AddResult::Updated {
            old,
            new: requirement,
        },
        None => AddResult::Added(requirement),
    };

    finish(manifest_path, result, content, opts.dry_run)
}

/// Remove a requirement from a manifest file.
pub fn remove_requirement(manifest_path: &Path, opts: &RemoveOptions) -> Result<Edit<RemoveResult>> {
    let format = format_of(manifest_path)?;
    let original = fs::read_to_string(manifest_path)?;
    let mut manifest =
        Manifest::parse_with(&original, format, manifest_path, parse_mode(format))?;

    let removed = manifest.remove_requirement(&opts.name, opts.scope);
    if removed.is_empty() {
        return Ok(Edit {
            result: RemoveResult::NotFound,
            content: original,
            written: false,
        });
    }

    let content = match format {
        ManifestFormat::ConanfilePy => {
            let (source, edited) =
                codec::python::remove_requirement(&original, &opts.name, opts.scope);
            if edited.len() != removed.len() {
                bail!(
                    "`{}` is declared in a class attribute of {}; edit it by hand",
                    opts.name,
                    manifest_path.display()
                );
            }
            source
        }
        ManifestFormat::ConanfileTxt | ManifestFormat::ConanLock => manifest.render()?,
    };

    finish(manifest_path, RemoveResult::Removed(removed), content, opts.dry_run)
}

/// Recipes are edited as text, so a requirement the parser cannot read
/// survives the edit. Other formats are re-rendered and must parse fully.
fn parse_mode(format: ManifestFormat) -> ParseMode {
    match format {
        ManifestFormat::ConanfilePy => ParseMode::Lenient,
        ManifestFormat::ConanfileTxt | ManifestFormat::ConanLock => ParseMode::Strict,
    }
}

fn format_of(path: &Path) -> Result<ManifestFormat> {
    identify(path).with_context(|| format!("{} is not a Conan manifest", path.display()))
}

fn finish<R>(path: &Path, result: R, content: String, dry_run: bool) -> Result<Edit<R>> {
    if dry_run {
        tracing::debug!("dry run; not writing {}", path.display());
    } else {
        fs::write_string(path, &content)?;
    }
    Ok(Edit {
        result,
        content,
        written: !dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RECIPE: &str = r#"from conan import ConanFile


class MyPackage(ConanFile):
    name = "mypackage"
    version = "1.0.0"

    def requirements(self):
        self.requires("zlib/1.2.11")
        self.requires("boost/1.76.0@user/channel")
"#;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn opts(reference: &str, scope: Scope) -> AddOptions {
        AddOptions::new(Reference::parse(reference).unwrap(), scope)
    }

    #[test]
    fn test_add_to_recipe_in_place() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "conanfile.py", RECIPE);

        let edit = add_requirement(&path, &opts("fmt/10.2.1", Scope::Runtime)).unwrap();
        assert!(matches!(edit.result, AddResult::Added(_)));
        assert!(edit.written);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains(
            "        self.requires(\"boost/1.76.0@user/channel\")\n        self.requires(\"fmt/10.2.1\")\n"
        ));
        assert!(content.starts_with("from conan import ConanFile\n\n\nclass MyPackage"));

        let m = Manifest::load(&path).unwrap();
        assert_eq!(m.requirements.len(), 3);
    }

    #[test]
    fn test_add_to_recipe_keeps_computed_reference() {
        let tmp = TempDir::new().unwrap();
        let recipe = RECIPE.replace(
            "self.requires(\"boost/1.76.0@user/channel\")",
            "self.requires(\"boost/\" + self.boost_version)",
        );
        let path = write(tmp.path(), "conanfile.py", &recipe);

        add_requirement(&path, &opts("fmt/10.2.1", Scope::Runtime)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("self.requires(\"boost/\" + self.boost_version)"));
        assert!(content.contains("self.requires(\"fmt/10.2.1\")"));
    }

    #[test]
    fn test_add_to_text_with_bad_line_fails() {
        let tmp = TempDir::new().unwrap();
        let content = "[requires]\nzlib/1.2.11\nfmt\n";
        let path = write(tmp.path(), "conanfile.txt", content);

        let err = add_requirement(&path, &opts("boost/1.83.0", Scope::Runtime)).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid reference `fmt`"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_add_updates_existing_version() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "conanfile.py", RECIPE);

        let edit = add_requirement(&path, &opts("zlib/1.3.1", Scope::Runtime)).unwrap();
        match edit.result {
            AddResult::Updated { old, new } => {
                assert_eq!(old.version(), "1.2.11");
                assert_eq!(new.version(), "1.3.1");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let m = Manifest::load(&path).unwrap();
        assert_eq!(m.requirements.len(), 2);
        assert_eq!(m.requirement("zlib").unwrap().version(), "1.3.1");
    }

    #[test]
    fn test_add_same_requirement_is_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "conanfile.txt", "[requires]\nzlib/1.2.11\n");

        let edit = add_requirement(&path, &opts("zlib/1.2.11", Scope::Runtime)).unwrap();
        assert!(matches!(edit.result, AddResult::Unchanged(_)));
        assert!(!edit.written);
    }

    #[test]
    fn test_add_to_text_keeps_other_sections() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "conanfile.txt",
            "[requires]\nzlib/1.2.11\n\n[generators]\nCMakeDeps\n",
        );

        add_requirement(&path, &opts("cmake/3.27.0", Scope::Build)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "[requires]\nzlib/1.2.11\n\n[tool_requires]\ncmake/3.27.0\n\n[generators]\nCMakeDeps\n"
        );
    }

    #[test]
    fn test_add_dry_run_does_not_write() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "conanfile.txt", "[requires]\nzlib/1.2.11\n");

        let mut o = opts("fmt/10.2.1", Scope::Runtime);
        o.dry_run = true;
        let edit = add_requirement(&path, &o).unwrap();

        assert!(!edit.written);
        assert!(edit.content.contains("fmt/10.2.1"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[requires]\nzlib/1.2.11\n"
        );
    }

    #[test]
    fn test_add_range_to_lockfile_fails() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "conan.lock", r#"{"version": "0.5"}"#);

        let err = add_requirement(&path, &opts("zlib/[>=1.2 <2]", Scope::Runtime)).unwrap_err();
        assert!(err.to_string().contains("version range"));
    }

    #[test]
    fn test_remove_from_recipe() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "conanfile.py", RECIPE);

        let edit = remove_requirement(
            &path,
            &RemoveOptions {
                name: "boost".into(),
                scope: None,
                dry_run: false,
            },
        )
        .unwrap();

        match edit.result {
            RemoveResult::Removed(removed) => {
                assert_eq!(removed.len(), 1);
                assert_eq!(removed[0].reference.to_string(), "boost/1.76.0@user/channel");
            }
            RemoveResult::NotFound => panic!("boost should have been removed"),
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("boost"));
        assert!(content.contains("self.requires(\"zlib/1.2.11\")"));
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "conanfile.txt", "[requires]\nzlib/1.2.11\n");

        let edit = remove_requirement(
            &path,
            &RemoveOptions {
                name: "fmt".into(),
                scope: None,
                dry_run: false,
            },
        )
        .unwrap();
        assert_eq!(edit.result, RemoveResult::NotFound);
        assert!(!edit.written);
    }
}

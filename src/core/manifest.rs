//! Conan manifest model.
//!
//! A Manifest is the declarative content of one Conan file: an optional
//! package descriptor and an ordered list of scoped requirements. The same
//! model backs `conanfile.py`, `conanfile.txt` and `conan.lock`; the codec
//! used to read and write it is picked by [`ManifestFormat`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::codec::{self, ParseMode};
use crate::core::format::{identify, Kind, ManifestFormat};
use crate::core::requirement::{DeclarationKey, Requirement, Scope};
use crate::util::fs;
use crate::util::hash::Fingerprint;

/// Package identity declared by a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Package name
    pub name: String,

    /// Package version, as written
    pub version: String,
}

impl PackageDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        PackageDescriptor {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A section of a file that is carried through untouched.
///
/// `conanfile.txt` keeps `[generators]`, `[options]` and friends here;
/// `conan.lock` keeps `config_requires`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraSection {
    pub name: String,
    pub lines: Vec<String>,
}

/// A parsed Conan manifest or lockfile.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Package name and version (recipes only)
    pub package: Option<PackageDescriptor>,

    /// Declared requirements, in file order
    pub requirements: Vec<Requirement>,

    /// Format this manifest is read from and written to
    pub format: ManifestFormat,

    /// Sections the codec does not interpret
    pub extra_sections: Vec<ExtraSection>,

    /// Where this manifest was loaded from
    pub path: PathBuf,
}

impl Manifest {
    /// Create an empty manifest in the given format.
    pub fn new(format: ManifestFormat) -> Self {
        Manifest {
            package: None,
            requirements: Vec::new(),
            format,
            extra_sections: Vec::new(),
            path: PathBuf::from(format.file_name()),
        }
    }

    /// Set the package descriptor.
    pub fn with_package(mut self, package: PackageDescriptor) -> Self {
        self.package = Some(package);
        self
    }

    /// Append a requirement.
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Load a manifest for reading, picking the format from the file name.
    ///
    /// Requirements that cannot be parsed are skipped with a warning.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, ParseMode::Lenient)
    }

    /// Load a manifest that will be written back; any bad requirement fails.
    pub fn load_strict(path: &Path) -> Result<Self> {
        Self::load_with(path, ParseMode::Strict)
    }

    fn load_with(path: &Path, mode: ParseMode) -> Result<Self> {
        let format = identify(path).ok_or_else(|| codec::CodecError::UnknownFile {
            file: path.display().to_string(),
        })?;

        let content = fs::read_to_string(path)?;

        Self::parse_with(&content, format, path, mode)
    }

    /// Parse manifest content in a known format, skipping bad requirements.
    pub fn parse(content: &str, format: ManifestFormat, path: &Path) -> Result<Self> {
        Self::parse_with(content, format, path, ParseMode::Lenient)
    }

    /// Parse manifest content in a known format.
    ///
    /// Lockfiles are machine-written, so they are always parsed strictly.
    pub fn parse_with(
        content: &str,
        format: ManifestFormat,
        path: &Path,
        mode: ParseMode,
    ) -> Result<Self> {
        let file = path.display().to_string();
        let mut manifest = match format {
            ManifestFormat::ConanfilePy => codec::python::parse(content, &file, mode)?,
            ManifestFormat::ConanfileTxt => codec::text::parse(content, &file, mode)?,
            ManifestFormat::ConanLock => codec::lock::parse(content, &file)?,
        };
        manifest.path = path.to_path_buf();

        if let Some(ref pkg) = manifest.package {
            if pkg.name.trim().is_empty() {
                anyhow::bail!("manifest at {} declares an empty package name", file);
            }
        }

        tracing::debug!(
            "parsed {} with {} requirement(s)",
            file,
            manifest.requirements.len()
        );

        Ok(manifest)
    }

    /// Serialize the manifest in its format.
    pub fn render(&self) -> Result<String> {
        let rendered = match self.format {
            ManifestFormat::ConanfilePy => codec::python::render(self),
            ManifestFormat::ConanfileTxt => codec::text::render(self),
            ManifestFormat::ConanLock => codec::lock::render(self)?,
        };
        Ok(rendered)
    }

    /// Write the manifest to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self
            .render()
            .with_context(|| format!("failed to render {}", self.format))?;
        fs::write_string(path, &content)
    }

    /// Re-target this manifest to another format.
    ///
    /// Data the target format cannot hold is dropped with a warning.
    pub fn with_format(mut self, format: ManifestFormat) -> Self {
        if format == self.format {
            return self;
        }

        if self.package.is_some() && !format.has_package_descriptor() {
            tracing::warn!(
                "{} cannot declare a package name and version; dropping them",
                format
            );
            self.package = None;
        }

        // Passthrough sections only make sense in the format they came from.
        if !self.extra_sections.is_empty() {
            tracing::debug!(
                "dropping {} section(s) not representable in {}",
                self.extra_sections.len(),
                format
            );
            self.extra_sections.clear();
        }

        self.path = self
            .path
            .parent()
            .map(|dir| dir.join(format.file_name()))
            .unwrap_or_else(|| PathBuf::from(format.file_name()));
        self.format = format;
        self
    }

    pub fn kind(&self) -> Kind {
        self.format.kind()
    }

    pub fn package(&self) -> Option<&PackageDescriptor> {
        self.package.as_ref()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Requirements declared in one scope.
    pub fn requirements_in(&self, scope: Scope) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter().filter(move |r| r.scope == scope)
    }

    /// Find the first requirement with the given package name.
    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.name() == name)
    }

    /// Insert a requirement, replacing one with the same name and scope.
    ///
    /// Returns the replaced requirement, if any. Replacement keeps the
    /// original position in the file.
    pub fn upsert_requirement(&mut self, requirement: Requirement) -> Option<Requirement> {
        match self
            .requirements
            .iter_mut()
            .find(|r| r.name() == requirement.name() && r.scope == requirement.scope)
        {
            Some(existing) => Some(std::mem::replace(existing, requirement)),
            None => {
                self.requirements.push(requirement);
                None
            }
        }
    }

    /// Remove requirements by name, optionally restricted to one scope.
    pub fn remove_requirement(&mut self, name: &str, scope: Option<Scope>) -> Vec<Requirement> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .requirements
            .drain(..)
            .partition(|r| r.name() == name && scope.map_or(true, |s| r.scope == s));
        self.requirements = kept;
        removed
    }

    /// Sort requirements by scope, then name, then version.
    pub fn sort_requirements(&mut self) {
        self.requirements.sort_by(|a, b| a.key().cmp(&b.key()));
    }

    /// The set of declarations, independent of file order.
    pub fn declaration_set(&self) -> BTreeSet<DeclarationKey> {
        self.requirements.iter().map(Requirement::key).collect()
    }

    /// Whether two manifests declare the same package and requirements.
    pub fn same_declarations(&self, other: &Manifest) -> bool {
        self.package == other.package && self.declaration_set() == other.declaration_set()
    }

    /// Order-insensitive SHA256 over the package descriptor and declarations.
    pub fn fingerprint(&self) -> String {
        let mut fp = Fingerprint::new();
        if let Some(ref pkg) = self.package {
            fp.update_str(&pkg.name).update_str(&pkg.version);
        }
        for key in self.declaration_set() {
            fp.update_str(key.scope.as_str())
                .update_str(&key.name)
                .update_str(&key.version)
                .update_str(key.qualifier.as_deref().unwrap_or(""));
        }
        fp.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::Reference;
    use tempfile::TempDir;

    const RECIPE: &str = r#"from conan import ConanFile

class MyPackage(ConanFile):
    name = "mypackage"
    version = "1.0.0"

    def requirements(self):
        self.requires("zlib/1.2.11")
        self.requires("boost/1.76.0@user/channel")
"#;

    fn req(s: &str, scope: Scope) -> Requirement {
        Requirement::new(Reference::parse(s).unwrap(), scope)
    }

    #[test]
    fn test_load_then_save_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("conanfile.py");
        std::fs::write(&path, RECIPE).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        let pkg = manifest.package().unwrap();
        assert_eq!(pkg.name, "mypackage");
        assert_eq!(pkg.version, "1.0.0");
        assert_eq!(manifest.requirements.len(), 2);

        let out = tmp.path().join("out").join("conanfile.py");
        manifest.save(&out).unwrap();
        let reloaded = Manifest::load(&out).unwrap();

        assert!(manifest.same_declarations(&reloaded));
        let boost = reloaded.requirement("boost").unwrap();
        assert_eq!(boost.version(), "1.76.0");
        assert_eq!(boost.qualifier().unwrap().to_string(), "user/channel");
        let zlib = reloaded.requirement("zlib").unwrap();
        assert_eq!(zlib.version(), "1.2.11");
        assert!(zlib.qualifier().is_none());
    }

    #[test]
    fn test_load_unknown_file_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Cargo.toml");
        std::fs::write(&path, "").unwrap();

        let err = Manifest::load(&path).unwrap_err().to_string();
        assert!(err.contains("unknown manifest file"));
    }

    #[test]
    fn test_same_declarations_is_order_insensitive() {
        let a = Manifest::new(ManifestFormat::ConanfileTxt)
            .with_requirement(req("zlib/1.2.11", Scope::Runtime))
            .with_requirement(req("boost/1.76.0@user/channel", Scope::Runtime));
        let b = Manifest::new(ManifestFormat::ConanLock)
            .with_requirement(req("boost/1.76.0@user/channel#rev1", Scope::Runtime))
            .with_requirement(req("zlib/1.2.11", Scope::Runtime));

        assert!(a.same_declarations(&b));
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = a.clone().with_requirement(req("fmt/10.0.0", Scope::Runtime));
        assert!(!a.same_declarations(&c));
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut m = Manifest::new(ManifestFormat::ConanfileTxt)
            .with_requirement(req("zlib/1.2.11", Scope::Runtime))
            .with_requirement(req("fmt/9.0.0", Scope::Runtime));

        let old = m.upsert_requirement(req("zlib/1.3.1", Scope::Runtime));
        assert_eq!(old.unwrap().version(), "1.2.11");
        assert_eq!(m.requirements[0].version(), "1.3.1");

        // Same name in another scope is a separate declaration.
        assert!(m.upsert_requirement(req("zlib/1.3.1", Scope::Test)).is_none());
        assert_eq!(m.requirements.len(), 3);
    }

    #[test]
    fn test_remove_requirement_by_scope() {
        let mut m = Manifest::new(ManifestFormat::ConanfileTxt)
            .with_requirement(req("gtest/1.14.0", Scope::Runtime))
            .with_requirement(req("gtest/1.14.0", Scope::Test));

        let removed = m.remove_requirement("gtest", Some(Scope::Test));
        assert_eq!(removed.len(), 1);
        assert_eq!(m.requirements.len(), 1);
        assert_eq!(m.requirements[0].scope, Scope::Runtime);

        assert!(m.remove_requirement("missing", None).is_empty());
    }

    #[test]
    fn test_with_format_drops_descriptor_for_consumer_formats() {
        let m = Manifest::new(ManifestFormat::ConanfilePy)
            .with_package(PackageDescriptor::new("mypackage", "1.0.0"))
            .with_requirement(req("zlib/1.2.11", Scope::Runtime));

        let txt = m.with_format(ManifestFormat::ConanfileTxt);
        assert!(txt.package.is_none());
        assert_eq!(txt.format, ManifestFormat::ConanfileTxt);
        assert_eq!(txt.path, PathBuf::from("conanfile.txt"));
        assert_eq!(txt.requirements.len(), 1);
    }
}

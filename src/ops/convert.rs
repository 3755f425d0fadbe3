//! Implementation of `conanfest convert`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use thiserror::Error;

use crate::core::format::ManifestFormat;
use crate::core::manifest::Manifest;

/// Options for converting between Conan file formats.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Target format
    pub to: ManifestFormat,

    /// Output path; defaults to the target file name next to the input
    pub output: Option<PathBuf>,

    /// Sort requirements before writing
    pub sort: bool,

    /// Overwrite an existing output file
    pub force: bool,
}

/// Result of a conversion.
#[derive(Debug, Clone)]
pub struct Converted {
    pub output: PathBuf,
    pub manifest: Manifest,
    /// Whether the package descriptor had to be dropped
    pub dropped_package: bool,
}

/// Convert a manifest to another format.
///
/// Converting a recipe to `conanfile.txt` or `conan.lock` drops the package
/// name and version. Converting to a lockfile requires every requirement to
/// be pinned.
pub fn convert(input: &Path, opts: &ConvertOptions) -> Result<Converted> {
    let manifest = Manifest::load_strict(input)?;

    if opts.to == ManifestFormat::ConanLock {
        ensure_pinned(&manifest)?;
    }

    let output = opts.output.clone().unwrap_or_else(|| {
        input
            .parent()
            .unwrap_or(Path::new("."))
            .join(opts.to.file_name())
    });

    if output == input {
        bail!("refusing to convert {} onto itself", input.display());
    }
    if output.exists() && !opts.force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            output.display()
        );
    }

    let dropped_package = manifest.package.is_some() && !opts.to.has_package_descriptor();
    let mut converted = manifest.with_format(opts.to);
    if opts.sort {
        converted.sort_requirements();
    }
    converted.path = output.clone();
    converted.save(&output)?;

    tracing::debug!("converted {} to {}", input.display(), output.display());

    Ok(Converted {
        output,
        manifest: converted,
        dropped_package,
    })
}

/// Requirements a lockfile cannot record because they are version ranges.
#[derive(Debug, Error)]
#[error("cannot lock version ranges: {}; lockfiles hold exact versions", .ranges.join(", "))]
pub struct UnpinnedError {
    pub ranges: Vec<String>,
}

/// Fail if any requirement uses a version range.
pub fn ensure_pinned(manifest: &Manifest) -> Result<()> {
    let ranges: Vec<String> = manifest
        .requirements
        .iter()
        .filter(|r| r.reference.is_range())
        .map(|r| r.reference.to_string())
        .collect();

    if !ranges.is_empty() {
        return Err(UnpinnedError { ranges }.into());
    }
    Ok(())
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

    def build_requirements(self):
        self.tool_requires("cmake/3.21.0")
"#;

    fn opts(to: ManifestFormat) -> ConvertOptions {
        ConvertOptions {
            to,
            output: None,
            sort: false,
            force: false,
        }
    }

    #[test]
    fn test_recipe_to_text() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("conanfile.py");
        std::fs::write(&input, RECIPE).unwrap();

        let converted = convert(&input, &opts(ManifestFormat::ConanfileTxt)).unwrap();
        assert!(converted.dropped_package);
        assert_eq!(converted.output, tmp.path().join("conanfile.txt"));

        let content = std::fs::read_to_string(&converted.output).unwrap();
        assert_eq!(
            content,
            "[requires]\nzlib/1.2.11\nboost/1.76.0@user/channel\n\n[tool_requires]\ncmake/3.21.0\n"
        );
    }

    #[test]
    fn test_text_to_recipe_keeps_declarations() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("conanfile.txt");
        std::fs::write(&input, "[requires]\nzlib/1.2.11\n[test_requires]\ngtest/1.14.0\n").unwrap();

        let converted = convert(&input, &opts(ManifestFormat::ConanfilePy)).unwrap();
        assert!(!converted.dropped_package);

        let original = Manifest::load(&input).unwrap();
        let reloaded = Manifest::load(&converted.output).unwrap();
        assert!(original.same_declarations(&reloaded));
    }

    #[test]
    fn test_to_lock_rejects_ranges() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("conanfile.txt");
        std::fs::write(&input, "[requires]\nzlib/[>=1.2 <2]\nfmt/10.2.1\n").unwrap();

        let err = convert(&input, &opts(ManifestFormat::ConanLock)).unwrap_err();
        let unpinned = err.downcast_ref::<UnpinnedError>().unwrap();
        assert_eq!(unpinned.ranges, ["zlib/[>=1.2 <2]"]);
        assert!(err.to_string().contains("zlib/[>=1.2 <2]"));
        assert!(!tmp.path().join("conan.lock").exists());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("conanfile.py");
        std::fs::write(&input, RECIPE).unwrap();
        std::fs::write(tmp.path().join("conanfile.txt"), "[requires]\n").unwrap();

        let err = convert(&input, &opts(ManifestFormat::ConanfileTxt)).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let mut forced = opts(ManifestFormat::ConanfileTxt);
        forced.force = true;
        assert!(convert(&input, &forced).is_ok());
    }
}

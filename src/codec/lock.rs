//! `conan.lock` codec.
//!
//! Conan 2 lockfiles are JSON with one list of references per scope:
//!
//! ```json
//! {
//!     "version": "0.5",
//!     "requires": ["zlib/1.2.11#fca992...%1680620582.1"],
//!     "build_requires": ["cmake/3.21.0#7f6b1b...%1680620582.9"],
//!     "python_requires": [],
//!     "config_requires": []
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::codec::errors::CodecError;
use crate::core::format::ManifestFormat;
use crate::core::manifest::{ExtraSection, Manifest};
use crate::core::reference::Reference;
use crate::core::requirement::{Requirement, Scope};

/// Lockfile format version written by this crate.
pub const LOCKFILE_VERSION: &str = "0.5";

const CONFIG_REQUIRES: &str = "config_requires";

/// Lockfile representation for serialization.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawLock {
    #[serde(default = "default_version")]
    version: String,

    #[serde(default)]
    requires: Vec<String>,

    #[serde(default)]
    build_requires: Vec<String>,

    #[serde(default)]
    python_requires: Vec<String>,

    #[serde(default)]
    config_requires: Vec<String>,
}

fn default_version() -> String {
    LOCKFILE_VERSION.to_string()
}

/// Parse `conan.lock` content.
pub fn parse(content: &str, file: &str) -> Result<Manifest, CodecError> {
    let raw: RawLock = serde_json::from_str(content).map_err(|source| CodecError::Json {
        file: file.to_string(),
        source,
    })?;

    if raw.version != LOCKFILE_VERSION {
        tracing::debug!(
            "{} has lockfile version {}, expected {}",
            file,
            raw.version,
            LOCKFILE_VERSION
        );
    }

    let mut manifest = Manifest::new(ManifestFormat::ConanLock);

    let lists = [
        (Scope::Runtime, &raw.requires),
        (Scope::Build, &raw.build_requires),
        (Scope::Python, &raw.python_requires),
    ];
    for (scope, refs) in lists {
        for r in refs {
            let reference = Reference::parse(r).map_err(|reason| {
                let offset = content
                    .find(&format!("\"{}\"", r))
                    .map_or(0, |idx| idx + 1);
                CodecError::invalid_reference(file, content, r, offset, reason)
            })?;
            manifest
                .requirements
                .push(Requirement::new(reference, scope));
        }
    }

    if !raw.config_requires.is_empty() {
        manifest.extra_sections.push(ExtraSection {
            name: CONFIG_REQUIRES.to_string(),
            lines: raw.config_requires,
        });
    }

    Ok(manifest)
}

/// Render a manifest as `conan.lock`.
///
/// Entries are sorted in descending order, matching what Conan writes.
pub fn render(manifest: &Manifest) -> Result<String, CodecError> {
    let collect = |scopes: &[Scope]| -> Vec<String> {
        let mut refs: Vec<String> = manifest
            .requirements
            .iter()
            .filter(|r| scopes.contains(&r.scope))
            .map(|r| r.reference.to_string())
            .collect();
        refs.sort_by(|a, b| b.cmp(a));
        refs.dedup();
        refs
    };

    let config_requires = manifest
        .extra_sections
        .iter()
        .filter(|s| s.name == CONFIG_REQUIRES)
        .flat_map(|s| s.lines.iter().cloned())
        .collect();

    // Conan records test requirements alongside regular requires.
    let raw = RawLock {
        version: LOCKFILE_VERSION.to_string(),
        requires: collect(&[Scope::Runtime, Scope::Test]),
        build_requires: collect(&[Scope::Build]),
        python_requires: collect(&[Scope::Python]),
        config_requires,
    };

    let mut out = serde_json::to_string_pretty(&raw).map_err(|source| CodecError::Json {
        file: manifest.path.display().to_string(),
        source,
    })?;
    out.push('\n');
    Ok(out)
}

//! Implementation of `conanfest inspect`.
//!
//! Produces a flat, serializable report of what a Conan file declares.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::codec::CodecError;
use crate::core::format::{identify, Kind, ManifestFormat, ECOSYSTEM};
use crate::core::manifest::{Manifest, PackageDescriptor};
use crate::core::purl::purl;
use crate::core::requirement::{Requirement, Scope};
use crate::util::fs;
use crate::util::hash::sha256_str;

/// One declared dependency in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    pub scope: Scope,
    /// Declared by the user rather than recorded by a resolver
    pub direct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub purl: String,
}

impl DependencyReport {
    fn from_requirement(requirement: &Requirement, kind: Kind) -> Self {
        let reference = &requirement.reference;
        DependencyReport {
            name: reference.name().to_string(),
            version: reference.version().to_string(),
            qualifier: reference.qualifier().map(|q| q.to_string()),
            scope: requirement.scope,
            direct: kind == Kind::Manifest,
            revision: reference.revision().map(str::to_string),
            purl: purl(requirement, kind == Kind::Lockfile),
        }
    }
}

/// Everything `inspect` knows about one file.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub path: String,
    pub ecosystem: &'static str,
    pub kind: Kind,
    pub format: ManifestFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageDescriptor>,
    pub dependencies: Vec<DependencyReport>,
    /// Order-insensitive hash of the declarations
    pub fingerprint: String,
    /// SHA256 of the file content
    pub checksum: String,
}

impl Report {
    /// Build a report from an already parsed manifest and its raw content.
    pub fn new(manifest: &Manifest, content: &str) -> Self {
        let kind = manifest.kind();
        Report {
            path: manifest.path.display().to_string(),
            ecosystem: ECOSYSTEM,
            kind,
            format: manifest.format,
            package: manifest.package.clone(),
            dependencies: manifest
                .requirements
                .iter()
                .map(|r| DependencyReport::from_requirement(r, kind))
                .collect(),
            fingerprint: manifest.fingerprint(),
            checksum: sha256_str(content),
        }
    }

    /// Human-readable rendering.
    pub fn to_text(&self) -> String {
        let mut out = format!("{} ({}, {})\n", self.path, self.format, self.kind);

        if let Some(ref pkg) = self.package {
            out.push_str(&format!("package: {}/{}\n", pkg.name, pkg.version));
        }

        if self.dependencies.is_empty() {
            out.push_str("no dependencies\n");
        }
        for scope in Scope::ALL {
            let deps: Vec<_> = self.dependencies.iter().filter(|d| d.scope == scope).collect();
            if deps.is_empty() {
                continue;
            }
            out.push_str(&format!("{}:\n", scope.conan_name()));
            for dep in deps {
                out.push_str(&format!("  {} {}", dep.name, dep.version));
                if let Some(ref q) = dep.qualifier {
                    out.push_str(&format!(" @{}", q));
                }
                if let Some(ref rev) = dep.revision {
                    out.push_str(&format!(" #{}", rev));
                }
                out.push('\n');
            }
        }

        out.push_str(&format!("fingerprint: {}\n", self.fingerprint));
        out
    }
}

/// Load and report on a Conan file.
pub fn inspect(path: &Path) -> Result<Report> {
    let content = fs::read_to_string(path)?;
    let format = identify(path).ok_or_else(|| CodecError::UnknownFile {
        file: path.display().to_string(),
    })?;
    let manifest = Manifest::parse(&content, format, path)?;

    tracing::debug!("inspected {} ({})", path.display(), manifest.fingerprint());

    Ok(Report::new(&manifest, &content))
}

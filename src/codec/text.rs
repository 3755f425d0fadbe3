//! `conanfile.txt` codec.
//!
//! The file is a list of bracketed sections. Requirement sections
//! (`[requires]`, `[tool_requires]`, `[build_requires]`, `[test_requires]`)
//! hold one reference per line; every other section is kept verbatim.

use crate::codec::errors::CodecError;
use crate::codec::ParseMode;
use crate::core::format::ManifestFormat;
use crate::core::manifest::{ExtraSection, Manifest};
use crate::core::reference::Reference;
use crate::core::requirement::{Requirement, Scope};

/// Parse `conanfile.txt` content.
///
/// Lines that are not valid references are handled according to `mode`.
pub fn parse(content: &str, file: &str, mode: ParseMode) -> Result<Manifest, CodecError> {
    let mut manifest = Manifest::new(ManifestFormat::ConanfileTxt);

    let mut section: Option<String> = None;
    let mut offset = 0;

    for raw_line in content.split_inclusive('\n') {
        let line_start = offset;
        offset += raw_line.len();

        let line = raw_line.trim();
        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim();
            let key = name.to_lowercase();
            if requirement_scope(&key).is_none() {
                manifest.extra_sections.push(ExtraSection {
                    name: name.to_string(),
                    lines: Vec::new(),
                });
            }
            section = Some(key);
            continue;
        }

        let Some(ref current) = section else {
            continue;
        };

        match requirement_scope(current) {
            None => {
                if let Some(extra) = manifest.extra_sections.last_mut() {
                    extra.lines.push(raw_line.trim_end().to_string());
                }
            }
            Some(scope) => {
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let value = strip_trailing_comment(line);
                match Reference::parse(value) {
                    Ok(reference) => manifest
                        .requirements
                        .push(Requirement::new(reference, scope)),
                    Err(reason) => {
                        let column = raw_line.find(value).unwrap_or(0);
                        mode.reject(CodecError::invalid_reference(
                            file,
                            content,
                            value,
                            line_start + column,
                            reason,
                        ))?;
                    }
                }
            }
        }
    }

    for extra in &mut manifest.extra_sections {
        while extra.lines.last().is_some_and(|l| l.trim().is_empty()) {
            extra.lines.pop();
        }
    }

    Ok(manifest)
}

/// Render a manifest as `conanfile.txt`.
pub fn render(manifest: &Manifest) -> String {
    let mut out = String::new();

    for scope in [Scope::Runtime, Scope::Build, Scope::Test] {
        let refs: Vec<_> = manifest.requirements_in(scope).collect();
        if refs.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{}]\n", scope.conan_name()));
        for r in refs {
            out.push_str(&r.reference.to_string());
            out.push('\n');
        }
    }

    let python = manifest.requirements_in(Scope::Python).count();
    if python > 0 {
        tracing::warn!(
            "conanfile.txt cannot declare python_requires; dropping {} requirement(s)",
            python
        );
    }

    for extra in &manifest.extra_sections {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{}]\n", extra.name));
        for line in &extra.lines {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

/// The scope of a requirement section; `None` for passthrough sections.
fn requirement_scope(section: &str) -> Option<Scope> {
    Scope::from_conan_name(section).filter(|scope| *scope != Scope::Python)
}

// `#` also introduces a revision, so only whitespace-separated `#` counts.
fn strip_trailing_comment(line: &str) -> &str {
    match line.find(" #").or_else(|| line.find("\t#")) {
        Some(idx) => line[..idx].trim_end(),
        None => line,
    }
}

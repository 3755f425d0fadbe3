//! `conanfile.py` codec.
//!
//! Recipes are Python, but the parts that declare identity and requirements
//! follow a small set of idioms. They are read with regular expressions, so
//! no interpreter is needed:
//!
//! - class attributes `name = "..."` and `version = "..."`
//! - calls `self.requires(...)`, `self.build_requires(...)`,
//!   `self.tool_requires(...)`, `self.test_requires(...)`
//! - class attributes `requires`, `tool_requires`, `build_requires`,
//!   `test_requires`, `python_requires` holding a string, list or tuple
//!
//! References computed at runtime (f-strings, variables) are not visible.
//!
//! Edits are made in place on the source text so that the rest of the
//! recipe survives untouched.

use std::sync::LazyLock;

use regex::Regex;

use crate::codec::errors::CodecError;
use crate::codec::ParseMode;
use crate::core::format::ManifestFormat;
use crate::core::manifest::{Manifest, PackageDescriptor};
use crate::core::reference::Reference;
use crate::core::requirement::{Requirement, Scope};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^[ \t]*name[ \t]*=[ \t]*["']([^"']*)["']"#).unwrap());

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^[ \t]*version[ \t]*=[ \t]*["']([^"']*)["']"#).unwrap());

static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"self\.(requires|build_requires|tool_requires|test_requires)\s*\(\s*["']([^"']+)["']"#)
        .unwrap()
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*(requires|build_requires|tool_requires|test_requires|python_requires)[ \t]*=[ \t]*(\[[^\]]*\]|\([^)]*\)|"[^"]*"|'[^']*')"#,
    )
    .unwrap()
});

static STRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^class\s+\w+\s*\(.*ConanFile.*\)\s*:").unwrap());

/// Parse `conanfile.py` content.
///
/// Calls whose argument is not a plain reference (string concatenation,
/// f-strings) are handled according to `mode`.
pub fn parse(content: &str, file: &str, mode: ParseMode) -> Result<Manifest, CodecError> {
    let code = blank_comment_lines(content);
    let mut manifest = Manifest::new(ManifestFormat::ConanfilePy);

    let name = NAME_RE.captures(&code).map(|c| c[1].to_string());
    let version = VERSION_RE.captures(&code).map(|c| c[1].to_string());
    match (name, version) {
        (Some(name), Some(version)) => {
            manifest.package = Some(PackageDescriptor::new(name, version));
        }
        (Some(name), None) => {
            tracing::warn!("{}: recipe `{}` declares no version", file, name);
        }
        (None, Some(_)) => {
            tracing::warn!("{}: recipe declares a version but no name", file);
        }
        (None, None) => {}
    }

    // (offset, scope, reference text) collected from every idiom, then
    // ordered by position so requirements keep file order.
    let mut found: Vec<(usize, Scope, &str)> = Vec::new();

    for caps in CALL_RE.captures_iter(&code) {
        let (Some(method), Some(reference)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if let Some(scope) = Scope::from_conan_name(method.as_str()) {
            found.push((reference.start(), scope, reference.as_str()));
        }
    }

    for caps in ATTR_RE.captures_iter(&code) {
        let (Some(attr), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(scope) = Scope::from_conan_name(attr.as_str()) else {
            continue;
        };
        for item in STRING_RE.captures_iter(value.as_str()) {
            if let Some(reference) = item.get(1) {
                found.push((value.start() + reference.start(), scope, reference.as_str()));
            }
        }
    }

    found.sort_by_key(|(offset, _, _)| *offset);

    for (offset, scope, text) in found {
        match Reference::parse(text) {
            Ok(reference) => manifest
                .requirements
                .push(Requirement::new(reference, scope)),
            Err(reason) => mode.reject(CodecError::invalid_reference(
                file, content, text, offset, reason,
            ))?,
        }
    }

    Ok(manifest)
}

/// Render a manifest as a canonical `conanfile.py` recipe.
pub fn render(manifest: &Manifest) -> String {
    let mut out = String::from("from conan import ConanFile\n\n\n");
    out.push_str(&format!("class {}(ConanFile):\n", class_name(manifest)));

    let mut body: Vec<String> = Vec::new();

    if let Some(ref pkg) = manifest.package {
        body.push(format!("    name = {}", quote(&pkg.name)));
        body.push(format!("    version = {}", quote(&pkg.version)));
    }

    let python: Vec<String> = manifest
        .requirements_in(Scope::Python)
        .map(|r| quote(&r.reference.to_string()))
        .collect();
    match python.len() {
        0 => {}
        1 => body.push(format!("    python_requires = {}", python[0])),
        _ => body.push(format!("    python_requires = ({})", python.join(", "))),
    }

    let runtime: Vec<&Requirement> = manifest.requirements_in(Scope::Runtime).collect();
    if !runtime.is_empty() {
        if !body.is_empty() {
            body.push(String::new());
        }
        body.push("    def requirements(self):".to_string());
        for r in runtime {
            body.push(call_line("        ", r));
        }
    }

    let build: Vec<&Requirement> = manifest
        .requirements
        .iter()
        .filter(|r| matches!(r.scope, Scope::Build | Scope::Test))
        .collect();
    if !build.is_empty() {
        if !body.is_empty() {
            body.push(String::new());
        }
        body.push("    def build_requirements(self):".to_string());
        for r in build {
            body.push(call_line("        ", r));
        }
    }

    if body.is_empty() {
        body.push("    pass".to_string());
    }

    for line in body {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Insert a requirement call into the recipe source.
///
/// The call goes at the end of `requirements()` (runtime) or
/// `build_requirements()` (build and test). A missing method is appended
/// to the recipe class.
pub fn insert_requirement(
    content: &str,
    file: &str,
    requirement: &Requirement,
) -> Result<String, CodecError> {
    let method = match requirement.scope {
        Scope::Runtime => "requirements",
        Scope::Build | Scope::Test => "build_requirements",
        Scope::Python => {
            return Err(CodecError::Unsupported {
                format: ManifestFormat::ConanfilePy,
                operation: "adding python_requires in place".to_string(),
            })
        }
    };

    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let def_prefix = format!("def {}(", method);

    if let Some(def_idx) = lines.iter().position(|l| l.trim_start().starts_with(&def_prefix)) {
        let def_indent = indent_of(&lines[def_idx]);
        let end = block_end(&lines, def_idx, def_indent);
        let body_indent = lines[def_idx + 1..=end]
            .iter()
            .find(|l| !l.trim().is_empty())
            .map(|l| indent_of(l))
            .filter(|&i| i > def_indent)
            .unwrap_or(def_indent + 4);
        let new_line = call_line(&" ".repeat(body_indent), requirement);

        if end > def_idx && lines[end].trim() == "pass" {
            lines[end] = new_line;
        } else {
            lines.insert(end + 1, new_line);
        }
    } else {
        let class_idx = lines
            .iter()
            .position(|l| CLASS_RE.is_match(l.trim_start()))
            .ok_or_else(|| CodecError::NoRecipeClass {
                file: file.to_string(),
            })?;
        let class_indent = indent_of(&lines[class_idx]);
        let end = block_end(&lines, class_idx, class_indent);
        let method_indent = " ".repeat(class_indent + 4);
        let body_indent = " ".repeat(class_indent + 8);

        let mut insert = vec![
            String::new(),
            format!("{}def {}(self):", method_indent, method),
            call_line(&body_indent, requirement),
        ];
        if end > class_idx && lines[end].trim() == "pass" {
            lines.remove(end);
            insert.remove(0);
            lines.splice(end..end, insert);
        } else {
            lines.splice(end + 1..end + 1, insert);
        }
    }

    Ok(join_lines(&lines, content))
}

/// Remove every requirement call for `name` (optionally in one scope).
///
/// Returns the new source and the references that were removed. Methods
/// left empty get a `pass` body. Class attribute lists are not edited.
pub fn remove_requirement(content: &str, name: &str, scope: Option<Scope>) -> (String, Vec<Reference>) {
    let mut removed = Vec::new();
    let mut lines: Vec<String> = Vec::new();

    for line in content.lines() {
        let matched = CALL_RE.captures(line).and_then(|caps| {
            let call_scope = Scope::from_conan_name(&caps[1])?;
            let reference = Reference::parse(&caps[2]).ok()?;
            let wanted = reference.name() == name && scope.map_or(true, |s| s == call_scope);
            wanted.then_some(reference)
        });

        match matched {
            Some(reference) if !line.trim_start().starts_with('#') => removed.push(reference),
            _ => lines.push(line.to_string()),
        }
    }

    if !removed.is_empty() {
        fill_empty_methods(&mut lines);
    }

    (join_lines(&lines, content), removed)
}

fn call_line(indent: &str, requirement: &Requirement) -> String {
    let call = match requirement.scope {
        Scope::Runtime => "requires",
        Scope::Build => "tool_requires",
        Scope::Test => "test_requires",
        Scope::Python => "python_requires",
    };
    format!(
        "{}self.{}({})",
        indent,
        call,
        quote(&requirement.reference.to_string())
    )
}

fn class_name(manifest: &Manifest) -> String {
    let Some(ref pkg) = manifest.package else {
        return "ConsumerConan".to_string();
    };
    let mut name: String = pkg
        .name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "Pkg");
    }
    name.push_str("Conan");
    name
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Replace comment-only lines with blanks, keeping byte offsets stable.
fn blank_comment_lines(content: &str) -> String {
    content
        .split_inclusive('\n')
        .map(|line| {
            if line.trim_start().starts_with('#') {
                let body = line.trim_end_matches('\n');
                let mut blank = " ".repeat(body.len());
                if line.ends_with('\n') {
                    blank.push('\n');
                }
                blank
            } else {
                line.to_string()
            }
        })
        .collect()
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Index of the last non-blank line belonging to the block opened at `start`.
fn block_end(lines: &[String], start: usize, indent: usize) -> usize {
    let mut end = start;
    for (idx, line) in lines.iter().enumerate().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) <= indent {
            break;
        }
        end = idx;
    }
    end
}

fn fill_empty_methods(lines: &mut Vec<String>) {
    let mut idx = 0;
    while idx < lines.len() {
        let line = &lines[idx];
        if line.trim_start().starts_with("def ") && line.trim_end().ends_with(':') {
            let indent = indent_of(line);
            if block_end(lines, idx, indent) == idx {
                lines.insert(idx + 1, format!("{}pass", " ".repeat(indent + 4)));
            }
        }
        idx += 1;
    }
}

fn join_lines(lines: &[String], original: &str) -> String {
    let mut out = lines.join("\n");
    if original.ends_with('\n') || original.is_empty() {
        out.push('\n');
    }
    out
}

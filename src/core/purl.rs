//! Package URLs for Conan requirements.
//!
//! Follows the `conan` purl type: `pkg:conan/<name>@<version>?<qualifiers>`,
//! where `user`, `channel` and `rrev` (recipe revision) are qualifiers.

use url::form_urlencoded;

use crate::core::format::ECOSYSTEM;
use crate::core::requirement::Requirement;

/// Build the package URL for a requirement.
///
/// Manifests declare constraints rather than resolutions, so callers pass
/// `include_version = false` for manifest entries and `true` for lockfile
/// entries.
pub fn purl(requirement: &Requirement, include_version: bool) -> String {
    let reference = &requirement.reference;
    let mut out = format!("pkg:{}/{}", ECOSYSTEM, encode(reference.name()));

    if include_version {
        out.push('@');
        out.push_str(&encode(reference.version()));
    }

    // Qualifier keys must be sorted lexicographically.
    let mut qualifiers: Vec<(&str, &str)> = Vec::new();
    if let Some(q) = reference.qualifier() {
        if let Some(ref channel) = q.channel {
            qualifiers.push(("channel", channel.as_str()));
        }
        qualifiers.push(("user", q.user.as_str()));
    }
    if include_version {
        if let Some(rrev) = reference.revision_hash() {
            qualifiers.push(("rrev", rrev));
        }
    }
    qualifiers.sort_by_key(|(key, _)| *key);

    if !qualifiers.is_empty() {
        out.push('?');
        let pairs: Vec<String> = qualifiers
            .iter()
            .map(|(key, value)| format!("{}={}", key, encode(value)))
            .collect();
        out.push_str(&pairs.join("&"));
    }

    out
}

fn encode(s: &str) -> String {
    // form encoding turns spaces into `+`; purl wants `%20`. A literal `+`
    // is already escaped as `%2B`, so the replacement is unambiguous.
    form_urlencoded::byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

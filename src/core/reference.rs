//! Conan package references.
//!
//! A reference names one package at one version, optionally scoped to a
//! `user/channel` pair and pinned to a recipe revision:
//!
//! ```text
//! name/version[@user[/channel]][#revision[%timestamp]]
//! ```
//!
//! Version ranges are written in brackets, e.g. `zlib/[>=1.2 <2]`.

use std::fmt;
use std::str::FromStr;

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error produced when a reference string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("empty package reference")]
    Empty,

    #[error("reference `{0}` is missing a version (expected `name/version`)")]
    MissingVersion(String),

    #[error("invalid package name `{0}`")]
    InvalidName(String),

    #[error("invalid version `{0}`")]
    InvalidVersion(String),

    #[error("invalid user/channel qualifier `{0}`")]
    InvalidQualifier(String),

    #[error("invalid recipe revision `{0}`")]
    InvalidRevision(String),
}

/// The `user/channel` part of a reference.
///
/// Conan 2 allows a user without a channel; Conan 1 always wrote both.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Qualifier {
    pub user: String,
    pub channel: Option<String>,
}

impl Qualifier {
    /// Parse `user` or `user/channel`.
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        let (user, channel) = match s.split_once('/') {
            Some((user, channel)) => (user, Some(channel)),
            None => (s, None),
        };

        if !is_valid_segment(user) || channel.is_some_and(|c| !is_valid_segment(c)) {
            return Err(ReferenceError::InvalidQualifier(s.to_string()));
        }

        Ok(Qualifier {
            user: user.to_string(),
            channel: channel.map(str::to_string),
        })
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.channel {
            Some(channel) => write!(f, "{}/{}", self.user, channel),
            None => write!(f, "{}", self.user),
        }
    }
}

/// A parsed Conan package reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference {
    name: String,
    version: String,
    qualifier: Option<Qualifier>,
    revision: Option<String>,
}

impl Reference {
    /// Parse a reference string.
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ReferenceError::Empty);
        }

        let (rest, revision) = match s.split_once('#') {
            Some((rest, rev)) => {
                if rev.is_empty() || rev.contains(|c: char| c.is_whitespace() || c == '#') {
                    return Err(ReferenceError::InvalidRevision(rev.to_string()));
                }
                (rest, Some(rev.to_string()))
            }
            None => (s, None),
        };

        // A trailing `@` (Conan 1 style `zlib/1.2.11@`) means "no qualifier".
        let (rest, qualifier) = match rest.split_once('@') {
            Some((rest, "")) => (rest, None),
            Some((rest, q)) => (rest, Some(Qualifier::parse(q)?)),
            None => (rest, None),
        };

        let (name, version) = rest
            .split_once('/')
            .ok_or_else(|| ReferenceError::MissingVersion(s.to_string()))?;

        if !is_valid_name(name) {
            return Err(ReferenceError::InvalidName(name.to_string()));
        }
        if !is_valid_version(version) {
            return Err(ReferenceError::InvalidVersion(version.to_string()));
        }

        Ok(Reference {
            name: name.to_string(),
            version: version.to_string(),
            qualifier,
            revision,
        })
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version specifier exactly as declared (may be a bracketed range).
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    /// Recipe revision, including any `%timestamp` suffix.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// Recipe revision with the `%timestamp` suffix stripped.
    pub fn revision_hash(&self) -> Option<&str> {
        self.revision
            .as_deref()
            .map(|rev| rev.split_once('%').map_or(rev, |(hash, _)| hash))
    }

    /// The same reference with the revision removed.
    pub fn without_revision(&self) -> Reference {
        Reference {
            revision: None,
            ..self.clone()
        }
    }

    /// Whether the version is a bracketed range like `[>=1.0 <2]`.
    pub fn is_range(&self) -> bool {
        self.version.starts_with('[')
    }

    /// Convert a bracketed Conan range into semver requirements.
    ///
    /// Each `||` alternative becomes one `VersionReq`. Conan range options
    /// after a comma (`include_prerelease`, ...) are dropped. Returns `None`
    /// for pinned versions or ranges semver cannot express.
    pub fn version_reqs(&self) -> Option<Vec<VersionReq>> {
        let inner = self.version.strip_prefix('[')?.strip_suffix(']')?;
        let expr = inner.split(',').next().unwrap_or_default();

        let mut reqs = Vec::new();
        for alternative in expr.split("||") {
            let clauses: Vec<String> = alternative
                .split_whitespace()
                .map(|clause| {
                    if clause.starts_with(|c: char| c.is_ascii_digit()) {
                        format!("={}", clause)
                    } else {
                        clause.to_string()
                    }
                })
                .collect();
            if clauses.is_empty() {
                reqs.push(VersionReq::STAR);
                continue;
            }
            reqs.push(VersionReq::parse(&clauses.join(", ")).ok()?);
        }
        Some(reqs)
    }

    /// Check whether a concrete version satisfies this reference's version.
    ///
    /// Pinned versions compare by string; ranges are evaluated with semver.
    /// Returns `None` when the answer cannot be determined (a range that
    /// semver cannot express, or a candidate that is not semver).
    pub fn accepts(&self, candidate: &str) -> Option<bool> {
        if !self.is_range() {
            return Some(self.version == candidate);
        }
        let reqs = self.version_reqs()?;
        let version = Version::parse(candidate).ok()?;
        Some(reqs.iter().any(|req| req.matches(&version)))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, "@{}", qualifier)?;
        }
        if let Some(revision) = &self.revision {
            write!(f, "#{}", revision)?;
        }
        Ok(())
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reference::parse(s)
    }
}

impl TryFrom<String> for Reference {
    type Error = ReferenceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Reference::parse(&s)
    }
}

impl From<Reference> for String {
    fn from(reference: Reference) -> Self {
        reference.to_string()
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
}

fn is_valid_version(version: &str) -> bool {
    if version.is_empty() {
        return false;
    }
    if let Some(inner) = version.strip_prefix('[') {
        return inner
            .strip_suffix(']')
            .is_some_and(|body| !body.trim().is_empty() && !body.contains(['[', ']']));
    }
    !version.contains(|c: char| c.is_whitespace() || matches!(c, '/' | '@' | '#' | '[' | ']'))
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.contains(|c: char| c.is_whitespace() || matches!(c, '/' | '@' | '#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_reference() {
        let r = Reference::parse("zlib/1.2.11").unwrap();
        assert_eq!(r.name(), "zlib");
        assert_eq!(r.version(), "1.2.11");
        assert!(r.qualifier().is_none());
        assert!(r.revision().is_none());
        assert_eq!(r.accepts("1.2.11"), Some(true));
    }

    #[test]
    fn test_parse_user_channel() {
        let r = Reference::parse("boost/1.76.0@user/channel").unwrap();
        assert_eq!(r.name(), "boost");
        assert_eq!(r.version(), "1.76.0");
        let q = r.qualifier().unwrap();
        assert_eq!(q.user, "user");
        assert_eq!(q.channel.as_deref(), Some("channel"));
        assert_eq!(r.to_string(), "boost/1.76.0@user/channel");
    }

    #[test]
    fn test_parse_user_without_channel() {
        let r = Reference::parse("fmt/10.2.1@acme").unwrap();
        assert_eq!(r.qualifier().unwrap().to_string(), "acme");
    }

    #[test]
    fn test_parse_trailing_at_means_no_qualifier() {
        let r = Reference::parse("zlib/1.2.11@").unwrap();
        assert!(r.qualifier().is_none());
        assert_eq!(r.to_string(), "zlib/1.2.11");
    }

    #[test]
    fn test_parse_revision_with_timestamp() {
        let r = Reference::parse("zlib/1.2.11#fca992a7e96a9c2ef9ab3b1ec7e9f2b7%1680620582.1").unwrap();
        assert_eq!(r.revision(), Some("fca992a7e96a9c2ef9ab3b1ec7e9f2b7%1680620582.1"));
        assert_eq!(r.revision_hash(), Some("fca992a7e96a9c2ef9ab3b1ec7e9f2b7"));
        assert_eq!(r.without_revision().to_string(), "zlib/1.2.11");
    }

    #[test]
    fn test_parse_range() {
        let r = Reference::parse("openssl/[>=1.1 <4]").unwrap();
        assert!(r.is_range());
        assert_eq!(r.accepts("3.2.1"), Some(true));
        assert_eq!(r.accepts("4.0.0"), Some(false));
        assert_eq!(r.accepts("not-semver"), None);
    }

    #[test]
    fn test_range_alternatives_and_options() {
        let r = Reference::parse("foo/[~1.2 || ^3.0, include_prerelease]").unwrap();
        assert_eq!(r.accepts("1.2.9"), Some(true));
        assert_eq!(r.accepts("3.4.0"), Some(true));
        assert_eq!(r.accepts("2.0.0"), Some(false));
    }

    #[test]
    fn test_pinned_accepts_by_string() {
        let r = Reference::parse("cmake/3.21").unwrap();
        assert_eq!(r.accepts("3.21"), Some(true));
        assert_eq!(r.accepts("3.21.0"), Some(false));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Reference::parse("  "), Err(ReferenceError::Empty));
        assert!(matches!(
            Reference::parse("zlib"),
            Err(ReferenceError::MissingVersion(_))
        ));
        assert!(matches!(
            Reference::parse("/1.0"),
            Err(ReferenceError::InvalidName(_))
        ));
        assert!(matches!(
            Reference::parse("zlib/"),
            Err(ReferenceError::InvalidVersion(_))
        ));
        assert!(matches!(
            Reference::parse("zlib/[>=1"),
            Err(ReferenceError::InvalidVersion(_))
        ));
        assert!(matches!(
            Reference::parse("zlib/1.0@/stable"),
            Err(ReferenceError::InvalidQualifier(_))
        ));
        assert!(matches!(
            Reference::parse("zlib/1.0#"),
            Err(ReferenceError::InvalidRevision(_))
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let r = Reference::parse("boost/1.76.0@user/channel").unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"boost/1.76.0@user/channel\"");
        let back: Reference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
        assert!(serde_json::from_str::<Reference>("\"nope\"").is_err());
    }
}

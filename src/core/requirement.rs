//! Scoped requirements.
//!
//! A Requirement is one declared dependency: a reference plus the scope
//! in which the consuming package needs it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::reference::{Qualifier, Reference};

/// When a requirement is needed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// `requires`: linked into or shipped with the package
    #[default]
    Runtime,
    /// `tool_requires` / `build_requires`: needed only while building
    Build,
    /// `test_requires`: needed only by the package's tests
    Test,
    /// `python_requires`: recipe code reused by the recipe itself
    Python,
}

impl Scope {
    /// All scopes in declaration order.
    pub const ALL: [Scope; 4] = [Scope::Runtime, Scope::Build, Scope::Test, Scope::Python];

    /// Map a Conan attribute, method or section name to a scope.
    pub fn from_conan_name(name: &str) -> Option<Scope> {
        match name {
            "requires" => Some(Scope::Runtime),
            "build_requires" | "tool_requires" => Some(Scope::Build),
            "test_requires" => Some(Scope::Test),
            "python_requires" => Some(Scope::Python),
            _ => None,
        }
    }

    /// The name Conan 2 uses for this scope.
    pub fn conan_name(&self) -> &'static str {
        match self {
            Scope::Runtime => "requires",
            Scope::Build => "tool_requires",
            Scope::Test => "test_requires",
            Scope::Python => "python_requires",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Runtime => "runtime",
            Scope::Build => "build",
            Scope::Test => "test",
            Scope::Python => "python",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "runtime" => Ok(Scope::Runtime),
            "build" => Ok(Scope::Build),
            "test" => Ok(Scope::Test),
            "python" => Ok(Scope::Python),
            other => Scope::from_conan_name(other).ok_or_else(|| {
                format!(
                    "invalid scope '{}'; expected 'runtime', 'build', 'test', or 'python'",
                    s
                )
            }),
        }
    }
}

/// A single declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    pub reference: Reference,
    #[serde(default)]
    pub scope: Scope,
}

/// The identity of a declaration, ignoring where in the file it appears.
///
/// Two manifests declare the same requirements when their key sets match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DeclarationKey {
    pub scope: Scope,
    pub name: String,
    pub version: String,
    pub qualifier: Option<String>,
}

impl Requirement {
    /// Create a requirement in the given scope.
    pub fn new(reference: Reference, scope: Scope) -> Self {
        Requirement { reference, scope }
    }

    /// Create a runtime requirement.
    pub fn runtime(reference: Reference) -> Self {
        Requirement::new(reference, Scope::Runtime)
    }

    pub fn name(&self) -> &str {
        self.reference.name()
    }

    pub fn version(&self) -> &str {
        self.reference.version()
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.reference.qualifier()
    }

    /// The `(scope, name, version, qualifier)` identity of this declaration.
    pub fn key(&self) -> DeclarationKey {
        DeclarationKey {
            scope: self.scope,
            name: self.name().to_string(),
            version: self.version().to_string(),
            qualifier: self.qualifier().map(|q| q.to_string()),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reference, self.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_conan_name() {
        assert_eq!(Scope::from_conan_name("requires"), Some(Scope::Runtime));
        assert_eq!(Scope::from_conan_name("build_requires"), Some(Scope::Build));
        assert_eq!(Scope::from_conan_name("tool_requires"), Some(Scope::Build));
        assert_eq!(Scope::from_conan_name("test_requires"), Some(Scope::Test));
        assert_eq!(Scope::from_conan_name("python_requires"), Some(Scope::Python));
        assert_eq!(Scope::from_conan_name("generators"), None);
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("build".parse::<Scope>().unwrap(), Scope::Build);
        assert_eq!("Test".parse::<Scope>().unwrap(), Scope::Test);
        assert_eq!("tool_requires".parse::<Scope>().unwrap(), Scope::Build);
        assert!("optional".parse::<Scope>().is_err());
    }

    #[test]
    fn test_key_ignores_revision() {
        let pinned = Requirement::runtime("zlib/1.2.11#abc".parse().unwrap());
        let plain = Requirement::runtime("zlib/1.2.11".parse().unwrap());
        assert_eq!(pinned.key(), plain.key());
    }

    #[test]
    fn test_key_includes_qualifier() {
        let r = Requirement::runtime("boost/1.76.0@user/channel".parse().unwrap());
        let key = r.key();
        assert_eq!(key.name, "boost");
        assert_eq!(key.version, "1.76.0");
        assert_eq!(key.qualifier.as_deref(), Some("user/channel"));
    }
}

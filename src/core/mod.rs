//! Core data structures for conanfest.
//!
//! This module contains the foundational types used throughout the crate:
//! - Conan references (`name/version@user/channel#rev`)
//! - Scoped requirements
//! - Manifests and the file formats they are stored in
//! - Package URLs for declared requirements

pub mod format;
pub mod manifest;
pub mod purl;
pub mod reference;
pub mod requirement;

pub use format::{identify, Kind, ManifestFormat, ECOSYSTEM};
pub use manifest::{ExtraSection, Manifest, PackageDescriptor};
pub use reference::{Qualifier, Reference, ReferenceError};
pub use requirement::{DeclarationKey, Requirement, Scope};

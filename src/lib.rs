//! conanfest - read, edit and convert Conan package manifests
//!
//! This crate provides the library behind the `conanfest` CLI: a typed model
//! of Conan references and manifests, codecs for `conanfile.py`,
//! `conanfile.txt` and `conan.lock`, and the operations built on top of them.

pub mod codec;
pub mod core;
pub mod ops;
pub mod util;

pub use core::{
    format::{Kind, ManifestFormat},
    manifest::{Manifest, PackageDescriptor},
    reference::{Qualifier, Reference},
    requirement::{Requirement, Scope},
};

pub use util::context::GlobalContext;

//! High-level operations.
//!
//! This module contains the implementation of conanfest commands.

pub mod conan_add;
pub mod conan_new;
pub mod convert;
pub mod inspect;
pub mod lockfile;
pub mod scan;

pub use conan_add::{
    add_requirement, remove_requirement, AddOptions, AddResult, Edit, RemoveOptions, RemoveResult,
};
pub use conan_new::{init_manifest, InitOptions};
pub use convert::{convert, ensure_pinned, ConvertOptions, Converted, UnpinnedError};
pub use inspect::{inspect, DependencyReport, Report};
pub use lockfile::{check_lockfile, write_lockfile, LockStatus, Mismatch};
pub use scan::{discover, scan, ScanEntry, ScanOptions, ScanOutcome, ScanSummary};

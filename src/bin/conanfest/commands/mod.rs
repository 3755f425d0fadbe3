//! Command implementations

use std::path::PathBuf;

use anyhow::Result;

use conanfest::util::GlobalContext;

pub mod add;
pub mod check;
pub mod completions;
pub mod config;
pub mod convert;
pub mod identify;
pub mod init;
pub mod inspect;
pub mod lock;
pub mod remove;
pub mod scan;

/// Use the manifest given on the command line, or discover one from cwd.
pub fn manifest_path(ctx: &GlobalContext, explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(ctx.find_manifest()?),
    }
}

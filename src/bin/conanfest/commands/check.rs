//! `conanfest check` command
//!
//! Exits non-zero when the lockfile does not satisfy the manifest.

use anyhow::{bail, Result};

use crate::cli::CheckArgs;
use crate::commands::manifest_path;
use crate::GlobalOptions;
use conanfest::ops::lockfile::check_lockfile;
use conanfest::util::diagnostic::{self, suggestions, Diagnostic};
use conanfest::util::{GlobalContext, Status};
use conanfest::Manifest;

pub fn execute(args: CheckArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;
    let manifest_path = manifest_path(&ctx, args.manifest)?;
    let lock_path = args
        .lockfile
        .unwrap_or_else(|| ctx.lockfile_for(&manifest_path));

    if !lock_path.exists() {
        bail!(
            "no lockfile at {}; run `conanfest lock` to create one",
            lock_path.display()
        );
    }

    shell.status(
        Status::Checking,
        format!("{} against {}", manifest_path.display(), lock_path.display()),
    );

    let manifest = Manifest::load(&manifest_path)?;
    let lock = Manifest::load(&lock_path)?;
    let status = check_lockfile(&manifest, &lock);

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "manifest": manifest_path.display().to_string(),
            "lockfile": lock_path.display().to_string(),
            "up_to_date": status.is_up_to_date(),
            "status": status,
        }));
    } else if status.is_up_to_date() {
        shell.status(
            Status::Finished,
            format!("{} is up to date", lock_path.display()),
        );
        if shell.is_verbose() {
            for unused in &status.unused {
                shell.note(format!("{} is locked but not declared", unused.reference));
            }
        }
    } else {
        let mut diag = Diagnostic::error("lockfile does not satisfy the manifest")
            .with_location(&lock_path)
            .with_suggestion(suggestions::STALE_LOCK);
        for missing in &status.missing {
            diag = diag.with_context(format!("{} ({}) is not locked", missing.reference, missing.scope));
        }
        for m in &status.mismatched {
            diag = diag.with_context(format!(
                "{} is declared but {} is locked",
                m.declared.reference, m.locked.reference
            ));
        }
        diagnostic::emit(&diag, shell.use_color());
    }

    if !status.is_up_to_date() {
        bail!(
            "{} missing, {} mismatched",
            status.missing.len(),
            status.mismatched.len()
        );
    }

    Ok(())
}

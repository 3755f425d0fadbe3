//! `conanfest lock` command

use anyhow::Result;

use crate::cli::LockArgs;
use crate::commands::manifest_path;
use crate::GlobalOptions;
use conanfest::ops::lockfile::write_lockfile;
use conanfest::util::{GlobalContext, Status};

pub fn execute(args: LockArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;
    let manifest = manifest_path(&ctx, args.manifest)?;
    let output = args.output.unwrap_or_else(|| ctx.lockfile_for(&manifest));

    let lock = write_lockfile(&manifest, &output)?;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "manifest": manifest.display().to_string(),
            "lockfile": output.display().to_string(),
            "entries": lock.requirements.len(),
            "fingerprint": lock.fingerprint(),
        }));
    } else {
        shell.status(
            Status::Locked,
            format!(
                "{} entr{} in {}",
                lock.requirements.len(),
                if lock.requirements.len() == 1 { "y" } else { "ies" },
                output.display()
            ),
        );
    }

    Ok(())
}

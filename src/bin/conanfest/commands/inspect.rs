//! `conanfest inspect` command

use anyhow::Result;

use crate::cli::InspectArgs;
use crate::commands::manifest_path;
use crate::GlobalOptions;
use conanfest::ops::inspect;
use conanfest::util::GlobalContext;

pub fn execute(args: InspectArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;
    let path = manifest_path(&ctx, args.path)?;

    let report = inspect(&path)?;

    if shell.is_json() {
        shell.json_event(&serde_json::to_value(&report)?);
    } else {
        shell.print(report.to_text().trim_end());
    }

    Ok(())
}

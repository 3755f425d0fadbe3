//! `conanfest remove` command

use anyhow::Result;

use crate::cli::RemoveArgs;
use crate::commands::manifest_path;
use crate::GlobalOptions;
use conanfest::ops::conan_add::{remove_requirement, RemoveOptions, RemoveResult};
use conanfest::util::{GlobalContext, Status};

pub fn execute(args: RemoveArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;
    let path = manifest_path(&ctx, args.manifest)?;

    let opts = RemoveOptions {
        name: args.name.clone(),
        scope: args.scope,
        dry_run: args.dry_run,
    };

    let edit = remove_requirement(&path, &opts)?;

    if shell.is_json() {
        let removed: Vec<String> = match &edit.result {
            RemoveResult::Removed(reqs) => reqs.iter().map(|r| r.reference.to_string()).collect(),
            RemoveResult::NotFound => Vec::new(),
        };
        shell.json_event(&serde_json::json!({
            "action": if removed.is_empty() { "not-found" } else { "removed" },
            "name": args.name,
            "removed": removed,
            "manifest": path.display().to_string(),
            "written": edit.written,
        }));
        return Ok(());
    }

    match edit.result {
        RemoveResult::Removed(reqs) => {
            for r in reqs {
                if args.dry_run {
                    shell.status(Status::Info, format!("would remove {} ({})", r.reference, r.scope));
                } else {
                    shell.status(Status::Removed, format!("{} ({})", r.reference, r.scope));
                }
            }
            if args.dry_run {
                shell.print(edit.content.trim_end());
            }
        }
        RemoveResult::NotFound => {
            shell.warn(format!(
                "requirement `{}` not found in {}",
                args.name,
                path.display()
            ));
        }
    }

    Ok(())
}

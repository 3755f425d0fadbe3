//! `conanfest add` command

use anyhow::{Context, Result};

use crate::cli::AddArgs;
use crate::commands::manifest_path;
use crate::GlobalOptions;
use conanfest::ops::conan_add::{add_requirement, AddOptions, AddResult};
use conanfest::util::{GlobalContext, Status};
use conanfest::Reference;

pub fn execute(args: AddArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;
    let path = manifest_path(&ctx, args.manifest.clone())?;

    let reference = Reference::parse(&args.reference)
        .with_context(|| format!("invalid reference `{}`", args.reference))?;
    let opts = AddOptions {
        reference,
        scope: args.scope(),
        dry_run: args.dry_run,
        sort: ctx.config().sort(),
    };

    let edit = add_requirement(&path, &opts)?;

    if shell.is_json() {
        let (action, requirement, previous) = match &edit.result {
            AddResult::Added(r) => ("added", r, None),
            AddResult::Updated { old, new } => ("updated", new, Some(old.reference.to_string())),
            AddResult::Unchanged(r) => ("unchanged", r, None),
        };
        shell.json_event(&serde_json::json!({
            "action": action,
            "reference": requirement.reference.to_string(),
            "scope": requirement.scope,
            "previous": previous,
            "manifest": path.display().to_string(),
            "written": edit.written,
        }));
        return Ok(());
    }

    let file = path.display();
    match edit.result {
        AddResult::Added(r) if args.dry_run => shell.status(
            Status::Info,
            format!("would add {} ({}) to {}", r.reference, r.scope, file),
        ),
        AddResult::Added(r) => shell.status(
            Status::Added,
            format!("{} ({}) to {}", r.reference, r.scope, file),
        ),
        AddResult::Updated { old, new } if args.dry_run => shell.status(
            Status::Info,
            format!("would update {} -> {} in {}", old.reference, new.reference, file),
        ),
        AddResult::Updated { old, new } => shell.status(
            Status::Updated,
            format!("{} -> {} in {}", old.reference, new.reference, file),
        ),
        AddResult::Unchanged(r) => shell.status(
            Status::Skipped,
            format!("{} (already declared in {})", r.reference, file),
        ),
    }

    if args.dry_run {
        shell.print(edit.content.trim_end());
    }

    Ok(())
}

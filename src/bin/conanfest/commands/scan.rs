//! `conanfest scan` command

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::cli::ScanArgs;
use crate::GlobalOptions;
use conanfest::ops::scan::{discover, scan, ScanOptions, ScanOutcome};
use conanfest::util::{GlobalContext, Status};

pub fn execute(args: ScanArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;
    let root = args.dir.unwrap_or_else(|| PathBuf::from("."));

    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let mut exclude = ctx.config().scan_exclude().to_vec();
    exclude.extend(args.exclude);
    let opts = ScanOptions {
        exclude,
        follow_links: args.follow_links || ctx.config().follow_links(),
    };

    let span = shell.span(Status::Scanning, root.display());
    let files = discover(&root, &opts)?;
    let progress = shell.progress(files.len() as u64, "parsing");
    let entries = scan(&root, &files, |path| progress.tick(path.display()));
    progress.finish();

    let failed = entries.iter().filter(|e| !e.is_ok()).count();

    if shell.is_json() {
        for entry in &entries {
            shell.json_event(&serde_json::to_value(entry)?);
        }
        return Ok(());
    }

    for entry in &entries {
        match &entry.outcome {
            ScanOutcome::Parsed(summary) => {
                let mut line = format!(
                    "{} [{}] {} requirement(s)",
                    entry.path.display(),
                    entry.format,
                    summary.requirements
                );
                if let Some(ref pkg) = summary.package {
                    line.push_str(&format!(", package {}", pkg));
                }
                shell.print(line);
            }
            ScanOutcome::Failed { error } => {
                shell.warn(format!("{}: {}", entry.path.display(), error));
            }
        }
    }

    span.finish_with_message(format!(
        "{} file(s), {} failed",
        entries.len(),
        failed
    ));

    Ok(())
}

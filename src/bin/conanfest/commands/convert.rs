//! `conanfest convert` command

use anyhow::Result;

use crate::cli::ConvertArgs;
use crate::GlobalOptions;
use conanfest::ops::convert::{convert, ConvertOptions};
use conanfest::util::{GlobalContext, Status};

pub fn execute(args: ConvertArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;

    let opts = ConvertOptions {
        to: args.to,
        output: args.output,
        sort: ctx.config().sort(),
        force: args.force,
    };

    let converted = convert(&args.input, &opts)?;

    if converted.dropped_package {
        shell.warn(format!(
            "{} cannot hold a package name and version; they were dropped",
            args.to
        ));
    }

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "input": args.input.display().to_string(),
            "output": converted.output.display().to_string(),
            "format": args.to,
            "requirements": converted.manifest.requirements.len(),
            "dropped_package": converted.dropped_package,
        }));
    } else {
        shell.status(
            Status::Converted,
            format!(
                "{} -> {} ({} requirement(s))",
                args.input.display(),
                converted.output.display(),
                converted.manifest.requirements.len()
            ),
        );
    }

    Ok(())
}

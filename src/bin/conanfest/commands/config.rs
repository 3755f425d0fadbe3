//! `conanfest config` command
//!
//! Without `--set`, prints the merged configuration as TOML.

use anyhow::{Context, Result};

use crate::cli::ConfigArgs;
use crate::GlobalOptions;
use conanfest::util::config::{global_config_path, set_value};
use conanfest::util::{GlobalContext, Status};

pub fn execute(args: ConfigArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;

    let Some(assignment) = args.set else {
        if shell.is_json() {
            shell.json_event(&serde_json::to_value(ctx.config())?);
        } else {
            let rendered = toml::to_string_pretty(ctx.config())
                .context("failed to render configuration")?;
            shell.print(rendered.trim_end());
        }
        return Ok(());
    };

    let (key, value) = assignment
        .split_once('=')
        .with_context(|| format!("expected KEY=VALUE, got `{}`", assignment))?;

    let path = if args.global {
        global_config_path().context("could not determine the home directory")?
    } else {
        ctx.project_config_path()
    };

    set_value(&path, key.trim(), value.trim())?;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "key": key.trim(),
            "value": value.trim(),
            "file": path.display().to_string(),
        }));
    } else {
        shell.status(
            Status::Updated,
            format!("{} = {} in {}", key.trim(), value.trim(), path.display()),
        );
    }

    Ok(())
}

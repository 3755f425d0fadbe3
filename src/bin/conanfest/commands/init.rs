//! `conanfest init` command

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::InitArgs;
use crate::GlobalOptions;
use conanfest::core::format::ManifestFormat;
use conanfest::ops::conan_new::{init_manifest, InitOptions};
use conanfest::util::{GlobalContext, Status};
use conanfest::Reference;

pub fn execute(args: InitArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));

    let format = args
        .format
        .or_else(|| ctx.config().manifest_format())
        .unwrap_or(ManifestFormat::ConanfilePy);

    let requires = args
        .requires
        .iter()
        .map(|r| Reference::parse(r).with_context(|| format!("invalid reference `{}`", r)))
        .collect::<Result<Vec<_>>>()?;

    let opts = InitOptions {
        format,
        name: args.name,
        version: args.version,
        requires,
    };

    let path = init_manifest(&dir, &opts)?;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "created": path.display().to_string(),
            "format": format,
        }));
    } else {
        shell.status(Status::Created, path.display());
    }

    Ok(())
}

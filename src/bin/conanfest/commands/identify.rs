//! `conanfest identify` command
//!
//! Classifies files by name only; nothing is read.

use anyhow::{bail, Result};

use crate::cli::IdentifyArgs;
use crate::GlobalOptions;
use conanfest::core::format::{identify, ECOSYSTEM};

pub fn execute(args: IdentifyArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let mut unknown = 0;

    for file in &args.files {
        match identify(file) {
            Some(format) => {
                if shell.is_json() {
                    shell.json_event(&serde_json::json!({
                        "path": file.display().to_string(),
                        "ecosystem": ECOSYSTEM,
                        "format": format,
                        "kind": format.kind(),
                    }));
                } else {
                    shell.print(format!("{}: {} ({})", file.display(), format, format.kind()));
                }
            }
            None => {
                unknown += 1;
                if shell.is_json() {
                    shell.json_event(&serde_json::json!({
                        "path": file.display().to_string(),
                        "format": null,
                    }));
                } else {
                    shell.print(format!("{}: not a Conan file", file.display()));
                }
            }
        }
    }

    if unknown == args.files.len() {
        bail!("none of the given files is a Conan file");
    }
    Ok(())
}

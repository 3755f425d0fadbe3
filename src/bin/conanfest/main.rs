//! conanfest CLI - read, edit and convert Conan manifests

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use conanfest::codec::CodecError;
use conanfest::ops::convert::UnpinnedError;
use conanfest::util::context::DiscoveryError;
use conanfest::util::diagnostic::{self, suggestions, Diagnostic};
use conanfest::util::Shell;

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Arc<Shell>,
}

fn main() {
    let cli = Cli::parse();
    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, cli.color, cli.json));

    init_logging(cli.verbose, cli.quiet);

    let global_opts = GlobalOptions {
        shell: Arc::clone(&shell),
    };

    if let Err(e) = run(cli.command, &global_opts) {
        report(&shell, &e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "conanfest=debug"
    } else if quiet {
        "conanfest=error"
    } else {
        "conanfest=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(command: Commands, global_opts: &GlobalOptions) -> Result<()> {
    match command {
        Commands::Inspect(args) => commands::inspect::execute(args, global_opts),
        Commands::Identify(args) => commands::identify::execute(args, global_opts),
        Commands::Add(args) => commands::add::execute(args, global_opts),
        Commands::Remove(args) => commands::remove::execute(args, global_opts),
        Commands::Convert(args) => commands::convert::execute(args, global_opts),
        Commands::Lock(args) => commands::lock::execute(args, global_opts),
        Commands::Check(args) => commands::check::execute(args, global_opts),
        Commands::Scan(args) => commands::scan::execute(args, global_opts),
        Commands::Init(args) => commands::init::execute(args, global_opts),
        Commands::Config(args) => commands::config::execute(args, global_opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error, using the richest rendering available for it.
fn report(shell: &Shell, err: &anyhow::Error) {
    if shell.is_json() {
        shell.error(format!("{:#}", err));
        return;
    }

    let color = shell.use_color();

    if let Some(codec) = err.chain().find_map(|e| e.downcast_ref::<CodecError>()) {
        if matches!(codec, CodecError::InvalidReference { .. }) {
            eprint!("{}", diagnostic::render_report(codec, color));
            return;
        }
    }

    if let Some(discovery) = err.chain().find_map(|e| e.downcast_ref::<DiscoveryError>()) {
        let suggestion = match discovery {
            DiscoveryError::NotFound { .. } => suggestions::NO_MANIFEST,
            DiscoveryError::Ambiguous { .. } => suggestions::AMBIGUOUS_MANIFEST,
        };
        diagnostic::emit(
            &Diagnostic::error(discovery.to_string()).with_suggestion(suggestion),
            color,
        );
        return;
    }

    if let Some(unpinned) = err.chain().find_map(|e| e.downcast_ref::<UnpinnedError>()) {
        diagnostic::emit(
            &Diagnostic::error(unpinned.to_string()).with_suggestion(suggestions::RANGE_IN_LOCK),
            color,
        );
        return;
    }

    diagnostic::emit(&Diagnostic::error(format!("{:#}", err)), color);
}

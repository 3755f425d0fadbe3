//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use conanfest::util::shell::ColorChoice;
use conanfest::{ManifestFormat, Scope};

/// conanfest - read, edit and convert Conan manifests and lockfiles
#[derive(Parser)]
#[command(name = "conanfest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, env = "CONANFEST_COLOR", default_value = "auto", value_parser = parse_color)]
    pub color: ColorChoice,

    /// Emit machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

fn parse_color(s: &str) -> Result<ColorChoice, String> {
    s.parse()
}

fn parse_format(s: &str) -> Result<ManifestFormat, String> {
    s.parse()
}

fn parse_scope(s: &str) -> Result<Scope, String> {
    s.parse()
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the package and requirements a Conan file declares
    Inspect(InspectArgs),

    /// Report which Conan format each file is
    Identify(IdentifyArgs),

    /// Add or update a requirement
    Add(AddArgs),

    /// Remove a requirement
    Remove(RemoveArgs),

    /// Convert between conanfile.py, conanfile.txt and conan.lock
    Convert(ConvertArgs),

    /// Write conan.lock from the manifest's pinned requirements
    Lock(LockArgs),

    /// Check that the lockfile satisfies the manifest
    Check(CheckArgs),

    /// Find and parse every Conan file under a directory
    Scan(ScanArgs),

    /// Create a new conanfile
    Init(InitArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    /// File to inspect (defaults to the manifest found from the current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct IdentifyArgs {
    /// Files to identify
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("scope").args(["build", "test", "python"])))]
pub struct AddArgs {
    /// Reference to add, e.g. `zlib/1.2.11` or `boost/1.76.0@user/channel`
    pub reference: String,

    /// Add as a tool requirement
    #[arg(long)]
    pub build: bool,

    /// Add as a test requirement
    #[arg(long)]
    pub test: bool,

    /// Add as a python_requires
    #[arg(long)]
    pub python: bool,

    /// Print the result instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Manifest to edit
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

impl AddArgs {
    pub fn scope(&self) -> Scope {
        if self.build {
            Scope::Build
        } else if self.test {
            Scope::Test
        } else if self.python {
            Scope::Python
        } else {
            Scope::Runtime
        }
    }
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Package name to remove
    pub name: String,

    /// Only remove from this scope (runtime, build, test, python)
    #[arg(long, value_parser = parse_scope)]
    pub scope: Option<Scope>,

    /// Print the result instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Manifest to edit
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// File to convert
    pub input: PathBuf,

    /// Target format: py, txt or lock
    #[arg(long, value_parser = parse_format)]
    pub to: ManifestFormat,

    /// Output path (defaults to the target file name next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing output file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct LockArgs {
    /// Lockfile to write (defaults to `lock.path` or conan.lock)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Manifest to lock
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Lockfile to check against (defaults to `lock.path` or conan.lock)
    #[arg(long)]
    pub lockfile: Option<PathBuf>,

    /// Manifest to check
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

#[derive(Args)]
pub struct ScanArgs {
    /// Directory to scan (defaults to the current directory)
    pub dir: Option<PathBuf>,

    /// Glob to skip, relative to the scan root (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Follow symbolic links
    #[arg(long)]
    pub follow_links: bool,
}

#[derive(Args)]
pub struct InitArgs {
    /// Directory to create the manifest in (defaults to current directory)
    pub dir: Option<PathBuf>,

    /// Package name (defaults to directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Package version
    #[arg(long, default_value = "0.1.0")]
    pub version: String,

    /// Manifest format: py or txt (defaults to `manifest.format` or py)
    #[arg(long, value_parser = parse_format)]
    pub format: Option<ManifestFormat>,

    /// Initial requirement (repeatable)
    #[arg(long = "requires")]
    pub requires: Vec<String>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Set a value, e.g. `--set manifest.format=txt`
    #[arg(long, value_name = "KEY=VALUE")]
    pub set: Option<String>,

    /// Edit the global config instead of the project config
    #[arg(long)]
    pub global: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: CompletionShell,
}

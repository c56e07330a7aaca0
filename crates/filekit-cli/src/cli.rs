use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set proxy for binary downloads
    #[arg(required = false, long, short = 'P', global = true)]
    pub proxy: Option<String>,

    /// Set user agent for binary downloads
    #[arg(required = false, long, short = 'A', global = true)]
    pub user_agent: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect the type of one or more files
    #[command(arg_required_else_help = true)]
    Detect {
        /// Files to inspect
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        paths: Vec<PathBuf>,

        /// Report mime type and charset instead of the description
        #[arg(required = false, short, long)]
        mime: bool,

        /// Preferred separator between path and type
        #[arg(required = false, short, long)]
        separator: Option<char>,

        /// Path to the file binary
        #[arg(required = false, short, long, value_hint = ValueHint::ExecutablePath)]
        bin: Option<PathBuf>,
    },

    /// Print the version of the file binary
    Version {
        /// Path to the file binary
        #[arg(required = false, short, long, value_hint = ValueHint::ExecutablePath)]
        bin: Option<PathBuf>,
    },

    /// Download and unpack the win32 file binaries
    Provision,

    /// Generate default config
    #[clap(name = "defconfig")]
    DefConfig,
}

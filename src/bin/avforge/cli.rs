//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use avforge::core::catalog::Profile;

/// Build FFmpeg and its codec libraries from verified source archives
#[derive(Parser)]
#[command(name = "avforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Install prefix for the shipped libraries
    pub destination: PathBuf,

    /// Build the community release, including GPL codecs
    #[arg(long)]
    pub community: bool,

    /// Package profile to build
    #[arg(long, default_value_t = Profile::Full)]
    pub profile: Profile,

    /// Print the build schedule as JSON and exit
    #[arg(long)]
    pub plan: bool,

    /// Config file (defaults to avforge.toml in the current directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

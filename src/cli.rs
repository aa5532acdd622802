use clap::{Args, Parser, Subcommand};
use ffscribe::job::parse_flag_assignment;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ffscribe")]
#[command(author, version, about = "Probe media files and run profile-based ffmpeg transcodes")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe a media file and display its metadata
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Transcode a file with ffmpeg
    Transcode(JobArgs),

    /// Print the ffmpeg command a transcode would run
    Render(JobArgs),

    /// List built-in and configured encode profiles
    Profiles {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that ffmpeg and ffprobe are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct JobArgs {
    /// Input media file
    pub input: PathBuf,

    /// Output file
    pub output: PathBuf,

    /// Encode profile to apply
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Set or override a flag, e.g. --set -b:v=800k
    #[arg(
        long = "set",
        value_name = "FLAG=VALUE",
        allow_hyphen_values = true,
        value_parser = parse_flag_assignment
    )]
    pub overrides: Vec<(String, String)>,
}

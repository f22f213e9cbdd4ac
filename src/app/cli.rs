//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tascript - Frame-scripted input playback
#[derive(Parser, Debug)]
#[command(name = "tascript")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a script against the logging sink
    Run {
        /// Script file to play
        file: PathBuf,

        /// Frame period in milliseconds (overrides config)
        #[arg(short, long)]
        period_ms: Option<u64>,

        /// Apply frames back to back with no pacing
        #[arg(short, long)]
        quick: bool,

        /// Compile each frame against its predecessor during playback
        /// instead of pre-compiling the whole sequence
        #[arg(short, long)]
        raw: bool,
    },

    /// Count the frames a script expands to
    Count {
        /// Script file to count
        file: PathBuf,

        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse and compile a script without playing it
    Check {
        /// Script file to check
        file: PathBuf,

        /// Emit the compiled frames as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print each line of a script with its cumulative frame index
    Annotate {
        /// Script file to annotate
        file: PathBuf,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

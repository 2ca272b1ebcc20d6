//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "topspin")]
#[command(about = "AI tennis coaching from match videos")]
#[command(version)]
pub struct Cli {
    /// Print debug details about uploads and polling
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a tennis video and print the coach's report
    Analyze(AnalyzeArgs),

    /// List models available to your API key
    Models {
        /// Include models that cannot generate content
        #[arg(long)]
        all: bool,
    },

    /// Show or update stored configuration
    Config(ConfigArgs),

    /// Interactive first-run configuration
    Setup,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Video file to analyze, or '-' to read MP4 data from stdin
    pub video: String,

    /// Model to use, e.g. "gemini-1.5-pro" (default: auto-select)
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Custom coaching instructions
    #[arg(long, short = 'p', conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Read coaching instructions from a file
    #[arg(long, value_name = "FILE")]
    pub prompt_file: Option<PathBuf>,

    /// Seconds between readiness polls
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Seconds to wait for remote processing before giving up
    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress progress output
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Set the Gemini API key
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Pin the analysis model (pass an empty string to restore auto-select)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Default seconds between readiness polls
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Default seconds to wait for remote processing
    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    /// Print the resolved configuration
    #[arg(long)]
    pub show: bool,
}

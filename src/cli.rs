//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Browse remote directory listings and selectively download files.
///
/// Romgrab opens an "index of" style listing, filters its file entries by
/// name, and downloads the keepers with retry and skip-if-exists semantics.
#[derive(Parser, Debug)]
#[command(name = "romgrab")]
#[command(author, version, about)]
pub struct Args {
    /// Listing URL to open (default: base_url + start_path from config)
    pub url: Option<String>,

    /// Path to a JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory to download into (overrides config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep only filenames containing this substring (repeatable; overrides config)
    #[arg(short, long = "include")]
    pub include: Vec<String>,

    /// Drop filenames containing this substring (repeatable; overrides config)
    #[arg(short = 'x', long = "exclude")]
    pub exclude: Vec<String>,

    /// Maximum fetch attempts per file (overrides config)
    #[arg(short = 'r', long)]
    pub max_retries: Option<u32>,

    /// Seconds to wait between retry attempts (overrides config)
    #[arg(long)]
    pub retry_delay: Option<u64>,

    /// HTTP request timeout in seconds (overrides config)
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// List matching files without downloading anything
    #[arg(short, long)]
    pub list_only: bool,

    /// Show the page's menu links instead of treating it as a listing
    #[arg(long)]
    pub menu: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

/// CLI argument parsing and command handling

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::core::FeedKind;
use crate::utils::{parse_interval, AppConfig};

// Build timestamp injected at compile time by build.rs
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

// Get version with timestamp
pub fn get_version() -> &'static str {
    VERSION_WITH_BUILD
}

#[derive(Parser)]
#[command(name = "smartcity-dash")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Refresh period, e.g. "5s", "1m 30s" (overrides config)
    #[arg(short, long, global = true, value_parser = parse_interval)]
    pub interval: Option<Duration>,

    /// Snapshot source (overrides config)
    #[arg(long, global = true)]
    pub feed: Option<FeedKind>,

    /// JSON snapshot file for `--feed file`
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    /// Seed for the jitter feed
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(interval) = self.interval {
            config.refresh_interval = interval;
        }
        if let Some(file) = &self.file {
            config.snapshot_file = Some(file.clone());
            // A file without an explicit feed means "read this file"
            if self.feed.is_none() {
                config.feed = FeedKind::File;
            }
        }
        if let Some(feed) = self.feed {
            config.feed = feed;
        }
        if let Some(seed) = self.seed {
            config.jitter_seed = Some(seed);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print one snapshot and exit
    Snapshot {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the derived dashboard values for one snapshot
    Summary {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print a summary line on every refresh
    Watch {
        /// Stop after this many refreshes
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
        count: Option<u64>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Run HTTP API server mode
    #[cfg(feature = "server")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Enable CORS for cross-origin requests
        #[arg(long)]
        cors: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// View configuration
    View,

    /// Print the config file location
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Set the refresh interval
    SetInterval {
        #[arg(value_parser = parse_interval)]
        interval: Duration,
    },

    /// Set the snapshot source
    SetFeed {
        feed: FeedKind,

        /// Snapshot file, required for the file feed
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

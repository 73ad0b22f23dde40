//! CLI arguments and subcommands for psinfo.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format for the snapshot subcommand
#[derive(Debug, Clone, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "psinfo",
    about = "Process census reporter: per-process listing and scheduling-state counts",
    long_about = "Process census reporter: per-process listing and scheduling-state counts.\n\n\
                  Without a subcommand psinfo runs as a service that publishes a fresh \
                  process report on every read of its named socket (and optionally over HTTP). \
                  Use `psinfo view` to print the published report.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind HTTP to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides log_level from the config file) [default: info]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// procfs mount to read processes from
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Path of the named socket the report is published on
    #[arg(short = 's', long)]
    pub socket: Option<PathBuf>,

    /// Do not publish the report on the named socket
    #[arg(long)]
    pub disable_socket: bool,

    /// Do not serve the report over HTTP
    #[arg(long)]
    pub disable_http: bool,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the report published on the named socket
    View,

    /// Generate one report in-process and print it
    Snapshot {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Validate configuration and system requirements
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}

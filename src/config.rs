//! Configuration management for psinfo.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9216;
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_REPORT_NAME: &str = "psinfo";
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/psinfo.sock";
pub const DEFAULT_SOCKET_MODE: &str = "0666";

/// Searched in order when no config file is given.
pub const DEFAULT_CONFIG_PATHS: [&str; 8] = [
    "/etc/psinfo/psinfo.yaml",
    "/etc/psinfo/psinfo.yml",
    "/etc/psinfo/psinfo.json",
    "/etc/psinfo/psinfo.toml",
    "./psinfo.yaml",
    "./psinfo.yml",
    "./psinfo.json",
    "./psinfo.toml",
];

/// Configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // HTTP server
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Census
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "report-name")]
    pub report_name: Option<String>,

    // Named socket publication
    #[serde(alias = "socket-path")]
    pub socket_path: Option<PathBuf>,
    /// Octal permission bits for the socket file, e.g. "0666"
    #[serde(alias = "socket-mode")]
    pub socket_mode: Option<String>,

    // Feature flags
    #[serde(alias = "enable-socket")]
    pub enable_socket: Option<bool>,
    #[serde(alias = "enable-http")]
    pub enable_http: Option<bool>,
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            report_name: Some(DEFAULT_REPORT_NAME.to_string()),
            socket_path: Some(PathBuf::from(DEFAULT_SOCKET_PATH)),
            socket_mode: Some(DEFAULT_SOCKET_MODE.to_string()),
            enable_socket: Some(true),
            enable_http: Some(true),
            enable_health: Some(true),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn report_name(&self) -> &str {
        self.report_name.as_deref().unwrap_or(DEFAULT_REPORT_NAME)
    }

    pub fn socket_path(&self) -> PathBuf {
        self.socket_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET_PATH))
    }

    /// Socket permission bits; falls back to the default on invalid input.
    pub fn socket_mode(&self) -> u32 {
        parse_mode(self.socket_mode.as_deref().unwrap_or(DEFAULT_SOCKET_MODE))
            .unwrap_or(0o666)
    }
}

/// Parses an octal permission string such as "0666" or "644".
pub fn parse_mode(mode: &str) -> Option<u32> {
    let digits = mode.trim().trim_start_matches("0o");
    match u32::from_str_radix(digits, 8) {
        Ok(bits) if bits <= 0o777 => Some(bits),
        _ => None,
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let enable_socket = cfg.enable_socket.unwrap_or(true);
    let enable_http = cfg.enable_http.unwrap_or(true);

    if !(enable_socket || enable_http) {
        return Err("At least one of enable_socket/enable_http must be true".into());
    }

    let name = cfg.report_name();
    if name.is_empty() || name.contains('/') {
        return Err(format!(
            "Invalid report_name '{}', expected a non-empty name without '/'",
            name
        )
        .into());
    }

    if let Some(mode) = cfg.socket_mode.as_deref() {
        if parse_mode(mode).is_none() {
            return Err(format!(
                "Invalid socket_mode '{}', expected octal permission bits like 0666",
                mode
            )
            .into());
        }
    }

    if enable_socket && cfg.socket_path().as_os_str().is_empty() {
        return Err("enable_socket is true but socket_path is empty".into());
    }

    if cfg.proc_root().as_os_str().is_empty() {
        return Err("proc_root must not be empty".into());
    }

    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address '{}'", bind).into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(proc_root) = &args.proc_root {
        config.proc_root = Some(proc_root.clone());
    }
    if let Some(socket) = &args.socket {
        config.socket_path = Some(socket.clone());
    }

    // Feature flags
    if args.disable_socket {
        config.enable_socket = Some(false);
    }
    if args.disable_http {
        config.enable_http = Some(false);
    }
    if args.disable_health {
        config.enable_health = Some(false);
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("Config file not found: {}", p.display()).into());
            }
            p.to_path_buf()
        }
        None => {
            // Try default locations
            match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Serializes configuration in requested format
pub fn format_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", format_config(config, &format)?);
    Ok(())
}

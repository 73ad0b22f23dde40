//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{format_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("psinfo.yaml"));

    let mut content = format_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# psinfo Configuration
# =====================
#
# HTTP Server
# -----------
# bind: "127.0.0.1"            # Bind IP for the HTTP transport
# port: 9216                   # HTTP port
#
# Census
# ------
# proc_root: "/proc"           # procfs mount to read processes from
# report_name: "psinfo"        # Name the report is registered under
#
# Named Socket
# ------------
# socket_path: "/tmp/psinfo.sock"  # Path `psinfo view` reads from
# socket_mode: "0666"          # Octal permission bits of the socket file
#
# Feature Flags
# -------------
# enable_socket: true          # Publish the report on the named socket
# enable_http: true            # Serve /psinfo over HTTP
# enable_health: true          # Enable /health endpoint
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}

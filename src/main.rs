//! psinfo - version 0.1.0
//!
//! Process census reporter with tracing logging.
//! This is the main entry point that publishes the report and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod socket;
mod startup_checks;
mod state;

use axum::{routing::get, Router};
use clap::{Parser, ValueEnum};
use psinfo::{generate_snapshot_with_stats, HealthStats, ProcfsSource, PublicationChannel};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, warn, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_snapshot, command_view};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{health_handler, report_handler, root_handler};
use socket::SocketServer;
use state::{AppState, SharedState};

/// Initializes tracing logging subsystem with configured log level.
/// Logs go to stderr so stdout carries only report output.
fn setup_logging(config: &Config, args: &Args) {
    let log_level = args
        .log_level
        .clone()
        .or_else(|| {
            config
                .log_level
                .as_deref()
                .and_then(|s| LogLevel::from_str(s, true).ok())
        })
        .unwrap_or(LogLevel::Info);

    let level = match log_level {
        LogLevel::Off => return,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    debug!("Logging initialized with level: {:?}", log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config, &args);

        return match command {
            Commands::View => {
                if let Err(e) = command_view(&config.socket_path()).await {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
                Ok(())
            }
            Commands::Snapshot { format } => command_snapshot(format.clone(), &config),
            Commands::Check => command_check(&config),
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;
    setup_logging(&config, &args);

    info!("Starting psinfo");

    let proc_root = config.proc_root();
    let enable_socket = config.enable_socket.unwrap_or(true);
    let enable_http = config.enable_http.unwrap_or(true);
    let socket_path = config.socket_path();

    if let Err(e) = startup_checks::validate_requirements(
        &proc_root,
        enable_socket.then_some(socket_path.as_path()),
    ) {
        error!("❌ Startup validation failed: {}", e);
        error!("   psinfo will start but reports may fail until this is fixed!");
    }

    // Register the report: every open generates a fresh snapshot
    let health_stats = Arc::new(HealthStats::new());
    let channel = Arc::new(PublicationChannel::new());
    let source = ProcfsSource::new(&proc_root);
    let provider_stats = health_stats.clone();
    let registration = channel.register(
        config.report_name(),
        Arc::new(move || generate_snapshot_with_stats(&source, &provider_stats)),
    )?;

    let state: SharedState = Arc::new(AppState {
        channel: channel.clone(),
        report_name: config.report_name().to_string(),
        config: Arc::new(config.clone()),
        health_stats,
        start_time: Instant::now(),
    });

    // Without a way to publish, refuse to start
    let socket_server = if enable_socket {
        match SocketServer::bind(&socket_path, config.socket_mode()) {
            Ok(server) => Some(server),
            Err(e) => {
                error!("❌ {}", e);
                channel.unregister(registration);
                return Err(e.into());
            }
        }
    } else {
        debug!("Named socket disabled in configuration");
        None
    };

    let socket_task = async {
        match &socket_server {
            Some(server) => server.serve(state.clone()).await,
            None => std::future::pending::<()>().await,
        }
    };

    let http_task = async {
        if !enable_http {
            debug!("HTTP transport disabled in configuration");
            std::future::pending::<()>().await;
            return Ok(());
        }

        let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        let port = config.port.unwrap_or(DEFAULT_PORT);
        let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

        let mut app = Router::new()
            .route("/", get(root_handler))
            .route("/psinfo", get(report_handler));
        if config.enable_health.unwrap_or(true) {
            app = app.route("/health", get(health_handler));
        }
        let app = app.with_state(state.clone());

        let listener = TcpListener::bind(addr).await?;
        info!("psinfo listening on http://{}:{}", bind_ip_str, port);
        axum::serve(listener, app).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    };

    if let Some(server) = &socket_server {
        info!("psinfo publishing report on {}", server.path().display());
    }

    let result = tokio::select! {
        _ = socket_task => Ok(()),
        result = http_task => {
            if let Err(e) = &result {
                error!("Server error: {}", e);
            }
            result
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
            Ok(())
        }
    };

    drop(socket_server);
    channel.unregister(registration);

    if result.is_ok() {
        info!("psinfo stopped gracefully");
    } else {
        warn!("psinfo stopped with errors");
    }
    result
}

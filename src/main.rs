//! oneshot-listener
//!
//! Accepts a single TCP connection and copies everything the client sends to
//! stdout, then exits.
//!
//! # Architecture Overview
//!
//! ```text
//!   config file ──┐
//!   CLI flags ────┼─▶ ServerConfig ─▶ Acceptor
//!                 │                     │
//!                 │      socket ─▶ bind ─▶ listen ─▶ accept one
//!                 │                                      │
//!   peer ─────────┼──────────────────────────────────▶ drain ─▶ stdout
//!                 │
//!   Ctrl+C ───────┴─▶ Shutdown ─▶ cancels accept / drain
//!
//!   logs ─▶ stderr
//! ```
//!
//! Exit status is 0 once the client has closed (or on Ctrl+C), 1 on any failure.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use oneshot_listener::config::{self, ConfigError, LogFormat, ServerConfig};
use oneshot_listener::lifecycle::signals::spawn_ctrl_c_handler;
use oneshot_listener::observability::init_logging;
use oneshot_listener::{Acceptor, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "oneshot-listener")]
#[command(about = "Accept one TCP connection and print what it sends", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// IPv4 address to bind
    #[arg(long)]
    bind: Option<Ipv4Addr>,

    /// Port to listen on (0 picks an ephemeral port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Pending-connection queue depth
    #[arg(long)]
    backlog: Option<u32>,

    /// Read buffer size in bytes
    #[arg(long)]
    buffer_capacity: Option<usize>,

    /// Exit if no client connects within this many seconds
    #[arg(long)]
    accept_timeout_secs: Option<u64>,

    /// Exit if the client sends nothing for this many seconds
    #[arg(long)]
    idle_timeout_secs: Option<u64>,

    /// Log level or filter directive
    #[arg(long)]
    log_level: Option<String>,

    /// Log format: pretty, compact or json
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(backlog) = self.backlog {
            config.listener.backlog = backlog;
        }
        if let Some(capacity) = self.buffer_capacity {
            config.connection.buffer_capacity = capacity;
        }
        if self.accept_timeout_secs.is_some() {
            config.connection.accept_timeout_secs = self.accept_timeout_secs;
        }
        if self.idle_timeout_secs.is_some() {
            config.connection.idle_timeout_secs = self.idle_timeout_secs;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }
}

fn load(cli: &Cli) -> Result<ServerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ServerConfig::default(),
    };
    cli.apply(&mut config);
    config::validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(&Default::default());
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        port = config.listener.port,
        backlog = config.listener.backlog,
        buffer_capacity = config.connection.buffer_capacity,
        "Configuration loaded"
    );

    let shutdown = Arc::new(Shutdown::new());
    let mut acceptor = Acceptor::new(config, shutdown.subscribe());
    spawn_ctrl_c_handler(Arc::clone(&shutdown));

    let mut stdout = tokio::io::stdout();
    match acceptor.run(&mut stdout).await {
        Ok(summary) => {
            tracing::info!(
                connection_id = %summary.connection_id,
                bytes = summary.bytes,
                chunks = summary.chunks,
                "Shutdown complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) if e.is_cancelled() => {
            tracing::info!(state = %acceptor.current_state(), "Stopped before the connection closed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, state = %acceptor.current_state(), "Fatal error");
            ExitCode::FAILURE
        }
    }
}

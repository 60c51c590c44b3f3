use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use envscan_daemon::{
    default_router, EnvScanner, ScanOptions, Server, ServerOptions, DEFAULT_HOST, DEFAULT_PORT,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Local orchestration daemon: WebSocket message channel and toolchain scanner
#[derive(Parser, Debug)]
#[command(name = "envscan-daemon")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Host to listen on
    #[arg(long, env = "ENVSCAN_HOST", default_value = DEFAULT_HOST, global = true)]
    host: String,

    /// Port to listen on
    #[arg(long, env = "ENVSCAN_PORT", default_value_t = DEFAULT_PORT, global = true)]
    port: u16,

    /// Seconds to wait for a single tool probe before giving up on it
    #[arg(long, env = "ENVSCAN_PROBE_TIMEOUT_SECS", default_value_t = 5, global = true,
          value_parser = clap::value_parser!(u64).range(1..))]
    probe_timeout_secs: u64,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the WebSocket server (default)
    Serve,

    /// Scan the environment once and print the report as JSON
    Scan,
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "ctrl_c_handler_failed");
        std::future::pending::<()>().await;
    }
}

async fn serve(options: ServerOptions, scanner: EnvScanner) -> Result<()> {
    info!(host = %options.host, port = options.port, "server_starting");

    let listener = TcpListener::bind(options.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", options.bind_addr()))?;

    let server = Server::new(default_router(scanner));
    server.serve(listener, shutdown_signal()).await?;

    info!("server_stopped");
    Ok(())
}

async fn scan_once(scanner: EnvScanner) -> Result<()> {
    let report = scanner.scan().await;
    let json = serde_json::to_string_pretty(&report).context("failed to encode scan report")?;
    println!("{json}");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    let scanner = EnvScanner::system(&ScanOptions {
        probe_timeout: Duration::from_secs(cli.probe_timeout_secs),
    });

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let options = ServerOptions {
                host: cli.host,
                port: cli.port,
            };
            serve(options, scanner).await
        }
        Commands::Scan => scan_once(scanner).await,
    }
}

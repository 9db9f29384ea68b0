use anyhow::Result;
use clap::Parser;
use log::{debug, error, info, LevelFilter};
use std::sync::Arc;
use tracker::{start_server, StoreContext, DEFAULT_PAYLOAD_LIMIT};

#[derive(Parser)]
#[command(about = "Multi-user task tracking API")]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port
    #[arg(short = 'p', long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Log level
    #[arg(short = 'l', long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Maximum accepted request body, in bytes
    #[arg(long, default_value_t = DEFAULT_PAYLOAD_LIMIT)]
    max_payload_bytes: usize,
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info, // Default to Info if the level is unrecognized
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = parse_log_level(&args.log_level);
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    debug!("Log level: {}", log_level);

    let store_context = Arc::new(StoreContext::new());

    tokio::select! {
        res = start_server(&args.host, args.port, store_context, args.max_payload_bytes) => {
            if let Err(e) = res {
                error!("Server error: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}

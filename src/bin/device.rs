//! Bioloid Device Binary
//!
//! Serves a simulated servo on a TCP bus endpoint.

use bioloid::network::Server;
use bioloid::{Config, Id, SimulatedServo};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// Simulated bioloid servo
#[derive(Parser, Debug)]
#[command(name = "bioloid-device")]
#[command(about = "Simulated bioloid servo served over TCP")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7000")]
    listen: String,

    /// File holding the persistent control table bytes
    #[arg(short, long, default_value = "./bioloid.ctl")]
    storage: String,

    /// Program this device id into the control table at start-up
    #[arg(short, long)]
    id: Option<u8>,

    /// Socket read timeout in milliseconds (must be non-zero)
    #[arg(long, default_value = "100")]
    read_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bioloid=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    if let Some(id) = args.id {
        if Id(id).is_broadcast() || Id(id) == Id::INVALID {
            tracing::error!("Device id {} is reserved", id);
            std::process::exit(2);
        }
    }

    tracing::info!("bioloid device v{}", bioloid::VERSION);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .storage_path(&args.storage)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let server = match Server::bind(config, SimulatedServo::new()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    let mut server = match args.id {
        Some(id) => server.with_device_id(Id(id)),
        None => server,
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

//! Bioloid CLI Client
//!
//! Bus master for poking at devices behind a TCP bus endpoint.

use std::process::ExitCode;

use bioloid::port::SocketPort;
use bioloid::{Bus, Config, Id, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// Bioloid bus master
#[derive(Parser, Debug)]
#[command(name = "bioloid-cli")]
#[command(about = "Send commands to devices on a bioloid bus")]
#[command(version)]
struct Args {
    /// Bus endpoint address
    #[arg(short, long, default_value = "127.0.0.1:7000")]
    server: String,

    /// Reply timeout in milliseconds [default: from Config]
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that a device answers
    Ping {
        /// Device id
        id: u8,
    },

    /// Read bytes from a device's control table
    Read {
        /// Device id
        id: u8,

        /// Starting offset
        offset: u8,

        /// Number of bytes
        len: u8,
    },

    /// Write bytes to a device's control table
    Write {
        /// Device id
        id: u8,

        /// Starting offset
        offset: u8,

        /// Bytes to write
        #[arg(required = true)]
        data: Vec<u8>,
    },

    /// Restore a device's control table to its initial values
    Reset {
        /// Device id
        id: u8,
    },

    /// Ping a range of ids and list those that answer
    Scan {
        /// First id to try
        #[arg(default_value = "0")]
        first: u8,

        /// Last id to try
        #[arg(default_value = "253")]
        last: u8,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut builder = Config::builder();
    if let Some(ms) = args.timeout_ms {
        builder = builder.reply_timeout_ms(ms);
    }
    let config = builder.try_build()?;

    let port = SocketPort::connect(&args.server)?;
    let mut bus = Bus::new(port, config.reply_timeout());

    match args.command {
        Commands::Ping { id } => {
            bus.ping(Id(id))?;
            println!("Device {} responded", id);
        }
        Commands::Read { id, offset, len } => {
            let mut data = vec![0u8; len as usize];
            bus.read(Id(id), offset, &mut data)?;
            for (i, byte) in data.iter().enumerate() {
                println!("0x{:02x}: 0x{:02x} ({})", offset as usize + i, byte, byte);
            }
        }
        Commands::Write { id, offset, data } => {
            bus.write(Id(id), offset, &data)?;
            println!("Wrote {} byte(s) at 0x{:02x}", data.len(), offset);
        }
        Commands::Reset { id } => {
            bus.reset(Id(id))?;
            println!("Device {} reset", id);
        }
        Commands::Scan { first, last } => {
            let found = bus.scan(first..=last)?;
            if found.is_empty() {
                println!("No devices found");
            }
            for id in found {
                println!("Found device {}", id);
            }
        }
    }

    Ok(())
}

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Command line arguments for the serial relay
#[derive(Parser, Debug)]
#[command(
    name = "serial-relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Bridge a serial-attached microcontroller to WebSocket clients",
    long_about = "Relays newline-delimited lines from a serial device to every connected WebSocket client, and forwards client commands back to the device."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Command to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the relay server
    Serve(ServeArgs),
    /// List serial ports available on this machine
    Ports,
    /// Write a default project configuration
    Init {
        /// Directory to create `.serial-relay/config.toml` in
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

/// Overrides applied on top of the configuration file
#[derive(ClapArgs, Debug, Default)]
pub struct ServeArgs {
    /// HTTP listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub bind: Option<String>,

    /// Serial port path
    #[arg(short, long)]
    pub device: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,
}

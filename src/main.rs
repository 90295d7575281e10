// Serial Relay - serial device to WebSocket bridge
use anyhow::Context;
use clap::Parser;
use serial_relay::cli::{execute_command, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    execute_command(args)
        .await
        .context("serial-relay failed")
}

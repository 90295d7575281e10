use crate::cli::args::{Args, Command, ServeArgs};
use crate::core::{ClientRegistry, DeviceLink, Relay};
use crate::domain::config::RelayConfig;
use crate::domain::error::{RelayError, RelayResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::serial::available_ports;
use crate::infrastructure::ws::RelayServer;
use std::sync::Arc;
use tabled::Table;
use tracing::info;

/// Execute CLI command
pub async fn execute_command(args: Args) -> RelayResult<()> {
    let config_manager = ConfigManager::new();
    let config = match &args.config {
        Some(path) => config_manager.load_config_from_path(path)?,
        None => config_manager.load_config()?,
    };

    if !args.quiet {
        init_logging(&config.log_level, args.verbose).map_err(|e| RelayError::Config {
            message: format!("Failed to initialize logging: {}", e),
        })?;
    }

    match args.command {
        None => serve(config, ServeArgs::default()).await,
        Some(Command::Serve(serve_args)) => serve(config, serve_args).await,
        Some(Command::Ports) => list_ports(),
        Some(Command::Init { path }) => {
            let written = config_manager.init_project_config(&path)?;
            println!("Wrote {}", written.display());
            Ok(())
        }
    }
}

/// Apply command line overrides to the loaded configuration
pub fn apply_overrides(mut config: RelayConfig, overrides: &ServeArgs) -> RelayResult<RelayConfig> {
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(bind) = &overrides.bind {
        config.server.bind_address = bind.clone();
    }
    if let Some(device) = &overrides.device {
        config.device.path = device.clone();
    }
    if let Some(baud) = overrides.baud {
        config.device.baud_rate = baud;
    }
    config.validate()?;
    Ok(config)
}

async fn serve(config: RelayConfig, overrides: ServeArgs) -> RelayResult<()> {
    let config = apply_overrides(config, &overrides)?;

    // An unopenable device leaves the link errored; the server still comes up.
    let device = Arc::new(DeviceLink::open(&config.device, &config.relay));
    let registry = Arc::new(ClientRegistry::new(config.relay.client_queue_capacity));
    let relay = Relay::new(Arc::clone(&device), registry);
    let pump = relay.start();

    let mut server = RelayServer::bind(&config.server.listen_addr(), relay).await?;
    server.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    server.stop().await?;
    device.close();
    pump.abort();

    Ok(())
}

fn list_ports() -> RelayResult<()> {
    let ports = available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    } else {
        println!("{}", Table::new(ports));
    }
    Ok(())
}

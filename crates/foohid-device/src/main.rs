//! foohid service entry point.
//!
//! Creates the configured virtual devices, attaches a demonstration peer to
//! each control channel, replays a few host output reports so the peers have
//! something to print, then waits for Ctrl-C and tears everything down.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config_from()              -- devices to create
//!  └─ DeviceFactory::handle_raw()     -- one encoded Create call per device
//!  └─ LocalControlNamespace::connect()
//!       └─ run_hex_printer()          -- one task per channel
//!  └─ accept_host_report() × N        -- simulated host output reports
//!  └─ ctrl_c → DeviceFactory::shutdown()
//! ```
//!
//! The HID subsystem and the control namespace are the in-process
//! implementations from `infrastructure`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use foohid_core::{encode_call, ReportType, ServiceCall, ServiceReply};
use foohid_device::application::manage_devices::DeviceFactory;
use foohid_device::infrastructure::control_namespace::LocalControlNamespace;
use foohid_device::infrastructure::hid_host::InMemoryHidHost;
use foohid_device::infrastructure::peer::run_hex_printer;
use foohid_device::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config, ServiceConfig,
};

/// Size of a U2F HID frame.
const DEMO_REPORT_LEN: usize = 64;

#[derive(Debug, Parser)]
#[command(name = "foohid-service", version, about = "Virtual HID device service")]
struct Args {
    /// Path to config.toml (defaults to the platform config directory).
    #[arg(long, env = "FOOHID_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides the configured log level when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,

    /// Number of simulated host output reports sent to each device.
    #[arg(long, default_value_t = 3)]
    demo_reports: u8,

    /// Write the default configuration to the config path and exit.
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => config_file_path()?,
    };

    if args.init_config {
        save_config(&ServiceConfig::default(), &config_path)?;
        println!("wrote default configuration to {}", config_path.display());
        return Ok(());
    }

    let config = load_config_from(&config_path)?;
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.service.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    info!(config = %config_path.display(), devices = config.devices.len(), "foohid service starting");

    // ── Platform stand-ins ────────────────────────────────────────────────────
    let host = Arc::new(InMemoryHidHost::new());
    let namespace = LocalControlNamespace::new();
    let factory = DeviceFactory::new(host, namespace.clone());

    // ── Device creation ───────────────────────────────────────────────────────
    for entry in &config.devices {
        let request = entry.to_request()?;
        let call = encode_call(&ServiceCall::Create(request))?;
        match factory.handle_raw(&call) {
            Ok(_) => {}
            Err(e) if e.is_soft() => {
                warn!(name = %entry.name, "create failed: {e} (may be fine if created previously)");
            }
            Err(e) => error!(name = %entry.name, "create failed: {e}"),
        }
    }

    // ── Demonstration peers ───────────────────────────────────────────────────
    let mut printers = Vec::new();
    for entry in &config.devices {
        match namespace.connect(&entry.channel) {
            Ok(socket) => {
                let channel = entry.channel.clone();
                printers.push(tokio::spawn(async move {
                    match run_hex_printer(socket, std::io::stdout()).await {
                        Ok(count) => info!(%channel, count, "peer finished"),
                        Err(e) => error!(%channel, "peer output failed: {e}"),
                    }
                }));
            }
            Err(e) => warn!(channel = %entry.channel, "peer could not connect: {e}"),
        }
    }

    // ── Simulated host output reports ─────────────────────────────────────────
    for entry in &config.devices {
        let Some(device) = factory.get(&entry.name) else {
            continue;
        };
        for seq in 0..args.demo_reports {
            let mut report = vec![0u8; DEMO_REPORT_LEN];
            report[0] = 0x05;
            report[2] = seq;
            if let Err(e) = device.accept_host_report(&report, ReportType::Output) {
                warn!(name = %entry.name, "host report rejected: {e}");
            }
        }
    }

    if let Ok(ServiceReply::Devices(names)) = factory.handle_call(ServiceCall::List) {
        info!(?names, "foohid service ready; press Ctrl-C to stop");
    }

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    factory.shutdown();
    for printer in printers {
        if let Err(e) = printer.await {
            error!("peer task panicked: {e}");
        }
    }

    info!("foohid service stopped");
    Ok(())
}

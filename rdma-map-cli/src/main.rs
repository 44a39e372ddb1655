use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use rdma_map::{CharDevice, NodeGuid, RdmaMap, SysfsLayout};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rdma-map")]
#[command(about = "Map network interfaces to RDMA devices and their char devices", long_about = None)]
struct Cli {
    /// Alternate sysfs mount point (default: /sys)
    #[arg(long, global = true)]
    sysfs_root: Option<PathBuf>,
    /// JSON file overriding the sysfs layout
    #[arg(long, global = true, conflicts_with = "sysfs_root")]
    layout: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List RDMA devices
    Devices,
    /// List the character devices of an RDMA device
    CharDevices {
        /// RDMA device name (e.g. mlx5_0)
        device: String,
    },
    /// Print the RDMA device backing a network interface
    Resolve {
        /// Network interface name (e.g. eth0, ib0)
        netdev: String,
    },
    /// Dump every RDMA device as JSON
    Show,
}

#[derive(Debug, Serialize)]
struct PortReport {
    port: String,
    netdevs: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DeviceReport {
    name: String,
    node_guid: Option<NodeGuid>,
    ports: Vec<PortReport>,
    char_devices: Vec<CharDevice>,
}

fn load_layout(cli: &Cli) -> Result<SysfsLayout> {
    if let Some(path) = &cli.layout {
        return SysfsLayout::from_json_file(path)
            .with_context(|| format!("Failed to load layout {}", path.display()));
    }
    Ok(match &cli.sysfs_root {
        Some(root) => SysfsLayout::with_sysfs_root(root),
        None => SysfsLayout::default(),
    })
}

/// Snapshot of every device; GUID failures are reported, not fatal
fn build_report(map: &RdmaMap) -> Vec<DeviceReport> {
    let devices = map.devices();
    let mut reports = Vec::new();

    for name in devices.list_devices() {
        let node_guid = match devices.read_node_guid(&name) {
            Ok(guid) => Some(guid),
            Err(e) => {
                warn!("{}: {}", name, e);
                None
            }
        };

        let ports = devices
            .list_ports(&name)
            .into_iter()
            .map(|port| {
                let netdevs = devices
                    .list_netdev_indices(&name, &port)
                    .iter()
                    .filter_map(|index| devices.read_netdev_binding(&name, &port, index))
                    .filter(|netdev| !netdev.is_empty())
                    .collect();
                PortReport { port, netdevs }
            })
            .collect();

        reports.push(DeviceReport {
            char_devices: devices.list_char_devices(&name),
            name,
            node_guid,
            ports,
        });
    }

    reports
}

fn run(cli: &Cli) -> Result<()> {
    let layout = load_layout(cli)?;
    info!("RDMA class root: {}", layout.rdma_class_dir.display());
    let map = RdmaMap::with_layout(layout);

    match &cli.command {
        Commands::Devices => {
            for device in map.list_devices() {
                println!("{}", device);
            }
        }
        Commands::CharDevices { device } => {
            for char_dev in map.list_char_devices(device) {
                println!("{}", char_dev.path.display());
            }
        }
        Commands::Resolve { netdev } => {
            let device = map
                .resolve_rdma_device_for_netdevice(netdev)
                .with_context(|| format!("Failed to resolve {}", netdev))?;
            match device {
                Some(device) => println!("{}", device),
                None => anyhow::bail!("No RDMA device found for {}", netdev),
            }
        }
        Commands::Show => {
            let report = build_report(&map);
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    run(&cli)
}

//! CLI application for discovering and controlling ESPHome lights.
//!
//! Classified devices are kept in a JSON registry file between runs.
//!
//! Run with: cargo run --example esphome_cli -- --help

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use esphome_lights_rs::{
    AdapterConfig, Alert, CandidateSupplier, DeviceRegistry, HttpTransport, Light, LightState,
    MemoryRegistry, Subnet, Xy, discover_devices,
};

#[derive(Parser)]
#[command(name = "esphome-cli")]
#[command(about = "Control ESPHome lights from the command line", long_about = None)]
struct Cli {
    /// Registry file holding classified devices
    #[arg(short, long, global = true, default_value = "esphome-devices.json")]
    registry: PathBuf,

    /// Device id (MAC) to control (not required for discover and list)
    #[arg(short, long, global = true)]
    id: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long, global = true, default_value = "3")]
    timeout: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe addresses and register the lights that answer
    Discover {
        /// Scan the /24 network containing this address
        #[arg(long)]
        subnet: Option<Ipv4Addr>,

        /// Explicit device addresses (host or host:port)
        addresses: Vec<String>,
    },

    /// List registered lights
    List,

    /// Rename a registered light
    Rename { name: String },

    /// Get the current state of the light
    Status,

    /// Turn the light on
    On,

    /// Turn the light off
    Off,

    /// Set brightness (1-254)
    Bri {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=254))]
        level: u8,
    },

    /// Set color temperature in mireds (153-500)
    Ct {
        #[arg(value_parser = clap::value_parser!(u16).range(153..=500))]
        mireds: u16,
    },

    /// Set a CIE xy color
    Xy { x: f64, y: f64 },

    /// Set hue (0-65535) and saturation (0-254)
    Hs { hue: u16, sat: u8 },

    /// Flash the light once
    Alert,

    /// Get detailed diagnostics
    Diagnostics,
}

fn load_registry(path: &Path) -> Result<MemoryRegistry, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(MemoryRegistry::new());
    }
    Ok(MemoryRegistry::from_json(&std::fs::read_to_string(path)?)?)
}

fn save_registry(path: &Path, registry: &MemoryRegistry) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, registry.to_json()?)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = AdapterConfig {
        request_timeout: std::time::Duration::from_secs_f64(cli.timeout),
        ..AdapterConfig::default()
    };
    let transport = Arc::new(HttpTransport::new(&config)?);
    let mut registry = load_registry(&cli.registry)?;

    match cli.command {
        Commands::Discover { subnet, addresses } => {
            let mut candidates = addresses;
            if let Some(host) = subnet {
                candidates.extend(Subnet::new(host, config.http_port).candidates().await?);
            }
            if candidates.is_empty() {
                return Err("nothing to probe: pass addresses or --subnet".into());
            }

            println!("Probing {} address(es)...", candidates.len());
            let report = discover_devices(&candidates, transport.as_ref(), &mut registry, &config)
                .await?;
            for id in &report.added {
                println!("  added      {id}");
            }
            for id in &report.refreshed {
                println!("  refreshed  {id}");
            }
            for (address, e) in &report.skipped {
                println!("  skipped    {address}: {e}");
            }
            save_registry(&cli.registry, &registry)?;
        }

        Commands::List => {
            if registry.is_empty() {
                println!("No lights registered.");
            }
            for record in registry.records() {
                println!(
                    "  {}  {:15}  {:16}  {}",
                    record.id(),
                    record.address(),
                    record.class().model_id(),
                    record.name()
                );
            }
        }

        Commands::Rename { name } => {
            let id = cli.id.ok_or("device id is required for this command. Use --id <ID>")?;
            registry.rename(&id, &name)?;
            save_registry(&cli.registry, &registry)?;
            println!("Renamed {id} to {name}");
        }

        command => {
            let id = cli.id.ok_or("device id is required for this command. Use --id <ID>")?;
            let light = Light::new(registry.require(&id)?.clone(), transport);

            let delta = match command {
                Commands::Status => {
                    let state = light.get_state().await?;
                    println!("{}", serde_json::to_string_pretty(&state)?);
                    return Ok(());
                }
                Commands::Diagnostics => {
                    let diag = light.diagnostics().await;
                    println!("{}", serde_json::to_string_pretty(&diag)?);
                    return Ok(());
                }
                Commands::On => LightState {
                    on: Some(true),
                    ..LightState::default()
                },
                Commands::Off => LightState::off(),
                Commands::Bri { level } => LightState {
                    bri: Some(level),
                    ..LightState::default()
                },
                Commands::Ct { mireds } => LightState {
                    ct: Some(mireds),
                    ..LightState::default()
                },
                Commands::Xy { x, y } => LightState {
                    xy: Some(Xy::new(x, y)),
                    ..LightState::default()
                },
                Commands::Hs { hue, sat } => LightState {
                    hue: Some(hue),
                    sat: Some(sat),
                    ..LightState::default()
                },
                Commands::Alert => LightState {
                    alert: Some(Alert::Select),
                    ..LightState::default()
                },
                Commands::Discover { .. } | Commands::List | Commands::Rename { .. } => {
                    unreachable!()
                }
            };

            let last_known = match light.get_state().await {
                Ok(state) => state,
                Err(e) => {
                    log::warn!("could not read current state, using defaults: {e}");
                    LightState::default()
                }
            };
            let sent = light.set(&delta, &last_known, &registry).await?;
            for path in sent.paths() {
                println!("  sent {path}");
            }
        }
    }

    Ok(())
}

//! # esphome_lights_rs
//!
//! An async Rust library for discovering and controlling ESPHome-based smart
//! lights over their HTTP REST surface.
//!
//! Devices are classified once into a [`DeviceClass`] by probing their
//! light channels. After that, generic [`LightState`] deltas are translated
//! into ordered device requests, and channel readings are normalized back
//! into a [`LightState`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use esphome_lights_rs::{
//!     AdapterConfig, HttpTransport, Light, LightState, MemoryRegistry, discover_devices,
//! };
//!
//! async fn control_lights() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AdapterConfig::default();
//!     let transport = Arc::new(HttpTransport::new(&config)?);
//!     let mut registry = MemoryRegistry::new();
//!
//!     let candidates = vec!["192.168.1.40".to_string()];
//!     discover_devices(&candidates, transport.as_ref(), &mut registry, &config).await?;
//!
//!     let record = registry.require("a4cf12b3c4d5")?.clone();
//!     let light = Light::new(record, transport);
//!     let delta = LightState { bri: Some(128), ..LightState::default() };
//!     light.set(&delta, &light.get_state().await?, &registry).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Classification**: Probe a device once with [`probe_address`] and [`classify`]
//! - **Discovery**: Scan candidates concurrently with [`discover_devices`]
//! - **Commands**: Build request sequences with [`Translator`]
//! - **State**: Read normalized state with [`read_state`] or [`Light::get_state`]
//! - **Calibration**: Per-device brightness offsets via [`CalibrationStore`]
//! - **Colors**: Pluggable conversions through [`ColorConverter`]
//!
//! ## Communication
//!
//! Devices are reached over plain HTTP. State is read with `GET` on a
//! channel path such as `/light/white_led`, and commands are `POST`ed to
//! `/light/<channel>/turn_on` or `/turn_off` with query parameters.

mod colors;
mod config;
mod discovery;
mod errors;
mod history;
mod light;
pub mod reader;
mod registry;
mod request;
mod response;
mod state;
mod translate;
mod transport;
mod types;

// Re-export public API
pub use colors::{ColorConverter, StandardColors};
pub use config::{AdapterConfig, DeviceClass, ProbeSet};
pub use discovery::{
    CandidateSupplier, DiscoveryOutcome, DiscoveryReport, ProbeReport, Subnet, classify,
    discover_devices, probe_address,
};
pub use errors::Error;
pub use history::{HistoryEntry, HistorySummary, MessageHistory, MessageType};
pub use light::Light;
pub use reader::read_state;
pub use registry::{CalibrationStore, DeviceRecord, DeviceRegistry, MemoryRegistry};
pub use request::{Action, Channel, ControlRequest, Endpoint, Request};
pub use response::{Beacon, ChannelStatus, WireColor};
pub use state::LightState;
pub use translate::Translator;
pub use transport::{HttpTransport, Transport};
pub use types::{Alert, Calibration, Color, ColorMode, PowerState, Xy};

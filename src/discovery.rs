//! Device discovery and classification.

use std::net::Ipv4Addr;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use log::{debug, error, info};

use crate::config::{AdapterConfig, DeviceClass, ProbeSet};
use crate::errors::Error;
use crate::registry::{DeviceRecord, DeviceRegistry};
use crate::request::Channel;
use crate::response::{Beacon, ChannelStatus};
use crate::transport::Transport;

type Result<T> = std::result::Result<T, Error>;

/// Supplies the addresses a discovery pass probes.
///
/// How candidates are found (a port scan, a static list, mDNS) is up to the
/// implementation.
pub trait CandidateSupplier: Send + Sync {
    fn candidates(&self) -> BoxFuture<'_, Result<Vec<String>>>;
}

impl CandidateSupplier for Vec<String> {
    fn candidates(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(futures::future::ready(Ok(self.clone())))
    }
}

/// Every host address of an IPv4 /24 network.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use esphome_lights_rs::Subnet;
///
/// let subnet = Subnet::new(Ipv4Addr::new(192, 168, 1, 17), 80);
/// let addresses = subnet.addresses();
/// assert_eq!(addresses.len(), 254);
/// assert_eq!(addresses[0], "192.168.1.1");
///
/// let subnet = Subnet::new(Ipv4Addr::new(10, 0, 0, 2), 8080);
/// assert_eq!(subnet.addresses()[253], "10.0.0.254:8080");
/// ```
#[derive(Debug, Clone)]
pub struct Subnet {
    network: [u8; 3],
    port: u16,
}

impl Subnet {
    /// The /24 containing `host`, probed on `port`.
    pub fn new(host: Ipv4Addr, port: u16) -> Self {
        let [a, b, c, _] = host.octets();
        Subnet {
            network: [a, b, c],
            port,
        }
    }

    pub fn addresses(&self) -> Vec<String> {
        let [a, b, c] = self.network;
        (1..=254u8)
            .map(|d| {
                let ip = Ipv4Addr::new(a, b, c, d);
                if self.port == 80 {
                    ip.to_string()
                } else {
                    format!("{ip}:{}", self.port)
                }
            })
            .collect()
    }
}

impl CandidateSupplier for Subnet {
    fn candidates(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(futures::future::ready(Ok(self.addresses())))
    }
}

/// Everything learned about one address before it is classified.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub address: String,
    pub beacon: Beacon,
    pub probes: ProbeSet,
}

/// What a discovery pass did with one classified device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// A new record was created with this id
    Added(String),
    /// An existing record's address and calibration were refreshed
    Refreshed(String),
}

/// Summary of a discovery pass.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub added: Vec<String>,
    pub refreshed: Vec<String>,
    /// Addresses that failed probing or classification, with the reason
    pub skipped: Vec<(String, Error)>,
}

/// Query the beacon and the four channel endpoints of one address.
///
/// The beacon is read first so foreign devices are dismissed with a single
/// request. A channel answering with an error status counts as absent; a
/// timeout, transport failure, or unreadable payload aborts the address.
pub async fn probe_address(transport: &dyn Transport, address: &str) -> Result<ProbeReport> {
    debug!("probing {address}");
    let body = transport.get(address, Beacon::PATH).await?;
    let beacon = Beacon::from_body(&body)?;
    if !beacon.is_supported() {
        return Err(Error::unknown_protocol(address, &beacon.tag));
    }
    debug!("found {} ({}) at {address}", beacon.name, beacon.mac);

    let (white, color, dimmable, toggle) = futures::try_join!(
        probe_channel(transport, address, Channel::White),
        probe_channel(transport, address, Channel::Color),
        probe_channel(transport, address, Channel::Dimmable),
        probe_channel(transport, address, Channel::Toggle),
    )?;

    Ok(ProbeReport {
        address: address.to_string(),
        beacon,
        probes: ProbeSet {
            white,
            color,
            dimmable,
            toggle,
        },
    })
}

async fn probe_channel(transport: &dyn Transport, address: &str, channel: Channel) -> Result<bool> {
    match transport.get(address, channel.path()).await {
        Ok(body) => ChannelStatus::parse(channel.path(), &body).map(|_| true),
        Err(e) if e.is_absent_endpoint() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Decide the class of a probed device and upsert it into `registry`.
///
/// A device already registered under the same id keeps its class; only its
/// address and calibration are refreshed.
pub fn classify<R>(report: &ProbeReport, registry: &mut R) -> Result<DiscoveryOutcome>
where
    R: DeviceRegistry + ?Sized,
{
    let Some(class) = DeviceClass::from_probes(report.probes) else {
        return Err(Error::UnrecognizedDevice(report.address.clone()));
    };
    let beacon = &report.beacon;

    if let Some(mut record) = registry.get(&beacon.mac).cloned() {
        if record.class() != class {
            debug!(
                "{}: probes now suggest {:?}, keeping {:?}",
                record.id(),
                class,
                record.class()
            );
        }
        record.refresh(&report.address, beacon.calibration);
        info!("refreshed {} at {}", record.id(), record.address());
        let id = record.id().to_string();
        registry.insert(record);
        return Ok(DiscoveryOutcome::Refreshed(id));
    }

    let record = DeviceRecord::new(
        &beacon.mac,
        &report.address,
        class,
        &beacon.name,
        beacon.calibration,
    );
    info!(
        "adding {} \"{}\" as {:?} at {}",
        record.id(),
        record.name(),
        class,
        record.address()
    );
    let id = record.id().to_string();
    registry.insert(record);
    Ok(DiscoveryOutcome::Added(id))
}

/// Probe every candidate with bounded concurrency and register what answers.
///
/// Failures are confined to their address: they are logged and reported in
/// [`DiscoveryReport::skipped`], and the scan continues.
pub async fn discover_devices<R>(
    supplier: &dyn CandidateSupplier,
    transport: &dyn Transport,
    registry: &mut R,
    config: &AdapterConfig,
) -> Result<DiscoveryReport>
where
    R: DeviceRegistry + ?Sized,
{
    let candidates = supplier.candidates().await?;
    debug!("discovery: probing {} candidates", candidates.len());

    let mut probes = stream::iter(candidates)
        .map(|address| async move {
            let result = probe_address(transport, &address).await;
            (address, result)
        })
        .buffer_unordered(config.max_concurrent_probes.max(1));

    let mut report = DiscoveryReport::default();
    while let Some((address, result)) = probes.next().await {
        match result.and_then(|probe| classify(&probe, &mut *registry)) {
            Ok(DiscoveryOutcome::Added(id)) => report.added.push(id),
            Ok(DiscoveryOutcome::Refreshed(id)) => report.refreshed.push(id),
            Err(e) => {
                match &e {
                    Error::UnrecognizedDevice(_) => error!("{e}"),
                    _ => debug!("skipping {address}: {e}"),
                }
                report.skipped.push((address, e));
            }
        }
    }

    info!(
        "discovery: {} added, {} refreshed, {} skipped",
        report.added.len(),
        report.refreshed.len(),
        report.skipped.len()
    );
    Ok(report)
}

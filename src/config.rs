//! Adapter configuration and device class detection.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationSecondsWithFrac, serde_as};
use strum_macros::EnumIter;

use crate::errors::Error;
use crate::request::Channel;
use crate::state::LightState;
use crate::types::{Alert, ColorMode, Xy};

/// Tunables for discovery and device I/O.
///
/// Every field has a default, so a configuration document only needs to
/// name what it changes:
///
/// ```
/// use std::time::Duration;
/// use esphome_lights_rs::AdapterConfig;
///
/// let config = AdapterConfig::from_json(r#"{"request_timeout": 1.5}"#).unwrap();
/// assert_eq!(config.request_timeout, Duration::from_millis(1500));
/// assert_eq!(config.max_concurrent_probes, 16);
/// ```
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AdapterConfig {
    /// Timeout applied to every outbound request
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub request_timeout: Duration,
    /// Upper bound on addresses probed at the same time during discovery
    pub max_concurrent_probes: usize,
    /// TCP port the devices serve their REST surface on
    pub http_port: u16,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            request_timeout: Duration::from_secs(3),
            max_concurrent_probes: 16,
            http_port: 80,
        }
    }
}

impl AdapterConfig {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(Error::JsonLoad)
    }
}

/// Which channels answered during a discovery probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeSet {
    pub white: bool,
    pub color: bool,
    pub dimmable: bool,
    pub toggle: bool,
}

/// Classification of ESPHome light devices.
///
/// Serialized with the model tags the device registry persists.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum DeviceClass {
    /// Separate white and color channels
    #[serde(rename = "ESPHome-RGBW")]
    Rgbw,
    /// Tunable white channel only
    #[serde(rename = "ESPHome-CT")]
    ColorTemp,
    /// Color channel only
    #[serde(rename = "ESPHome-RGB")]
    Rgb,
    /// Single dimmable channel
    #[serde(rename = "ESPHome-Dimmable")]
    Dimmable,
    /// On/off only
    #[serde(rename = "ESPHome-Toggle")]
    Toggle,
}

impl DeviceClass {
    pub const MANUFACTURER: &'static str = "ESPHome";

    /// Decide the class from probe results; first match wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use esphome_lights_rs::{DeviceClass, ProbeSet};
    ///
    /// let probes = ProbeSet { white: true, color: true, ..Default::default() };
    /// assert_eq!(DeviceClass::from_probes(probes), Some(DeviceClass::Rgbw));
    /// assert_eq!(DeviceClass::from_probes(ProbeSet::default()), None);
    /// ```
    pub fn from_probes(probes: ProbeSet) -> Option<Self> {
        match probes {
            ProbeSet {
                white: true,
                color: true,
                ..
            } => Some(DeviceClass::Rgbw),
            ProbeSet { white: true, .. } => Some(DeviceClass::ColorTemp),
            ProbeSet { color: true, .. } => Some(DeviceClass::Rgb),
            ProbeSet { dimmable: true, .. } => Some(DeviceClass::Dimmable),
            ProbeSet { toggle: true, .. } => Some(DeviceClass::Toggle),
            _ => None,
        }
    }

    /// The channels this class exposes. No other channel endpoint is ever
    /// addressed for a device of this class.
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            DeviceClass::Rgbw => &[Channel::White, Channel::Color],
            DeviceClass::ColorTemp => &[Channel::White],
            DeviceClass::Rgb => &[Channel::Color],
            DeviceClass::Dimmable => &[Channel::Dimmable],
            DeviceClass::Toggle => &[Channel::Toggle],
        }
    }

    pub fn has_white(&self) -> bool {
        self.channels().contains(&Channel::White)
    }

    pub fn has_color(&self) -> bool {
        self.channels().contains(&Channel::Color)
    }

    pub fn supports_brightness(&self) -> bool {
        !matches!(self, DeviceClass::Toggle)
    }

    /// Model identifier advertised for this class.
    pub fn model_id(&self) -> &'static str {
        match self {
            DeviceClass::Rgbw => "LCT015",
            DeviceClass::ColorTemp => "LWB010",
            DeviceClass::Rgb => "ESPHome-RGB",
            DeviceClass::Dimmable => "ESPHome-Dimmable",
            DeviceClass::Toggle => "ESPHome-Toggle",
        }
    }

    pub fn light_type(&self) -> &'static str {
        match self {
            DeviceClass::Rgbw => "Extended color light",
            DeviceClass::ColorTemp => "Color temperature light",
            DeviceClass::Rgb => "Color light",
            DeviceClass::Dimmable => "Dimmable light",
            DeviceClass::Toggle => "On/Off plug-in unit",
        }
    }

    pub fn archetype(&self) -> &'static str {
        match self {
            DeviceClass::Rgbw | DeviceClass::Rgb => "sultanbulb",
            DeviceClass::ColorTemp | DeviceClass::Dimmable | DeviceClass::Toggle => "classicbulb",
        }
    }

    /// State a freshly registered device of this class starts from.
    pub fn initial_state(&self) -> LightState {
        let base = LightState {
            on: Some(false),
            alert: Some(Alert::None),
            ..LightState::default()
        };
        match self {
            DeviceClass::Rgbw => LightState {
                bri: Some(254),
                hue: Some(0),
                sat: Some(0),
                xy: Some(Xy::default()),
                ct: Some(Self::INITIAL_CT),
                colormode: Some(ColorMode::Ct),
                ..base
            },
            DeviceClass::ColorTemp => LightState {
                bri: Some(254),
                ct: Some(Self::INITIAL_CT),
                colormode: Some(ColorMode::Ct),
                ..base
            },
            DeviceClass::Rgb => LightState {
                bri: Some(254),
                hue: Some(0),
                sat: Some(0),
                xy: Some(Xy::default()),
                colormode: Some(ColorMode::Xy),
                ..base
            },
            DeviceClass::Dimmable => LightState {
                bri: Some(254),
                ..base
            },
            DeviceClass::Toggle => base,
        }
    }

    const INITIAL_CT: u16 = 461;
}

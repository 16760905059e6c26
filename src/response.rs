//! Device wire payloads.

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::Error;
use crate::types::{Calibration, Color, PowerState};

type Result<T> = std::result::Result<T, Error>;

/// Status payload served by a channel endpoint.
///
/// White channels carry `color_temp`, color channels carry `color`,
/// dimmable channels only `brightness`, toggles only `state`. Other fields
/// the firmware reports are ignored.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChannelStatus {
    pub state: PowerState,
    #[serde(default, deserialize_with = "lenient_u16")]
    pub brightness: Option<u16>,
    #[serde(default, deserialize_with = "lenient_u16")]
    pub color_temp: Option<u16>,
    #[serde(default)]
    pub color: Option<WireColor>,
}

/// The `color` object of a color channel; components may arrive as floats.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct WireColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl From<WireColor> for Color {
    fn from(c: WireColor) -> Self {
        let byte = |v: f64| v.clamp(0.0, 255.0) as u8;
        Color::rgb(byte(c.r), byte(c.g), byte(c.b))
    }
}

// Firmware versions differ on integer vs float numbers; truncate like an int cast.
fn lenient_u16<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| v.clamp(0.0, f64::from(u16::MAX)) as u16))
}

impl ChannelStatus {
    /// Parse the body served at `path`.
    pub fn parse(path: &str, body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| Error::malformed(path, e.to_string()))
    }

    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    /// Brightness, clamped to the generic 0-255 range.
    pub fn bri(&self, path: &str) -> Result<u8> {
        self.brightness
            .map(|b| b.min(255) as u8)
            .ok_or_else(|| Error::malformed(path, "missing brightness"))
    }

    pub fn ct(&self, path: &str) -> Result<u16> {
        self.color_temp
            .ok_or_else(|| Error::malformed(path, "missing color_temp"))
    }

    pub fn rgb(&self, path: &str) -> Result<Color> {
        self.color
            .map(Color::from)
            .ok_or_else(|| Error::malformed(path, "missing color"))
    }
}

/// Identity and calibration metadata served by the discovery beacon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    pub tag: String,
    pub mac: String,
    pub name: String,
    pub calibration: Calibration,
}

#[derive(Deserialize)]
struct BeaconEnvelope {
    state: String,
}

impl Beacon {
    pub const PATH: &'static str = "/text_sensor/light_id";
    pub const PROTOCOL_TAG: &'static str = "esphome_diyhue_light";

    /// Parse the beacon's `tag;mac;name;ctBoost;rgbBoost` string.
    ///
    /// # Examples
    ///
    /// ```
    /// use esphome_lights_rs::Beacon;
    ///
    /// let beacon = Beacon::parse("esphome_diyhue_light;a4cf12b3c4d5;Desk;10;-5").unwrap();
    /// assert_eq!(beacon.mac, "a4cf12b3c4d5");
    /// assert_eq!(beacon.calibration.rgb_boost, -5);
    /// assert!(Beacon::parse("esphome_diyhue_light;a4cf12b3c4d5").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let fields: Vec<&str> = text.split(';').collect();
        let [tag, mac, name, ct_boost, rgb_boost] = fields.as_slice() else {
            return Err(Error::InvalidBeacon(format!(
                "expected 5 fields, got {}",
                fields.len()
            )));
        };
        let boost = |raw: &str| {
            raw.trim()
                .parse::<i32>()
                .map_err(|e| Error::InvalidBeacon(format!("bad boost {raw:?}: {e}")))
        };
        if mac.is_empty() {
            return Err(Error::InvalidBeacon("empty mac".into()));
        }
        Ok(Beacon {
            tag: tag.to_string(),
            mac: mac.to_string(),
            name: name.to_string(),
            calibration: Calibration::new(boost(*ct_boost)?, boost(*rgb_boost)?),
        })
    }

    /// Parse the JSON body of the beacon endpoint, whose `state` field
    /// carries the delimited string.
    pub fn from_body(body: &str) -> Result<Self> {
        let envelope: BeaconEnvelope =
            serde_json::from_str(body).map_err(|e| Error::malformed(Self::PATH, e.to_string()))?;
        Self::parse(&envelope.state)
    }

    pub fn is_supported(&self) -> bool {
        self.tag == Self::PROTOCOL_TAG
    }
}

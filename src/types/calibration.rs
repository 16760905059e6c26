//! Per-device brightness calibration.

use serde::{Deserialize, Serialize};

/// Additive brightness offsets applied before a brightness is sent to a
/// device, one for the white channel and one for the color channel.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub ct_boost: i32,
    pub rgb_boost: i32,
}

impl Calibration {
    pub const MAX_BRIGHTNESS: u8 = 255;

    pub fn new(ct_boost: i32, rgb_boost: i32) -> Self {
        Calibration {
            ct_boost,
            rgb_boost,
        }
    }

    /// Add `offset` to `bri`, clamping the result to the device's range.
    ///
    /// # Examples
    ///
    /// ```
    /// use esphome_lights_rs::Calibration;
    ///
    /// assert_eq!(Calibration::boost(200, 20), 220);
    /// assert_eq!(Calibration::boost(250, 20), 255);
    /// assert_eq!(Calibration::boost(10, -20), 0);
    /// ```
    pub fn boost(bri: u8, offset: i32) -> u8 {
        (i64::from(bri) + i64::from(offset)).clamp(0, i64::from(Self::MAX_BRIGHTNESS)) as u8
    }
}

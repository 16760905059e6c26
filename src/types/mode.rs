//! Color mode and alert selectors.

use serde::{Deserialize, Serialize};

/// Which color representation currently governs a light's appearance.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// CIE xy chromaticity
    Xy,
    /// Color temperature in mireds
    Ct,
    /// Hue and saturation
    Hs,
}

/// Alert effect requested for a light.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Alert {
    /// No alert
    #[default]
    None,
    /// A single breathe cycle
    Select,
    /// Breathe cycles for fifteen seconds
    Lselect,
}

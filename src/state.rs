//! Generic light state.

use serde::{Deserialize, Serialize};

use crate::types::{Alert, ColorMode, Xy};

/// A light's state in the generic light representation.
///
/// The same shape serves as a full state (what a read returns, or the last
/// state a caller knows about) and as a delta (only the fields a command
/// changes). Absent fields are skipped when serialized.
///
/// `bri` and `sat` range over 0-255, `hue` over 0-65535, `ct` is in mireds
/// and `transitiontime` in deciseconds.
///
/// # Examples
///
/// ```
/// use esphome_lights_rs::{ColorMode, LightState};
///
/// let delta: LightState = serde_json::from_str(r#"{"on": true, "ct": 320}"#).unwrap();
/// assert_eq!(delta.ct, Some(320));
///
/// let mut known = LightState::default();
/// known.apply(&delta);
/// assert_eq!(known.colormode, Some(ColorMode::Ct));
/// ```
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LightState {
    pub on: Option<bool>,
    pub bri: Option<u8>,
    pub colormode: Option<ColorMode>,
    pub xy: Option<Xy>,
    pub ct: Option<u16>,
    pub hue: Option<u16>,
    pub sat: Option<u8>,
    pub alert: Option<Alert>,
    pub transitiontime: Option<u16>,
}

impl LightState {
    /// A state describing a light that is off.
    pub fn off() -> Self {
        LightState {
            on: Some(false),
            ..Self::default()
        }
    }

    pub fn is_on(&self) -> bool {
        self.on.unwrap_or(false)
    }

    /// The color mode a delta explicitly asks for, if it names a color field.
    ///
    /// `xy` outranks `ct`, which outranks `hue`/`sat`.
    pub fn requested_colormode(&self) -> Option<ColorMode> {
        if self.xy.is_some() {
            Some(ColorMode::Xy)
        } else if self.ct.is_some() {
            Some(ColorMode::Ct)
        } else if self.hue.is_some() || self.sat.is_some() {
            Some(ColorMode::Hs)
        } else {
            None
        }
    }

    /// Merge a delta that was applied successfully into this state.
    ///
    /// Values set in `delta` overwrite values in `self`. A delta without an
    /// explicit `on` turns the light on, and a delta naming a color field
    /// moves `colormode` to that field's mode. `alert` and `transitiontime`
    /// describe a single command and are not retained. A `select` alert
    /// only pulses the light and leaves the state unchanged.
    pub fn apply(&mut self, delta: &LightState) {
        if delta.alert == Some(Alert::Select) {
            return;
        }
        self.on = Some(delta.on.unwrap_or(true));
        if let Some(bri) = delta.bri {
            self.bri = Some(bri);
        }
        if let Some(xy) = delta.xy {
            self.xy = Some(xy);
        }
        if let Some(ct) = delta.ct {
            self.ct = Some(ct);
        }
        if let Some(hue) = delta.hue {
            self.hue = Some(hue);
        }
        if let Some(sat) = delta.sat {
            self.sat = Some(sat);
        }
        if let Some(mode) = delta.requested_colormode() {
            self.colormode = Some(mode);
        }
    }
}

//! Translation of generic light-state deltas into device requests.

use crate::colors::ColorConverter;
use crate::config::DeviceClass;
use crate::registry::{CalibrationStore, DeviceRecord};
use crate::request::{Action, Channel, ControlRequest, Endpoint, Request};
use crate::state::LightState;
use crate::types::{Alert, Calibration, Color, ColorMode};

/// Builds the ordered request sequence implementing a delta on one device.
///
/// Translation performs no I/O: the result depends only on the record, the
/// delta, the caller's last known state, and the calibration lookup. Fields
/// a partial update leaves out are filled from `last_known`, then from the
/// class's initial state.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use esphome_lights_rs::{
///     Calibration, DeviceClass, DeviceRecord, LightState, StandardColors, Translator,
/// };
///
/// let record = DeviceRecord::new("aabbccddeeff", "10.0.0.7", DeviceClass::ColorTemp, "Desk", Calibration::default());
/// let calibrations: HashMap<String, Calibration> = HashMap::new();
/// let translator = Translator::new(&calibrations, &StandardColors);
///
/// let delta = LightState { ct: Some(300), ..LightState::default() };
/// let commands = translator.translate(&record, &delta, &LightState::default());
/// assert_eq!(
///     commands.paths(),
///     ["/light/white_led/turn_on?color_temp=300&transition=0.4"]
/// );
/// ```
pub struct Translator<'a> {
    calibrations: &'a dyn CalibrationStore,
    colors: &'a dyn ColorConverter,
}

impl<'a> Translator<'a> {
    /// Transition applied when the delta does not name one, in seconds.
    pub const DEFAULT_TRANSITION_SECS: f64 = 0.4;

    pub fn new(calibrations: &'a dyn CalibrationStore, colors: &'a dyn ColorConverter) -> Self {
        Translator {
            calibrations,
            colors,
        }
    }

    pub fn translate(
        &self,
        record: &DeviceRecord,
        delta: &LightState,
        last_known: &LightState,
    ) -> ControlRequest {
        self.build(record, delta, last_known, None)
    }

    /// Like [`Translator::translate`], but an `xy` change sends `rgb`
    /// (dimmed to the resolved brightness) instead of converting `xy`.
    pub fn translate_with_rgb(
        &self,
        record: &DeviceRecord,
        delta: &LightState,
        last_known: &LightState,
        rgb: Color,
    ) -> ControlRequest {
        self.build(record, delta, last_known, Some(rgb))
    }

    fn build(
        &self,
        record: &DeviceRecord,
        delta: &LightState,
        last_known: &LightState,
        rgb: Option<Color>,
    ) -> ControlRequest {
        let mut commands = ControlRequest::new();

        // Only the single pulse is wired in firmware; other alerts fall through.
        if delta.alert == Some(Alert::Select) {
            commands.push(Request::new(Endpoint::Alert, Action::TurnOn));
            return commands;
        }

        let class = record.class();
        let known = Known::new(class, last_known);
        let channel = Self::select_channel(class, delta, &known);

        if class == DeviceClass::Rgbw {
            if let Some(peer) = channel.exclusive_peer() {
                commands.push(Request::new(Endpoint::Channel(peer), Action::TurnOff));
            }
        }

        let action = match delta.on {
            Some(false) => Action::TurnOff,
            _ => Action::TurnOn,
        };
        let mut request = Request::new(Endpoint::Channel(channel), action);

        if class.supports_brightness() {
            if let Some(bri) = delta.bri {
                let calibration = self.calibrations.calibration(record.id());
                let offset = Self::boost_offset(class, channel, calibration);
                request.param("brightness", Calibration::boost(bri, offset));
            }
            self.color_params(&mut request, channel, delta, &known, rgb);
            request.param("transition", Self::transition(delta.transitiontime));
        }

        commands.push(request);
        commands
    }

    /// Explicit color fields in the delta win over the remembered mode.
    fn select_channel(class: DeviceClass, delta: &LightState, known: &Known) -> Channel {
        match class {
            DeviceClass::Rgbw => match delta.requested_colormode().or(known.colormode()) {
                Some(ColorMode::Xy) | Some(ColorMode::Hs) => Channel::Color,
                Some(ColorMode::Ct) | None => Channel::White,
            },
            DeviceClass::ColorTemp => Channel::White,
            DeviceClass::Rgb => Channel::Color,
            DeviceClass::Dimmable => Channel::Dimmable,
            DeviceClass::Toggle => Channel::Toggle,
        }
    }

    fn boost_offset(class: DeviceClass, channel: Channel, calibration: Calibration) -> i32 {
        match class {
            DeviceClass::Rgbw => match channel {
                Channel::Color => calibration.rgb_boost,
                Channel::White | Channel::Dimmable | Channel::Toggle => calibration.ct_boost,
            },
            DeviceClass::ColorTemp | DeviceClass::Dimmable => calibration.ct_boost,
            DeviceClass::Rgb => calibration.rgb_boost,
            DeviceClass::Toggle => 0,
        }
    }

    /// At most one of xy, ct, and hue/sat is sent, in that order of priority.
    fn color_params(
        &self,
        request: &mut Request,
        channel: Channel,
        delta: &LightState,
        known: &Known,
        rgb: Option<Color>,
    ) {
        match channel {
            Channel::Color => {
                let bri = delta.bri.unwrap_or_else(|| known.bri());
                let color = if let Some(xy) = delta.xy {
                    match rgb {
                        Some(rgb) => self.colors.scale_rgb_by_brightness(rgb, bri),
                        None => self.colors.xy_to_rgb(xy, bri),
                    }
                } else if delta.hue.is_some() || delta.sat.is_some() {
                    let hue = delta.hue.unwrap_or_else(|| known.hue());
                    let sat = delta.sat.unwrap_or_else(|| known.sat());
                    self.colors.hsv_to_rgb(hue, sat, bri)
                } else {
                    return;
                };
                request
                    .param("r", color.red())
                    .param("g", color.green())
                    .param("b", color.blue());
            }
            Channel::White => {
                if let Some(ct) = delta.ct {
                    request.param("color_temp", ct);
                }
            }
            Channel::Dimmable | Channel::Toggle => {}
        }
    }

    /// Seconds, rendered with at least one decimal place.
    fn transition(transitiontime: Option<u16>) -> String {
        let secs = transitiontime.map_or(Self::DEFAULT_TRANSITION_SECS, |ds| f64::from(ds) / 10.0);
        format!("{secs:?}")
    }
}

/// The caller's last known state backed by the class's initial state.
struct Known<'s> {
    last: &'s LightState,
    initial: LightState,
}

impl<'s> Known<'s> {
    fn new(class: DeviceClass, last: &'s LightState) -> Self {
        Known {
            last,
            initial: class.initial_state(),
        }
    }

    fn colormode(&self) -> Option<ColorMode> {
        self.last.colormode.or(self.initial.colormode)
    }

    fn bri(&self) -> u8 {
        self.last
            .bri
            .or(self.initial.bri)
            .unwrap_or(Calibration::MAX_BRIGHTNESS)
    }

    fn hue(&self) -> u16 {
        self.last.hue.or(self.initial.hue).unwrap_or_default()
    }

    fn sat(&self) -> u8 {
        self.last.sat.or(self.initial.sat).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::colors::StandardColors;
    use crate::types::Xy;

    /// Records the arguments it is called with and returns fixed colors.
    #[derive(Default)]
    struct RecordingColors {
        hsv_calls: Mutex<Vec<(u16, u8, u8)>>,
        xy_calls: Mutex<Vec<(Xy, u8)>>,
        scale_calls: Mutex<Vec<(Color, u8)>>,
    }

    impl ColorConverter for RecordingColors {
        fn rgb_to_xy(&self, _color: Color) -> Xy {
            Xy::default()
        }

        fn xy_to_rgb(&self, xy: Xy, bri: u8) -> Color {
            self.xy_calls.lock().unwrap().push((xy, bri));
            Color::rgb(10, 20, 30)
        }

        fn hsv_to_rgb(&self, hue: u16, sat: u8, bri: u8) -> Color {
            self.hsv_calls.lock().unwrap().push((hue, sat, bri));
            Color::rgb(1, 2, 3)
        }

        fn scale_rgb_by_brightness(&self, color: Color, bri: u8) -> Color {
            self.scale_calls.lock().unwrap().push((color, bri));
            color
        }
    }

    fn record(class: DeviceClass) -> DeviceRecord {
        DeviceRecord::new("aabbccddeeff", "10.0.0.7", class, "Test", Calibration::default())
    }

    fn calibrations(ct_boost: i32, rgb_boost: i32) -> HashMap<String, Calibration> {
        HashMap::from([(
            "aabbccddeeff".to_string(),
            Calibration::new(ct_boost, rgb_boost),
        )])
    }

    fn translate(class: DeviceClass, delta: &LightState, last: &LightState) -> ControlRequest {
        let store = calibrations(20, 40);
        Translator::new(&store, &StandardColors).translate(&record(class), delta, last)
    }

    #[test]
    fn test_rgbw_xy_shuts_white_then_drives_color() {
        let delta = LightState {
            xy: Some(Xy::new(0.3, 0.3)),
            ..LightState::default()
        };
        let commands = translate(DeviceClass::Rgbw, &delta, &LightState::default());
        let requests = commands.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path(), "/light/white_led/turn_off");
        assert_eq!(requests[1].endpoint(), Endpoint::Channel(Channel::Color));
        assert_eq!(requests[1].action(), Action::TurnOn);
        assert!(requests[1].get("r").is_some());
    }

    #[test]
    fn test_rgbw_ct_shuts_color_then_drives_white() {
        let delta = LightState {
            ct: Some(250),
            ..LightState::default()
        };
        let last = LightState {
            colormode: Some(ColorMode::Xy),
            ..LightState::default()
        };
        let paths = translate(DeviceClass::Rgbw, &delta, &last).paths();
        assert_eq!(
            paths,
            [
                "/light/color_led/turn_off",
                "/light/white_led/turn_on?color_temp=250&transition=0.4"
            ]
        );
    }

    #[test]
    fn test_rgbw_falls_back_to_current_colormode() {
        let last = LightState {
            on: Some(true),
            bri: Some(200),
            colormode: Some(ColorMode::Ct),
            ct: Some(300),
            ..LightState::default()
        };
        let delta = LightState {
            bri: Some(220),
            ..LightState::default()
        };
        let paths = translate(DeviceClass::Rgbw, &delta, &last).paths();
        assert_eq!(
            paths,
            [
                "/light/color_led/turn_off",
                "/light/white_led/turn_on?brightness=240&transition=0.4"
            ]
        );

        let store = calibrations(60, 0);
        let commands = Translator::new(&store, &StandardColors).translate(
            &record(DeviceClass::Rgbw),
            &delta,
            &last,
        );
        assert_eq!(commands.requests()[1].get("brightness"), Some("255"));
    }

    #[test]
    fn test_rgbw_hs_mode_uses_color_boost() {
        let last = LightState {
            colormode: Some(ColorMode::Hs),
            ..LightState::default()
        };
        let delta = LightState {
            bri: Some(100),
            ..LightState::default()
        };
        let commands = translate(DeviceClass::Rgbw, &delta, &last);
        assert_eq!(commands.requests()[0].path(), "/light/white_led/turn_off");
        assert_eq!(commands.requests()[1].get("brightness"), Some("140"));
        assert_eq!(commands.requests()[1].get("r"), None);
    }

    #[test]
    fn test_rgbw_without_known_mode_uses_white() {
        let delta = LightState {
            on: Some(true),
            ..LightState::default()
        };
        let paths = translate(DeviceClass::Rgbw, &delta, &LightState::default()).paths();
        assert_eq!(paths[1], "/light/white_led/turn_on?transition=0.4");
    }

    #[test]
    fn test_explicit_field_overrides_remembered_mode() {
        let last = LightState {
            colormode: Some(ColorMode::Ct),
            ..LightState::default()
        };
        let delta = LightState {
            hue: Some(1000),
            ..LightState::default()
        };
        let commands = translate(DeviceClass::Rgbw, &delta, &last);
        assert_eq!(
            commands.requests()[1].endpoint(),
            Endpoint::Channel(Channel::Color)
        );
    }

    #[test]
    fn test_single_channel_classes_never_shut_down_a_peer() {
        for class in [
            DeviceClass::ColorTemp,
            DeviceClass::Rgb,
            DeviceClass::Dimmable,
            DeviceClass::Toggle,
        ] {
            let delta = LightState {
                bri: Some(10),
                xy: Some(Xy::new(0.2, 0.2)),
                ct: Some(300),
                ..LightState::default()
            };
            let commands = translate(class, &delta, &LightState::default());
            assert_eq!(commands.len(), 1, "{class:?}");
        }
    }

    #[test]
    fn test_requests_stay_within_class_channels() {
        let deltas = [
            LightState {
                xy: Some(Xy::new(0.4, 0.4)),
                ..LightState::default()
            },
            LightState {
                ct: Some(400),
                ..LightState::default()
            },
            LightState {
                sat: Some(9),
                ..LightState::default()
            },
            LightState {
                on: Some(false),
                ..LightState::default()
            },
        ];
        for class in DeviceClass::iter() {
            for delta in &deltas {
                for request in translate(class, delta, &LightState::default()).requests() {
                    let Endpoint::Channel(channel) = request.endpoint() else {
                        panic!("unexpected alert request for {class:?}");
                    };
                    assert!(class.channels().contains(&channel), "{class:?} {channel:?}");
                }
            }
        }
    }

    #[test]
    fn test_power_defaults_to_on() {
        let delta = LightState {
            bri: Some(5),
            ..LightState::default()
        };
        let commands = translate(DeviceClass::Dimmable, &delta, &LightState::default());
        assert_eq!(commands.requests()[0].action(), Action::TurnOn);

        let delta = LightState {
            on: Some(false),
            ..LightState::default()
        };
        let commands = translate(DeviceClass::Dimmable, &delta, &LightState::default());
        assert_eq!(
            commands.paths(),
            ["/light/dimmable_led/turn_off?transition=0.4"]
        );
    }

    #[test]
    fn test_dimmable_uses_ct_boost() {
        let delta = LightState {
            bri: Some(100),
            ..LightState::default()
        };
        let commands = translate(DeviceClass::Dimmable, &delta, &LightState::default());
        assert_eq!(commands.requests()[0].get("brightness"), Some("120"));

        let commands = translate(DeviceClass::Rgb, &delta, &LightState::default());
        assert_eq!(commands.requests()[0].get("brightness"), Some("140"));

        let commands = translate(DeviceClass::ColorTemp, &delta, &LightState::default());
        assert_eq!(commands.requests()[0].get("brightness"), Some("120"));
    }

    #[test]
    fn test_brightness_clamps_for_all_inputs() {
        let delta_for = |bri| LightState {
            bri: Some(bri),
            ..LightState::default()
        };
        for boost in [0, 1, 100, 255] {
            let store = calibrations(boost, boost);
            let translator = Translator::new(&store, &StandardColors);
            for bri in 0..=255u8 {
                let commands = translator.translate(
                    &record(DeviceClass::Rgb),
                    &delta_for(bri),
                    &LightState::default(),
                );
                let value: u16 = commands.requests()[0]
                    .get("brightness")
                    .unwrap()
                    .parse()
                    .unwrap();
                assert!(value <= 255);
            }
        }
    }

    #[test]
    fn test_toggle_off_ignores_everything_else() {
        let delta = LightState {
            on: Some(false),
            bri: Some(100),
            xy: Some(Xy::new(0.3, 0.3)),
            ct: Some(300),
            hue: Some(10),
            transitiontime: Some(20),
            ..LightState::default()
        };
        let paths = translate(DeviceClass::Toggle, &delta, &LightState::default()).paths();
        assert_eq!(paths, ["/light/toggle_led/turn_off"]);
    }

    #[test]
    fn test_alert_select_short_circuits_every_class() {
        let delta = LightState {
            alert: Some(Alert::Select),
            on: Some(false),
            bri: Some(100),
            ct: Some(300),
            ..LightState::default()
        };
        for class in DeviceClass::iter() {
            let paths = translate(class, &delta, &LightState::default()).paths();
            assert_eq!(paths, ["/switch/alert/turn_on"], "{class:?}");
        }
    }

    #[test]
    fn test_other_alerts_are_not_wired() {
        let delta = LightState {
            alert: Some(Alert::Lselect),
            ..LightState::default()
        };
        let paths = translate(DeviceClass::Dimmable, &delta, &LightState::default()).paths();
        assert_eq!(paths, ["/light/dimmable_led/turn_on?transition=0.4"]);
    }

    #[test]
    fn test_transition_conversion() {
        let delta = LightState {
            transitiontime: Some(100),
            ..LightState::default()
        };
        let commands = translate(DeviceClass::Dimmable, &delta, &LightState::default());
        assert_eq!(commands.requests()[0].get("transition"), Some("10.0"));

        let delta = LightState {
            transitiontime: Some(5),
            ..LightState::default()
        };
        let commands = translate(DeviceClass::Dimmable, &delta, &LightState::default());
        assert_eq!(commands.requests()[0].get("transition"), Some("0.5"));

        let commands = translate(DeviceClass::Rgb, &LightState::default(), &LightState::default());
        assert_eq!(commands.requests()[0].get("transition"), Some("0.4"));
    }

    #[test]
    fn test_hue_sat_partial_update_fills_from_last_known() {
        let colors = RecordingColors::default();
        let store = calibrations(0, 0);
        let translator = Translator::new(&store, &colors);
        let last = LightState {
            hue: Some(100),
            sat: Some(50),
            bri: Some(200),
            colormode: Some(ColorMode::Hs),
            ..LightState::default()
        };
        let delta = LightState {
            sat: Some(80),
            ..LightState::default()
        };
        let commands = translator.translate(&record(DeviceClass::Rgb), &delta, &last);

        assert_eq!(*colors.hsv_calls.lock().unwrap(), [(100, 80, 200)]);
        assert_eq!(
            commands.paths(),
            ["/light/color_led/turn_on?r=1&g=2&b=3&transition=0.4"]
        );
    }

    #[test]
    fn test_hue_update_prefers_delta_brightness() {
        let colors = RecordingColors::default();
        let store = calibrations(0, 0);
        let translator = Translator::new(&store, &colors);
        let last = LightState {
            hue: Some(100),
            sat: Some(50),
            bri: Some(200),
            ..LightState::default()
        };
        let delta = LightState {
            hue: Some(7),
            bri: Some(30),
            ..LightState::default()
        };
        translator.translate(&record(DeviceClass::Rgbw), &delta, &last);
        assert_eq!(*colors.hsv_calls.lock().unwrap(), [(7, 50, 30)]);
    }

    #[test]
    fn test_hue_without_any_known_state_uses_initial_state() {
        let colors = RecordingColors::default();
        let store = calibrations(0, 0);
        let translator = Translator::new(&store, &colors);
        let delta = LightState {
            hue: Some(7),
            ..LightState::default()
        };
        translator.translate(&record(DeviceClass::Rgb), &delta, &LightState::default());
        assert_eq!(*colors.hsv_calls.lock().unwrap(), [(7, 0, 254)]);
    }

    #[test]
    fn test_xy_wins_over_ct_and_hue() {
        let colors = RecordingColors::default();
        let store = calibrations(0, 0);
        let translator = Translator::new(&store, &colors);
        let delta = LightState {
            xy: Some(Xy::new(0.4, 0.5)),
            ct: Some(300),
            hue: Some(10),
            ..LightState::default()
        };
        let last = LightState {
            bri: Some(90),
            ..LightState::default()
        };
        let commands = translator.translate(&record(DeviceClass::Rgbw), &delta, &last);
        let request = &commands.requests()[1];
        assert_eq!(request.get("color_temp"), None);
        assert_eq!(request.get("r"), Some("10"));
        assert_eq!(*colors.xy_calls.lock().unwrap(), [(Xy::new(0.4, 0.5), 90)]);
        assert!(colors.hsv_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rgb_class_ignores_ct() {
        let delta = LightState {
            ct: Some(300),
            ..LightState::default()
        };
        let paths = translate(DeviceClass::Rgb, &delta, &LightState::default()).paths();
        assert_eq!(paths, ["/light/color_led/turn_on?transition=0.4"]);
    }

    #[test]
    fn test_rgb_override_is_dimmed_not_converted() {
        let colors = RecordingColors::default();
        let store = calibrations(0, 0);
        let translator = Translator::new(&store, &colors);
        let delta = LightState {
            xy: Some(Xy::new(0.4, 0.5)),
            ..LightState::default()
        };
        let last = LightState {
            bri: Some(120),
            ..LightState::default()
        };
        let commands = translator.translate_with_rgb(
            &record(DeviceClass::Rgb),
            &delta,
            &last,
            Color::rgb(200, 100, 50),
        );
        assert!(colors.xy_calls.lock().unwrap().is_empty());
        assert_eq!(
            *colors.scale_calls.lock().unwrap(),
            [(Color::rgb(200, 100, 50), 120)]
        );
        assert_eq!(
            commands.paths(),
            ["/light/color_led/turn_on?r=200&g=100&b=50&transition=0.4"]
        );
    }
}

//! Color space conversions.
//!
//! The translator and reader only call into a [`ColorConverter`]; the
//! default [`StandardColors`] uses the wide-gamut RGB/XYZ matrices with sRGB
//! gamma, and Hue-style HSV scales (hue 0-65535, saturation and value 0-254).

use crate::types::{Color, Xy};

/// Pure color conversion functions.
pub trait ColorConverter: Send + Sync {
    /// Convert an RGB triplet to CIE xy chromaticity.
    fn rgb_to_xy(&self, color: Color) -> Xy;

    /// Convert a chromaticity at the given brightness to RGB.
    fn xy_to_rgb(&self, xy: Xy, bri: u8) -> Color;

    /// Convert hue, saturation, and value to RGB.
    fn hsv_to_rgb(&self, hue: u16, sat: u8, bri: u8) -> Color;

    /// Dim an already computed RGB color to the given brightness.
    fn scale_rgb_by_brightness(&self, color: Color, bri: u8) -> Color;
}

/// The default conversion math.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardColors;

impl StandardColors {
    const HUE_MAX: f64 = 65535.0;
    const HSV_SCALE: f64 = 254.0;

    fn gamma_expand(c: f64) -> f64 {
        if c > 0.04045 {
            ((c + 0.055) / 1.055).powf(2.4)
        } else {
            c / 12.92
        }
    }

    fn gamma_compress(c: f64) -> f64 {
        if c <= 0.0031308 {
            12.92 * c
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    }

    fn to_byte(c: f64) -> u8 {
        (c * 255.0).round().clamp(0.0, 255.0) as u8
    }

    fn round4(v: f64) -> f64 {
        (v * 10_000.0).round() / 10_000.0
    }
}

impl ColorConverter for StandardColors {
    fn rgb_to_xy(&self, color: Color) -> Xy {
        let r = Self::gamma_expand(f64::from(color.red) / 255.0);
        let g = Self::gamma_expand(f64::from(color.green) / 255.0);
        let b = Self::gamma_expand(f64::from(color.blue) / 255.0);

        let x = r * 0.664511 + g * 0.154324 + b * 0.162028;
        let y = r * 0.283881 + g * 0.668433 + b * 0.047685;
        let z = r * 0.000088 + g * 0.072310 + b * 0.986039;

        let sum = x + y + z;
        if sum <= 0.0 {
            return Xy::default();
        }
        Xy::new(Self::round4(x / sum), Self::round4(y / sum))
    }

    fn xy_to_rgb(&self, xy: Xy, bri: u8) -> Color {
        if xy.y() <= 0.0 {
            return Color::new();
        }
        let big_y = f64::from(bri) / 255.0;
        let big_x = big_y / xy.y() * xy.x();
        let big_z = big_y / xy.y() * (1.0 - xy.x() - xy.y());

        let rgb = [
            big_x * 1.656492 - big_y * 0.354851 - big_z * 0.255038,
            -big_x * 0.707196 + big_y * 1.655397 + big_z * 0.036152,
            big_x * 0.051713 - big_y * 0.121364 + big_z * 1.011530,
        ]
        .map(|c| Self::gamma_compress(c).max(0.0));

        // Out-of-gamut colors keep their hue and lose intensity.
        let max = rgb.iter().copied().fold(0.0, f64::max);
        let [r, g, b] = if max > 1.0 {
            rgb.map(|c| c / max)
        } else {
            rgb
        };
        Color::rgb(Self::to_byte(r), Self::to_byte(g), Self::to_byte(b))
    }

    fn hsv_to_rgb(&self, hue: u16, sat: u8, bri: u8) -> Color {
        let h = f64::from(hue) / Self::HUE_MAX * 360.0;
        let s = (f64::from(sat) / Self::HSV_SCALE).min(1.0);
        let v = (f64::from(bri) / Self::HSV_SCALE).min(1.0);

        let c = v * s;
        let sector = h / 60.0;
        let x = c * (1.0 - (sector % 2.0 - 1.0).abs());
        let m = v - c;

        let (r, g, b) = match sector as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Color::rgb(Self::to_byte(r + m), Self::to_byte(g + m), Self::to_byte(b + m))
    }

    fn scale_rgb_by_brightness(&self, color: Color, bri: u8) -> Color {
        let scale = |c: u8| Self::to_byte(f64::from(c) / 255.0 * f64::from(bri) / 255.0);
        Color::rgb(scale(color.red), scale(color.green), scale(color.blue))
    }
}

//! Color and brightness normalization shared by all light integrations.
//!
//! Brightness is the V component of an HSV decomposition, kept as a fraction
//! in `[0, 1]`. Host-facing brightness levels are `0..=255`.

use serde::Deserialize;
use serde::Serialize;

/// An RGB triple with 8-bit channels.
///
/// Serializes as `{"red": r, "green": g, "blue": b}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    fn to_unit(self) -> (f64, f64, f64) {
        (
            f64::from(self.red) / 255.0,
            f64::from(self.green) / 255.0,
            f64::from(self.blue) / 255.0,
        )
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self { red, green, blue }
    }
}

/// HSV with every component in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

/// Convert unit RGB to HSV. Achromatic input yields hue and saturation 0.
#[allow(clippy::many_single_char_names)]
pub fn rgb_to_hsv(r: f64, g: f64, b: f64) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    if max == min {
        return Hsv {
            hue: 0.0,
            saturation: 0.0,
            value: max,
        };
    }

    let delta = max - min;
    let rc = (max - r) / delta;
    let gc = (max - g) / delta;
    let bc = (max - b) / delta;

    let h = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };

    Hsv {
        hue: (h / 6.0).rem_euclid(1.0),
        saturation: delta / max,
        value: max,
    }
}

/// Convert HSV back to unit RGB.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
pub fn hsv_to_rgb(hsv: Hsv) -> (f64, f64, f64) {
    let Hsv {
        hue: h,
        saturation: s,
        value: v,
    } = hsv;

    if s == 0.0 {
        return (v, v, v);
    }

    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// Rescale `rgb` to `brightness` while keeping its hue and saturation.
///
/// Channels are truncated, so repeated normalization may drift by one step.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn normalize(rgb: Rgb, brightness: f64) -> Rgb {
    let (r, g, b) = rgb.to_unit();
    let hsv = Hsv {
        value: brightness.clamp(0.0, 1.0),
        ..rgb_to_hsv(r, g, b)
    };
    let (r, g, b) = hsv_to_rgb(hsv);

    // float to int casts saturate, so out-of-range values land on 0 or 255
    Rgb::new((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

/// Fractional brightness (HSV value) of an RGB triple.
pub fn brightness_of(rgb: Rgb) -> f64 {
    let (r, g, b) = rgb.to_unit();
    rgb_to_hsv(r, g, b).value
}

/// Map a host brightness level (`0..=255`) to a fraction.
pub fn brightness_from_level(level: u8) -> f64 {
    f64::from(level) / 255.0
}

/// Map a fractional brightness to a host level, rounding to nearest.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn level_from_brightness(brightness: f64) -> u8 {
    (brightness.clamp(0.0, 1.0) * 255.0).round() as u8
}

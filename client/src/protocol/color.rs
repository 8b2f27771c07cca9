//! Conversion between the bridge's hue/saturation/brightness space and the
//! `#rrggbb` strings used by color pickers.
//!
//! The bridge stores hue on 16 bits (0..=65535) and saturation/brightness on
//! 0..=254. Both directions quantize, so a round trip is only accurate to one
//! step per channel.

use crate::protocol::models::{Group, Light};

pub const HUE_MAX: f64 = 65535.0;
pub const SAT_MAX: f64 = 254.0;
pub const BRIGHTNESS_MAX: f64 = 254.0;

/// Hue and saturation recovered from a hex color. Brightness is not part of
/// the result: callers keep the current brightness of the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HueSat {
    pub hue: u16,
    pub sat: u8,
}

/// A full color in bridge space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsb {
    pub hue: u16,
    pub sat: u8,
    pub brightness: u8,
}

impl Hsb {
    pub fn new(hue: u16, sat: u8, brightness: u8) -> Self {
        Self {
            hue,
            sat,
            brightness,
        }
    }

    /// Swatch color of a light. Lights without color render as white at
    /// their current brightness.
    pub fn of_light(light: &Light) -> Self {
        Self::swatch(light.has_color, light.hue, light.sat, light.brightness)
    }

    pub fn of_group(group: &Group) -> Self {
        Self::swatch(group.has_color, group.hue, group.sat, group.brightness)
    }

    fn swatch(has_color: bool, hue: Option<u16>, sat: Option<u8>, brightness: u8) -> Self {
        if has_color {
            Self::new(hue.unwrap_or_default(), sat.unwrap_or_default(), brightness)
        } else {
            Self::new(0, 0, brightness)
        }
    }

    pub fn to_hex(self) -> String {
        hsb_to_hex(self.hue, self.sat, self.brightness)
    }

    pub fn to_rgb(self) -> (u8, u8, u8) {
        hsb_to_rgb(self.hue, self.sat, self.brightness)
    }
}

/// Converts a bridge color to its `#rrggbb` representation (lowercase).
pub fn hsb_to_hex(hue: u16, sat: u8, brightness: u8) -> String {
    let (r, g, b) = hsb_to_rgb(hue, sat, brightness);
    format!("#{r:02x}{g:02x}{b:02x}")
}

pub fn hsb_to_rgb(hue: u16, sat: u8, brightness: u8) -> (u8, u8, u8) {
    let h = f64::from(hue) / HUE_MAX;
    let s = (f64::from(sat) / SAT_MAX).min(1.0);
    let v = (f64::from(brightness) / BRIGHTNESS_MAX).min(1.0);

    let scaled = h * 6.0;
    let sector = scaled.floor();
    let f = scaled - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    let (r, g, b) = match (sector as u32) % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    (to_channel(r), to_channel(g), to_channel(b))
}

fn to_channel(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Parses `#rrggbb` (the `#` is optional, digits are case-insensitive) into
/// bridge hue and saturation.
///
/// Malformed input yields `HueSat { hue: 0, sat: 0 }` rather than an error.
pub fn hex_to_hsb(hex: &str) -> HueSat {
    let Some((r, g, b)) = parse_hex(hex) else {
        return HueSat::default();
    };

    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let sat = if max == 0.0 { 0.0 } else { delta / max };

    let sector = if delta == 0.0 {
        0.0
    } else if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    let hue = sector / 6.0;

    HueSat {
        hue: (hue * HUE_MAX).round() as u16,
        sat: (sat * SAT_MAX).round() as u8,
    }
}

/// Whether `hex` is accepted by [`hex_to_hsb`] without falling back.
pub fn is_hex_color(hex: &str) -> bool {
    parse_hex(hex).is_some()
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |at: usize| u8::from_str_radix(&digits[at..at + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_lower_hex_color(s: &str) -> bool {
        s.len() == 7
            && s.starts_with('#')
            && s[1..]
                .bytes()
                .all(|c| c.is_ascii_digit() || (b'a'..=b'f').contains(&c))
    }

    #[test]
    fn known_colors() {
        assert_eq!(hsb_to_hex(0, 254, 254), "#ff0000");
        assert_eq!(hsb_to_hex(0, 0, 254), "#ffffff");
        assert_eq!(hsb_to_hex(0, 0, 0), "#000000");
        assert_eq!(hsb_to_hex(21845, 254, 254), "#00ff00");
        assert_eq!(hsb_to_hex(43690, 254, 254), "#0000ff");
        assert_eq!(hsb_to_hex(65535, 254, 254), "#ff0000");
    }

    #[test]
    fn pure_green_from_hex() {
        assert_eq!(
            hex_to_hsb("#00ff00"),
            HueSat {
                hue: 21845,
                sat: 254
            }
        );
    }

    #[test]
    fn hex_parsing_is_lenient_on_prefix_and_case() {
        assert_eq!(hex_to_hsb("0000FF"), hex_to_hsb("#0000ff"));
        assert_eq!(hex_to_hsb("#FF0000"), HueSat { hue: 0, sat: 254 });
    }

    #[test]
    fn achromatic_colors_have_no_hue() {
        assert_eq!(hex_to_hsb("#ffffff"), HueSat { hue: 0, sat: 0 });
        assert_eq!(hex_to_hsb("#000000"), HueSat { hue: 0, sat: 0 });
        assert_eq!(hex_to_hsb("#808080"), HueSat { hue: 0, sat: 0 });
    }

    #[test]
    fn malformed_hex_falls_back_to_zero() {
        for input in ["", "#", "#fff", "#12345", "#1234567", "zzzzzz", "#12 456", "##123456", "#ééé"] {
            assert_eq!(hex_to_hsb(input), HueSat { hue: 0, sat: 0 }, "{input:?}");
            assert!(!is_hex_color(input), "{input:?}");
        }
        assert!(is_hex_color("A0b1C2"));
    }

    #[test]
    fn output_is_always_a_lowercase_hex_color() {
        for hue in (0..=65535u32).step_by(4099) {
            for sat in (0..=254u8).step_by(31) {
                for bri in (0..=254u8).step_by(53) {
                    let hex = hsb_to_hex(hue as u16, sat, bri);
                    assert!(is_lower_hex_color(&hex), "{hex}");
                }
            }
        }
    }

    #[test]
    fn round_trip_stays_within_one_step() {
        // One 8-bit channel step maps to 65535/(6*255) ≈ 43 hue units at full
        // saturation and 254/255 ≈ 1 saturation unit. The hue step grows as
        // saturation shrinks; at zero saturation hue is lost entirely.
        for hue in (0..65535u32).step_by(997) {
            for sat in (0..=254u8).step_by(7).chain([1, 2, 3, 5, 10, 20, 60]) {
                let back = hex_to_hsb(&hsb_to_hex(hue as u16, sat, 254));
                assert!(
                    (i32::from(back.sat) - i32::from(sat)).abs() <= 1,
                    "sat {sat} -> {}",
                    back.sat
                );
                if sat > 0 {
                    let diff = (i64::from(back.hue) - i64::from(hue)).abs();
                    let wrapped = diff.min(65535 - diff);
                    let step = 65535.0 / (6.0 * 255.0 * (f64::from(sat) / SAT_MAX));
                    assert!(
                        wrapped as f64 <= step.ceil() + 2.0,
                        "hue {hue} sat {sat} -> {}",
                        back.hue
                    );
                }
            }
        }
    }

    #[test]
    fn swatch_of_colorless_light_is_white() {
        let light = Light {
            id: "1".to_string(),
            name: "Hall".to_string(),
            on: true,
            brightness: 254,
            reachable: true,
            has_color: false,
            hue: None,
            sat: None,
        };
        assert_eq!(Hsb::of_light(&light).to_hex(), "#ffffff");
    }
}

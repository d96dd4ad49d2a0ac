//! Hex and CMYK colour model.
//!
//! Every colourable property carries both a hex string and a CMYK tuple.
//! Editing either side recomputes the other, so the pair never drifts apart.

use serde::{Deserialize, Serialize};

/// An 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// CMYK percentages, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cmyk {
    pub c: u8,
    pub m: u8,
    pub y: u8,
    pub k: u8,
}

impl Cmyk {
    pub const BLACK: Cmyk = Cmyk { c: 0, m: 0, y: 0, k: 100 };

    /// Create a CMYK value, clamping each channel to `0..=100`.
    pub fn new(c: u8, m: u8, y: u8, k: u8) -> Self {
        Self {
            c: c.min(100),
            m: m.min(100),
            y: y.min(100),
            k: k.min(100),
        }
    }

    /// Channels as fractions in `0.0..=1.0`, in `c, m, y, k` order.
    pub fn fractions(&self) -> [f64; 4] {
        [
            f64::from(self.c) / 100.0,
            f64::from(self.m) / 100.0,
            f64::from(self.y) / 100.0,
            f64::from(self.k) / 100.0,
        ]
    }
}

/// Which representation the user last edited, and which one export uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Hex,
    Cmyk,
}

/// Returns true for `#` followed by exactly six hex digits, in any case.
pub fn is_valid_hex(hex: &str) -> bool {
    match hex.strip_prefix('#') {
        Some(digits) => digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Parse a `#rrggbb` (or bare `rrggbb`) string.
pub fn parse_hex(hex: &str) -> Option<Rgb> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let packed = u32::from_str_radix(digits, 16).ok()?;
    Some(Rgb {
        r: ((packed >> 16) & 0xff) as u8,
        g: ((packed >> 8) & 0xff) as u8,
        b: (packed & 0xff) as u8,
    })
}

/// Parse a hex string, falling back to black when it is malformed.
pub fn hex_to_rgb(hex: &str) -> Rgb {
    parse_hex(hex).unwrap_or(Rgb::BLACK)
}

/// Format as lowercase `#rrggbb`.
pub fn rgb_to_hex(rgb: Rgb) -> String {
    let packed = (u32::from(rgb.r) << 16) | (u32::from(rgb.g) << 8) | u32::from(rgb.b);
    format!("#{packed:06x}")
}

/// Convert RGB to CMYK percentages.
///
/// Pure black short-circuits to `(0, 0, 0, 100)`.
pub fn rgb_to_cmyk(rgb: Rgb) -> Cmyk {
    let r = f64::from(rgb.r) / 255.0;
    let g = f64::from(rgb.g) / 255.0;
    let b = f64::from(rgb.b) / 255.0;

    let max = r.max(g).max(b);
    if max <= 0.0 {
        return Cmyk::BLACK;
    }
    let k = 1.0 - max;

    let channel = |v: f64| percent((1.0 - v - k) / (1.0 - k));
    Cmyk {
        c: channel(r),
        m: channel(g),
        y: channel(b),
        k: percent(k),
    }
}

/// Convert CMYK percentages to RGB.
pub fn cmyk_to_rgb(cmyk: Cmyk) -> Rgb {
    let [c, m, y, k] = cmyk.fractions();
    let channel = |v: f64| (255.0 * (1.0 - v) * (1.0 - k)).round().clamp(0.0, 255.0) as u8;
    Rgb {
        r: channel(c),
        g: channel(m),
        b: channel(y),
    }
}

pub fn hex_to_cmyk(hex: &str) -> Cmyk {
    rgb_to_cmyk(hex_to_rgb(hex))
}

pub fn cmyk_to_hex(cmyk: Cmyk) -> String {
    rgb_to_hex(cmyk_to_rgb(cmyk))
}

fn percent(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

/// A colour carried in both representations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swatch {
    pub hex: String,
    pub cmyk: Cmyk,
}

impl Swatch {
    /// Build from a hex string, deriving the CMYK side.
    pub fn from_hex(hex: &str) -> Self {
        Self {
            hex: hex.to_string(),
            cmyk: hex_to_cmyk(hex),
        }
    }

    /// Build from CMYK, deriving the hex side.
    pub fn from_cmyk(cmyk: Cmyk) -> Self {
        Self {
            hex: cmyk_to_hex(cmyk),
            cmyk,
        }
    }

    /// Set the hex side and recompute CMYK.
    ///
    /// Returns false and leaves the swatch untouched when `hex` is not
    /// a valid `#rrggbb` string.
    pub fn set_hex(&mut self, hex: &str) -> bool {
        if !is_valid_hex(hex) {
            return false;
        }
        self.hex = hex.to_string();
        self.cmyk = hex_to_cmyk(hex);
        true
    }

    /// Set the CMYK side and recompute hex.
    pub fn set_cmyk(&mut self, cmyk: Cmyk) {
        let cmyk = Cmyk::new(cmyk.c, cmyk.m, cmyk.y, cmyk.k);
        self.hex = cmyk_to_hex(cmyk);
        self.cmyk = cmyk;
    }

    pub fn rgb(&self) -> Rgb {
        hex_to_rgb(&self.hex)
    }
}

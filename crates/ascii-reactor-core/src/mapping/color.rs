//! Color values, interpolation and contrast.
//!
//! Colors travel through the pipeline as typed values and are only rendered
//! to strings (`#rrggbb` or `hsl(h, s%, l%)`) at the edges. Every fallible
//! operation here degrades to [`Color::FALLBACK`] instead of failing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ColorParseError;

/// Luminance above which a hex color gets black text instead of white
const CONTRAST_LUMINANCE: f32 = 186.0;

/// 8-bit RGB triple
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a strict `#rrggbb` string
    pub fn parse_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| ColorParseError::InvalidHex(s.to_string()))?;

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ColorParseError::InvalidHex(s.to_string()))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Per-channel linear interpolation, `t` clamped to 0-1
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let mix = |a: u8, b: u8| {
            let (a, b) = (a as f32, b as f32);
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// BT.601 weighted luminance on the 0-255 scale
    pub fn luminance(self) -> f32 {
        self.r as f32 * 0.299 + self.g as f32 * 0.587 + self.b as f32 * 0.114
    }

    /// Convert to integer hue (degrees), saturation and lightness (percent)
    pub fn to_hsl(self) -> (u16, u8, u8) {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let lightness = (max + min) / 2.0;

        if max == min {
            return (0, 0, (lightness * 100.0).round() as u8);
        }

        let delta = max - min;
        let saturation = if lightness > 0.5 {
            delta / (2.0 - max - min)
        } else {
            delta / (max + min)
        };

        let hue = if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };

        (
            ((hue * 60.0).round() as u16) % 360,
            (saturation * 100.0).round() as u8,
            (lightness * 100.0).round() as u8,
        )
    }

    /// Build from hue (degrees) and saturation/lightness (percent)
    pub fn from_hsl(hue: u16, saturation: u8, lightness: u8) -> Self {
        let h = (hue % 360) as f32 / 360.0;
        let s = saturation.min(100) as f32 / 100.0;
        let l = lightness.min(100) as f32 / 100.0;

        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return Self::new(v, v, v);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        let channel = |mut t: f32| {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        };

        Self::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
    }

    /// Channels as 0-1 floats, handy for renderers
    pub fn to_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// A renderable color: either a hex triple or an HSL triple
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    Hex(Rgb),
    Hsl {
        hue: u16,
        saturation: u8,
        lightness: u8,
    },
}

impl Color {
    /// Returned whenever an input color cannot be used
    pub const FALLBACK: Color = Color::Hex(Rgb::BLACK);
    pub const BLACK: Color = Color::Hex(Rgb::BLACK);
    pub const WHITE: Color = Color::Hex(Rgb::WHITE);

    /// Fully saturated, half-lightness hue
    pub fn vivid(hue: u16) -> Self {
        Color::Hsl {
            hue: hue % 360,
            saturation: 100,
            lightness: 50,
        }
    }

    pub fn to_rgb(self) -> Rgb {
        match self {
            Color::Hex(rgb) => rgb,
            Color::Hsl {
                hue,
                saturation,
                lightness,
            } => Rgb::from_hsl(hue, saturation, lightness),
        }
    }

    pub fn to_hsl(self) -> (u16, u8, u8) {
        match self {
            Color::Hex(rgb) => rgb.to_hsl(),
            Color::Hsl {
                hue,
                saturation,
                lightness,
            } => (hue, saturation, lightness),
        }
    }

}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Hex(rgb)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Hex(Rgb { r, g, b }) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
            Color::Hsl {
                hue,
                saturation,
                lightness,
            } => write!(f, "hsl({}, {}%, {}%)", hue, saturation, lightness),
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColorParseError::Empty);
        }
        if s.starts_with('#') {
            return Rgb::parse_hex(s).map(Color::Hex);
        }
        if let Some(body) = s.strip_prefix("hsl(").and_then(|b| b.strip_suffix(')')) {
            return parse_hsl_body(body).ok_or_else(|| ColorParseError::InvalidHsl(s.to_string()));
        }
        Err(ColorParseError::UnknownFormat(s.to_string()))
    }
}

fn parse_hsl_body(body: &str) -> Option<Color> {
    let mut parts = body.split(',').map(str::trim);
    let hue: u16 = parts.next()?.parse().ok()?;
    let saturation: u8 = parts.next()?.strip_suffix('%')?.trim().parse().ok()?;
    let lightness: u8 = parts.next()?.strip_suffix('%')?.trim().parse().ok()?;
    if parts.next().is_some() || hue >= 360 || saturation > 100 || lightness > 100 {
        return None;
    }
    Some(Color::Hsl {
        hue,
        saturation,
        lightness,
    })
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Linear per-channel interpolation between two hex colors.
///
/// An HSL color on either side is not a valid hex input and yields
/// [`Color::FALLBACK`].
pub fn interpolate_hex_color(from: Color, to: Color, t: f32) -> Color {
    match (from, to) {
        (Color::Hex(a), Color::Hex(b)) => Color::Hex(a.lerp(b, t)),
        _ => {
            warn!("cannot interpolate {} to {} as hex", from, to);
            Color::FALLBACK
        }
    }
}

/// Component-wise HSL interpolation; hex inputs are converted first
pub fn interpolate_hsl_color(from: Color, to: Color, t: f32) -> Color {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let (h1, s1, l1) = from.to_hsl();
    let (h2, s2, l2) = to.to_hsl();
    let mix = |a: f32, b: f32| (a + (b - a) * t).round();

    Color::Hsl {
        hue: mix(h1 as f32, h2 as f32) as u16 % 360,
        saturation: mix(s1 as f32, s2 as f32) as u8,
        lightness: mix(l1 as f32, l2 as f32) as u8,
    }
}

/// Black or white for hex colors by luminance, opposite hue for HSL colors
pub fn contrasting_color(color: Color) -> Color {
    match color {
        Color::Hex(rgb) if rgb.luminance() > CONTRAST_LUMINANCE => Color::BLACK,
        Color::Hex(_) => Color::WHITE,
        Color::Hsl { hue, .. } => Color::vivid((hue + 180) % 360),
    }
}

/// Theme colors the frequency mapper draws from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThemePalette {
    pub foreground: Rgb,
    pub background: Rgb,
    pub blue: Option<Rgb>,
    pub green: Option<Rgb>,
    pub yellow: Option<Rgb>,
    pub red: Option<Rgb>,
    pub gray: Option<Rgb>,
}

impl Default for ThemePalette {
    /// The grayscale theme
    fn default() -> Self {
        Self {
            foreground: Rgb::new(0xe9, 0xe9, 0xe9),
            background: Rgb::BLACK,
            blue: Some(Rgb::new(0x4e, 0x4e, 0x4e)),
            green: Some(Rgb::new(0xa3, 0xa3, 0xa3)),
            yellow: Some(Rgb::new(0xaf, 0xaf, 0xaf)),
            red: Some(Rgb::new(0x28, 0x28, 0x28)),
            gray: Some(Rgb::new(0x86, 0x86, 0x86)),
        }
    }
}

impl ThemePalette {
    /// Accent colors in mapping order (blue, green, yellow, red), missing ones skipped
    pub fn accents(&self) -> Vec<Rgb> {
        [self.blue, self.green, self.yellow, self.red]
            .into_iter()
            .flatten()
            .collect()
    }
}

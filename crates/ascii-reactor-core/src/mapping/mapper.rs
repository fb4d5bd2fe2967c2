//! Feature-to-parameter curves.
//!
//! Turns a [`FeatureSet`] into raw (unsmoothed) renderable values:
//! - glyph and cell sizes from amplitude, through a raised sine-squared bell
//! - character and background colors from the spectral centroid, through a
//!   narrow logarithmic window, either across theme accents or as a hue

use std::f32::consts::PI;

use tracing::trace;

use crate::audio::FeatureSet;

use super::color::{
    contrasting_color, interpolate_hex_color, interpolate_hsl_color, Color, Rgb, ThemePalette,
};

/// Amplitude below which sizes snap to their resting values
pub const SILENCE_THRESHOLD: f32 = 0.01;

pub const FONT_SIZE_MIN: f32 = 64.0;
pub const FONT_SIZE_MAX: f32 = 78.0;
pub const CELL_SIZE_MIN: f32 = 5.0;
pub const CELL_SIZE_MAX: f32 = 12.0;

/// Frequency window (Hz) the color ramp spans, on a log scale
pub const COLOR_WINDOW_LOW_HZ: f32 = 535.0;
pub const COLOR_WINDOW_HIGH_HZ: f32 = 600.0;

const AUDIBLE_LOW_HZ: f32 = 20.0;
const AUDIBLE_HIGH_HZ: f32 = 20_000.0;

/// Weight given to the new color when blending HSL output with the last one
const HSL_BLEND: f32 = 0.9;

/// Bell curve: `min` at amplitude 0 and 1, `max` at 0.5.
///
/// Non-finite amplitude maps to `min`.
pub fn map_amplitude_to_size(amplitude: f32, min: f32, max: f32) -> f32 {
    if !amplitude.is_finite() {
        return min;
    }
    let s = (amplitude * PI).sin();
    min + (max - min) * s * s
}

/// Position of `frequency` inside the color window, 0..=1
pub fn normalize_log_frequency(frequency: f32) -> f32 {
    if !frequency.is_finite() {
        return 0.0;
    }
    let f = frequency.clamp(AUDIBLE_LOW_HZ, AUDIBLE_HIGH_HZ);
    let low = COLOR_WINDOW_LOW_HZ.ln();
    let high = COLOR_WINDOW_HIGH_HZ.ln();
    ((f.ln() - low) / (high - low)).clamp(0.0, 1.0)
}

/// Which surface a mapped color is for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorLayer {
    Character,
    Background,
}

/// Map a frequency to a color.
///
/// With a palette, the normalized frequency walks across its accents
/// (rotated left by two for the background layer) and blends between
/// neighbours. Without one, it becomes a hue, and the background is the
/// contrasting color of the character hue.
pub fn map_frequency_to_color(frequency: f32, palette: Option<&ThemePalette>, layer: ColorLayer) -> Color {
    let n = normalize_log_frequency(frequency);

    let Some(palette) = palette else {
        let character = Color::vivid((n * 360.0).round() as u16);
        return match layer {
            ColorLayer::Character => character,
            ColorLayer::Background => contrasting_color(character),
        };
    };

    let mut accents = palette.accents();
    if accents.is_empty() {
        return Color::FALLBACK;
    }
    if layer == ColorLayer::Background {
        let len = accents.len();
        accents.rotate_left(2 % len);
    }
    ramp(&accents, n)
}

/// Piecewise-linear walk over `stops` at position `n` in 0..=1
fn ramp(stops: &[Rgb], n: f32) -> Color {
    let last = stops.len().saturating_sub(1);
    let scaled = n * last as f32;
    let idx = (scaled.floor() as usize).min(last);
    let t = scaled - idx as f32;
    let next = (idx + 1).min(last);
    interpolate_hex_color(stops[idx].into(), stops[next].into(), t)
}

/// One tick's mapped values, before smoothing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MappedParameters {
    pub font_size: f32,
    pub cell_size: f32,
    pub character_color: Color,
    pub background_color: Color,
}

/// Stateful mapper: remembers the last HSL colors for blending
#[derive(Clone, Debug)]
pub struct ParameterMapper {
    palette: ThemePalette,
    last_character: Color,
    last_background: Color,
}

impl ParameterMapper {
    pub fn new(palette: ThemePalette) -> Self {
        Self {
            palette,
            last_character: Color::BLACK,
            last_background: Color::WHITE,
        }
    }

    pub fn palette(&self) -> &ThemePalette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: ThemePalette) {
        self.palette = palette;
    }

    pub fn map(&mut self, features: &FeatureSet, use_theme_colors: bool) -> MappedParameters {
        let amplitude = features.amplitude;
        let (font_size, cell_size) = if amplitude < SILENCE_THRESHOLD || !amplitude.is_finite() {
            (FONT_SIZE_MIN, CELL_SIZE_MIN)
        } else {
            let font = map_amplitude_to_size(amplitude * (1.0 + features.adsr.attack), FONT_SIZE_MIN, FONT_SIZE_MAX);
            let cell = map_amplitude_to_size(
                amplitude * (1.0 + features.frequency_bands.low),
                CELL_SIZE_MIN,
                CELL_SIZE_MAX,
            );
            (font.round(), cell.round())
        };

        let frequency = features.spectral_centroid;
        let (character_color, background_color) = if use_theme_colors {
            (
                map_frequency_to_color(frequency, Some(&self.palette), ColorLayer::Character),
                map_frequency_to_color(frequency, Some(&self.palette), ColorLayer::Background),
            )
        } else {
            let character = map_frequency_to_color(frequency, None, ColorLayer::Character);
            let background = map_frequency_to_color(frequency, None, ColorLayer::Background);
            self.last_character = interpolate_hsl_color(self.last_character, character, HSL_BLEND);
            self.last_background = interpolate_hsl_color(self.last_background, background, HSL_BLEND);
            (self.last_character, self.last_background)
        };

        trace!(font_size, cell_size, %character_color, %background_color, "mapped");

        MappedParameters {
            font_size,
            cell_size,
            character_color,
            background_color,
        }
    }

    /// Forget blended colors
    pub fn reset(&mut self) {
        self.last_character = Color::BLACK;
        self.last_background = Color::WHITE;
    }
}

impl Default for ParameterMapper {
    fn default() -> Self {
        Self::new(ThemePalette::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn size_curve_peaks_in_the_middle() {
        assert!(close(map_amplitude_to_size(0.0, 64.0, 78.0), 64.0));
        assert!(close(map_amplitude_to_size(0.5, 64.0, 78.0), 78.0));
        assert!(close(map_amplitude_to_size(1.0, 64.0, 78.0), 64.0));
        assert!(close(
            map_amplitude_to_size(0.25, 64.0, 78.0),
            map_amplitude_to_size(0.75, 64.0, 78.0)
        ));
        assert_eq!(map_amplitude_to_size(f32::NAN, 64.0, 78.0), 64.0);
    }

    #[test]
    fn log_window_clamps() {
        assert_eq!(normalize_log_frequency(100.0), 0.0);
        assert_eq!(normalize_log_frequency(535.0), 0.0);
        assert!(close(normalize_log_frequency(600.0), 1.0));
        assert_eq!(normalize_log_frequency(50_000.0), 1.0);
        assert_eq!(normalize_log_frequency(f32::NAN), 0.0);
        let mid = normalize_log_frequency(566.0);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn theme_ramp_hits_endpoints() {
        let palette = ThemePalette::default();
        let low = map_frequency_to_color(20.0, Some(&palette), ColorLayer::Character);
        let high = map_frequency_to_color(20_000.0, Some(&palette), ColorLayer::Character);
        assert_eq!(low.to_string(), "#4e4e4e");
        assert_eq!(high.to_string(), "#282828");
    }

    #[test]
    fn theme_ramp_blends_neighbouring_accents() {
        let palette = ThemePalette::default();
        let accents = palette.accents();
        // A sixth of the way up the window is halfway between the first two of four stops
        let freq = (535f32.ln() + (600f32.ln() - 535f32.ln()) / 6.0).exp();
        let got = map_frequency_to_color(freq, Some(&palette), ColorLayer::Character).to_rgb();
        let want = interpolate_hex_color(accents[0].into(), accents[1].into(), 0.5).to_rgb();
        assert!(got.r.abs_diff(want.r) <= 1);
        assert!(got.g.abs_diff(want.g) <= 1);
        assert!(got.b.abs_diff(want.b) <= 1);
    }

    #[test]
    fn background_ramp_is_rotated() {
        let palette = ThemePalette::default();
        // [blue, green, yellow, red] rotated by two starts at yellow
        let low = map_frequency_to_color(20.0, Some(&palette), ColorLayer::Background);
        assert_eq!(low.to_string(), "#afafaf");
    }

    #[test]
    fn empty_theme_falls_back() {
        let palette = ThemePalette {
            blue: None,
            green: None,
            yellow: None,
            red: None,
            ..ThemePalette::default()
        };
        let c = map_frequency_to_color(560.0, Some(&palette), ColorLayer::Character);
        assert_eq!(c, Color::FALLBACK);
    }

    #[test]
    fn single_accent_theme_is_constant() {
        let palette = ThemePalette {
            blue: None,
            green: None,
            yellow: None,
            ..ThemePalette::default()
        };
        let a = map_frequency_to_color(20.0, Some(&palette), ColorLayer::Background);
        let b = map_frequency_to_color(20_000.0, Some(&palette), ColorLayer::Character);
        assert_eq!(a, b);
    }

    #[test]
    fn hue_mode_uses_contrast_for_background() {
        let character = map_frequency_to_color(20.0, None, ColorLayer::Character);
        let background = map_frequency_to_color(20.0, None, ColorLayer::Background);
        assert_eq!(character.to_string(), "hsl(0, 100%, 50%)");
        assert_eq!(background.to_string(), "hsl(180, 100%, 50%)");
    }

    #[test]
    fn silence_snaps_sizes() {
        let mut mapper = ParameterMapper::default();
        let mut features = FeatureSet::neutral();
        features.amplitude = 0.005;
        let mapped = mapper.map(&features, true);
        assert_eq!(mapped.font_size, FONT_SIZE_MIN);
        assert_eq!(mapped.cell_size, CELL_SIZE_MIN);
    }

    #[test]
    fn loud_frame_grows_sizes() {
        let mut mapper = ParameterMapper::default();
        let mut features = FeatureSet::neutral();
        features.amplitude = 0.4;
        let mapped = mapper.map(&features, true);
        assert!(mapped.font_size > FONT_SIZE_MIN);
        assert!(mapped.cell_size > CELL_SIZE_MIN);
        assert_eq!(mapped.font_size.fract(), 0.0);
    }

    #[test]
    fn hue_mode_blends_toward_new_color() {
        let mut mapper = ParameterMapper::default();
        let features = FeatureSet::neutral();
        let first = mapper.map(&features, false);
        // From black (hsl 0,0,0) 90% of the way to hsl(0,100,50)
        assert_eq!(first.character_color.to_string(), "hsl(0, 90%, 45%)");
        let second = mapper.map(&features, false);
        let (hue, saturation, lightness) = second.character_color.to_hsl();
        assert_eq!((hue, saturation), (0, 99));
        assert!((49..=50).contains(&lightness));
    }
}

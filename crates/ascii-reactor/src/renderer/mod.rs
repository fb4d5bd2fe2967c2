//! ASCII grid renderer.
//!
//! Reads only [`RenderableParameters`] plus per-frame band energies: glyph
//! size from `font_size`, grid pitch from `cell_size`, colors from the two
//! color fields. Brightness per cell comes from the band that owns its row
//! band (low at the bottom, high at the top) rippled by a slow wave.

mod diagnostics;

pub use diagnostics::{Diagnostics, OverlayContext};

use ascii_reactor_core::view::CameraRig;
use ascii_reactor_core::{Color, FrequencyBands, RenderableParameters};
use nannou::prelude::*;

/// Dark to bright
const GLYPH_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Notification display duration (3 seconds at 60fps)
const NOTIFICATION_FRAMES: u32 = 180;

fn to_nannou(color: Color) -> Rgb {
    let [r, g, b] = color.to_rgb().to_f32();
    rgb(r, g, b)
}

/// Glyph for a 0-1 brightness
pub fn glyph_for(brightness: f32) -> char {
    let b = if brightness.is_finite() { brightness.clamp(0.0, 1.0) } else { 0.0 };
    let idx = (b * (GLYPH_RAMP.len() - 1) as f32).round() as usize;
    GLYPH_RAMP[idx.min(GLYPH_RAMP.len() - 1)]
}

/// Distance between cell centers in pixels
pub fn cell_pitch(params: &RenderableParameters) -> f32 {
    (params.font_size as f32 * 0.25 + params.cell_size as f32 * 2.0).max(4.0)
}

pub struct AsciiRenderer {
    notification_text: Option<String>,
    notification_frames: u32,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self {
            notification_text: None,
            notification_frames: 0,
        }
    }

    /// Shows a notification message for 3 seconds
    pub fn show_notification(&mut self, text: String) {
        self.notification_text = Some(text);
        self.notification_frames = NOTIFICATION_FRAMES;
    }

    pub fn update(&mut self) {
        if self.notification_frames > 0 {
            self.notification_frames -= 1;
            if self.notification_frames == 0 {
                self.notification_text = None;
            }
        }
    }

    pub fn draw(
        &self,
        draw: &Draw,
        bounds: Rect,
        params: &RenderableParameters,
        bands: &FrequencyBands,
        rig: &CameraRig,
        time: f32,
    ) {
        draw.background().color(to_nannou(params.background_color));

        let pitch = cell_pitch(params);
        let cols = (bounds.w() / pitch).floor().max(1.0) as usize;
        let rows = (bounds.h() / pitch).floor().max(1.0) as usize;
        let glyph_size = (params.font_size as f32 * 0.3).round().max(6.0) as u32;
        let color = to_nannou(params.character_color);

        // The camera position shifts the ripple so view changes are visible
        let offset = rig.position[0] * 1.7 + rig.position[1] * 0.9;
        let speed = if rig.lamp_on { 2.0 } else { 0.7 };

        let left = bounds.left() + pitch * 0.5;
        let bottom = bounds.bottom() + pitch * 0.5;

        for row in 0..rows {
            let height = row as f32 / rows as f32;
            let level = if height < 0.33 {
                bands.low
            } else if height < 0.66 {
                bands.mid
            } else {
                bands.high
            };

            let mut line = String::with_capacity(cols);
            for col in 0..cols {
                let wave = ((col as f32 * 0.35 + row as f32 * 0.2 + time * speed + offset).sin() + 1.0) * 0.5;
                line.push(glyph_for(level * 1.5 * wave));
            }

            draw.text(&line)
                .x_y(left + (cols as f32 - 1.0) * pitch * 0.5, bottom + row as f32 * pitch)
                .w_h(cols as f32 * pitch, pitch)
                .center_justify()
                .font_size(glyph_size)
                .color(color);
        }
    }

    pub fn draw_notification(&self, draw: &Draw, bounds: Rect) {
        let Some(text) = &self.notification_text else {
            return;
        };
        let alpha = (self.notification_frames as f32 / 30.0).min(1.0);
        let y = bounds.bottom() + 40.0;

        draw.rect()
            .x_y(0.0, y)
            .w_h(bounds.w() * 0.6, 36.0)
            .color(rgba(0.0, 0.0, 0.0, 0.7 * alpha));
        draw.text(text)
            .x_y(0.0, y)
            .w_h(bounds.w() * 0.6, 36.0)
            .center_justify()
            .font_size(18)
            .color(rgba(1.0, 1.0, 1.0, alpha));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_ramp_ends() {
        assert_eq!(glyph_for(0.0), ' ');
        assert_eq!(glyph_for(1.0), '@');
        assert_eq!(glyph_for(7.0), '@');
        assert_eq!(glyph_for(f32::NAN), ' ');
    }

    #[test]
    fn test_pitch_grows_with_sizes() {
        let rest = RenderableParameters::default();
        let loud = RenderableParameters {
            font_size: 78,
            cell_size: 12,
            ..rest
        };
        assert!(cell_pitch(&loud) > cell_pitch(&rest));
    }
}

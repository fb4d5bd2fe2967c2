//! Diagnostics overlay.
//!
//! Shows the last frame report, the active view and preset, and FPS.

use std::time::Instant;

use ascii_reactor_core::FrameReport;
use nannou::prelude::*;

pub struct Diagnostics {
    pub visible: bool,
    /// Last frame time for FPS calculation
    last_frame_time: Instant,
    /// Smoothed FPS display value
    display_fps: f32,
    /// Frames left to keep the beat marker lit
    beat_hold: u32,
}

/// Context lines that do not come from the frame report
pub struct OverlayContext<'a> {
    pub animator_enabled: bool,
    pub sound_animation: bool,
    pub theme_colors: bool,
    /// Beat energy reference the running energy is compared against
    pub energy_reference: f32,
    pub view: &'a str,
    pub preset: &'a str,
}

impl Diagnostics {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            last_frame_time: Instant::now(),
            display_fps: 0.0,
            beat_hold: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn update(&mut self, report: Option<&FrameReport>) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f32();
        let current_fps = if delta > 0.0 { 1.0 / delta } else { 0.0 };
        // Smooth FPS with exponential moving average
        self.display_fps = self.display_fps * 0.9 + current_fps * 0.1;
        self.last_frame_time = now;

        if report.is_some_and(|r| r.is_beat) {
            self.beat_hold = 6;
        } else {
            self.beat_hold = self.beat_hold.saturating_sub(1);
        }
    }

    pub fn draw(&self, draw: &Draw, bounds: Rect, report: Option<&FrameReport>, ctx: &OverlayContext<'_>) {
        if !self.visible {
            return;
        }

        let on_off = |b: bool| if b { "on" } else { "off" };
        let mut lines = vec![
            format!("fps {:.0}", self.display_fps),
            format!(
                "animator {} | sound views {} | theme {}",
                on_off(ctx.animator_enabled),
                on_off(ctx.sound_animation),
                on_off(ctx.theme_colors)
            ),
            format!("view: {}", ctx.view),
            format!("preset: {}", ctx.preset),
        ];

        match report {
            Some(r) => {
                lines.push(format!("source {}", if r.source_active { "active" } else { "none" }));
                lines.push(format!(
                    "bands L {:.2} M {:.2} H {:.2}",
                    r.frequency_bands.low, r.frequency_bands.mid, r.frequency_bands.high
                ));
                lines.push(format!("flux {:.3} novelty {:+.3}", r.spectral_flux, r.novelty));
                lines.push(format!(
                    "energy {:.3} / ref {:.2}{}",
                    r.running_energy,
                    ctx.energy_reference,
                    if r.energy_over_reference { " HOT" } else { "" }
                ));
                lines.push(format!("dominant {:.0} Hz", r.dominant_frequency));
                lines.push(format!(
                    "font {} cell {} fg {} bg {}",
                    r.params.font_size, r.params.cell_size, r.params.character_color, r.params.background_color
                ));
                if let Some(direction) = r.direction {
                    lines.push(format!("view -> {}", direction));
                }
            }
            None => lines.push("no frame yet".to_string()),
        }

        let padding = 12.0;
        let line_height = 18.0;
        let width = 420.0;
        let height = line_height * lines.len() as f32 + padding * 2.0;
        let x = bounds.left() + width / 2.0 + padding;
        let y = bounds.top() - height / 2.0 - padding;

        draw.rect().x_y(x, y).w_h(width, height).color(rgba(0.0, 0.0, 0.0, 0.75));

        if self.beat_hold > 0 {
            draw.ellipse()
                .x_y(x + width / 2.0 - padding - 6.0, y + height / 2.0 - padding - 6.0)
                .radius(6.0)
                .color(rgb(1.0, 0.3, 0.2));
        }

        let top = y + height / 2.0 - padding - line_height / 2.0;
        for (i, line) in lines.iter().enumerate() {
            draw.text(line)
                .x_y(x, top - i as f32 * line_height)
                .w_h(width - padding * 2.0, line_height)
                .left_justify()
                .font_size(13)
                .color(rgb(0.9, 0.9, 0.9));
        }
    }
}

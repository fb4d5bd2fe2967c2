//! Runtime-tunable settings for the reactive pipeline.
//!
//! Every setter clamps into the supported range and logs when it had to.

use std::time::Duration;

use tracing::warn;

use crate::params::UpdateFlags;

pub const THRESHOLD_MIN: f32 = 0.05;
pub const THRESHOLD_MAX: f32 = 0.99;
pub const FREQUENCY_MIN_HZ: f32 = 20.0;
pub const FREQUENCY_MAX_HZ: f32 = 20_000.0;
pub const CAMERA_COOLDOWN_MIN: Duration = Duration::from_millis(20);
pub const CAMERA_COOLDOWN_MAX: Duration = Duration::from_millis(2000);
pub const FLUSH_PERIOD_MIN: Duration = Duration::from_millis(1);

const DEFAULT_BEAT_THRESHOLD: f32 = 0.99;
const DEFAULT_NOVELTY_THRESHOLD: f32 = 0.5;
const DEFAULT_ENERGY_THRESHOLD: f32 = 0.5;
const DEFAULT_FREQUENCY_THRESHOLD_HZ: f32 = 4000.0;
const DEFAULT_CAMERA_COOLDOWN: Duration = Duration::from_millis(60);
const DEFAULT_DIRECTION_COOLDOWN: Duration = Duration::from_millis(60);
const DEFAULT_SAMPLE_RATE_HZ: f32 = 44_100.0;
const DEFAULT_BUFFER_CAPACITY: usize = 3;
const DEFAULT_FLUSH_PERIOD: Duration = Duration::from_millis(10);

fn clamp_logged(name: &str, value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        warn!(setting = name, value, fallback, "non-finite value ignored");
        return fallback;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(setting = name, value, clamped, "value out of range, clamped");
    }
    clamped
}

fn clamp_duration_logged(name: &str, value: Duration, min: Duration, max: Duration) -> Duration {
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(
            setting = name,
            value_ms = value.as_millis() as u64,
            clamped_ms = clamped.as_millis() as u64,
            "value out of range, clamped"
        );
    }
    clamped
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReactiveConfig {
    beat_threshold: f32,
    novelty_threshold: f32,
    beat_energy_threshold: f32,
    frequency_threshold_hz: f32,
    camera_change_cooldown: Duration,
    direction_change_cooldown: Duration,
    update_flags: UpdateFlags,
    sound_animation_enabled: bool,
    use_theme_colors: bool,
    sample_rate_hz: f32,
    buffer_capacity: usize,
    flush_period: Duration,
}

impl Default for ReactiveConfig {
    fn default() -> Self {
        Self {
            beat_threshold: DEFAULT_BEAT_THRESHOLD,
            novelty_threshold: DEFAULT_NOVELTY_THRESHOLD,
            beat_energy_threshold: DEFAULT_ENERGY_THRESHOLD,
            frequency_threshold_hz: DEFAULT_FREQUENCY_THRESHOLD_HZ,
            camera_change_cooldown: DEFAULT_CAMERA_COOLDOWN,
            direction_change_cooldown: DEFAULT_DIRECTION_COOLDOWN,
            update_flags: UpdateFlags::ALL,
            sound_animation_enabled: true,
            use_theme_colors: true,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            flush_period: DEFAULT_FLUSH_PERIOD,
        }
    }
}

impl ReactiveConfig {
    pub fn beat_threshold(&self) -> f32 {
        self.beat_threshold
    }
    pub fn set_beat_threshold(&mut self, value: f32) {
        self.beat_threshold = clamp_logged("beat_threshold", value, THRESHOLD_MIN, THRESHOLD_MAX, self.beat_threshold);
    }

    pub fn novelty_threshold(&self) -> f32 {
        self.novelty_threshold
    }
    pub fn set_novelty_threshold(&mut self, value: f32) {
        self.novelty_threshold = clamp_logged(
            "novelty_threshold",
            value,
            THRESHOLD_MIN,
            THRESHOLD_MAX,
            self.novelty_threshold,
        );
    }

    /// Reference level for the running energy; informational only
    pub fn beat_energy_threshold(&self) -> f32 {
        self.beat_energy_threshold
    }
    pub fn set_beat_energy_threshold(&mut self, value: f32) {
        self.beat_energy_threshold = clamp_logged(
            "beat_energy_threshold",
            value,
            THRESHOLD_MIN,
            THRESHOLD_MAX,
            self.beat_energy_threshold,
        );
    }

    /// Dominant frequency above which sound-driven cycling goes forward
    pub fn frequency_threshold_hz(&self) -> f32 {
        self.frequency_threshold_hz
    }
    pub fn set_frequency_threshold_hz(&mut self, value: f32) {
        self.frequency_threshold_hz = clamp_logged(
            "frequency_threshold_hz",
            value,
            FREQUENCY_MIN_HZ,
            FREQUENCY_MAX_HZ,
            self.frequency_threshold_hz,
        );
    }

    pub fn camera_change_cooldown(&self) -> Duration {
        self.camera_change_cooldown
    }
    pub fn set_camera_change_cooldown(&mut self, value: Duration) {
        self.camera_change_cooldown =
            clamp_duration_logged("camera_change_cooldown", value, CAMERA_COOLDOWN_MIN, CAMERA_COOLDOWN_MAX);
    }

    pub fn direction_change_cooldown(&self) -> Duration {
        self.direction_change_cooldown
    }
    pub fn set_direction_change_cooldown(&mut self, value: Duration) {
        self.direction_change_cooldown = value;
    }

    pub fn update_flags(&self) -> UpdateFlags {
        self.update_flags
    }
    pub fn set_update_flags(&mut self, flags: UpdateFlags) {
        self.update_flags = flags;
    }

    pub fn sound_animation_enabled(&self) -> bool {
        self.sound_animation_enabled
    }
    pub fn set_sound_animation_enabled(&mut self, enabled: bool) {
        self.sound_animation_enabled = enabled;
    }

    pub fn use_theme_colors(&self) -> bool {
        self.use_theme_colors
    }
    pub fn set_use_theme_colors(&mut self, enabled: bool) {
        self.use_theme_colors = enabled;
    }

    /// Sample rate the spectrum was computed at; scales bin index to Hz
    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate_hz
    }
    pub fn set_sample_rate_hz(&mut self, value: f32) {
        if value.is_finite() && value > 0.0 {
            self.sample_rate_hz = value;
        } else {
            warn!(value, "invalid sample rate ignored");
        }
    }

    /// Window length of every smoothing buffer
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }
    pub fn set_buffer_capacity(&mut self, value: usize) {
        if value == 0 {
            warn!("smoothing buffer capacity 0 raised to 1");
        }
        self.buffer_capacity = value.max(1);
    }

    /// Interval between flushes into the parameter sink
    pub fn flush_period(&self) -> Duration {
        self.flush_period
    }
    pub fn set_flush_period(&mut self, value: Duration) {
        if value < FLUSH_PERIOD_MIN {
            warn!("flush period raised to {:?}", FLUSH_PERIOD_MIN);
        }
        self.flush_period = value.max(FLUSH_PERIOD_MIN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product() {
        let config = ReactiveConfig::default();
        assert_eq!(config.beat_threshold(), 0.99);
        assert_eq!(config.novelty_threshold(), 0.5);
        assert_eq!(config.frequency_threshold_hz(), 4000.0);
        assert_eq!(config.camera_change_cooldown(), Duration::from_millis(60));
        assert_eq!(config.direction_change_cooldown(), Duration::from_millis(60));
        assert_eq!(config.buffer_capacity(), 3);
        assert_eq!(config.flush_period(), Duration::from_millis(10));
        assert!(config.sound_animation_enabled());
        assert!(config.use_theme_colors());
        assert_eq!(config.update_flags(), UpdateFlags::ALL);
    }

    #[test]
    fn setters_clamp() {
        let mut config = ReactiveConfig::default();
        config.set_beat_threshold(2.0);
        assert_eq!(config.beat_threshold(), THRESHOLD_MAX);
        config.set_novelty_threshold(0.0);
        assert_eq!(config.novelty_threshold(), THRESHOLD_MIN);
        config.set_frequency_threshold_hz(5.0);
        assert_eq!(config.frequency_threshold_hz(), FREQUENCY_MIN_HZ);
        config.set_camera_change_cooldown(Duration::from_secs(10));
        assert_eq!(config.camera_change_cooldown(), CAMERA_COOLDOWN_MAX);
        config.set_camera_change_cooldown(Duration::ZERO);
        assert_eq!(config.camera_change_cooldown(), CAMERA_COOLDOWN_MIN);
        config.set_buffer_capacity(0);
        assert_eq!(config.buffer_capacity(), 1);
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let mut config = ReactiveConfig::default();
        config.set_beat_energy_threshold(0.3);
        config.set_beat_energy_threshold(f32::NAN);
        assert_eq!(config.beat_energy_threshold(), 0.3);
        config.set_sample_rate_hz(-1.0);
        assert_eq!(config.sample_rate_hz(), 44_100.0);
    }
}

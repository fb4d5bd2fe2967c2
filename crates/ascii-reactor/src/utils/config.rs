//! Configuration file management.
//!
//! Handles loading and saving user preferences to `~/.ascii-reactor.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ascii_reactor_core::mapping::{Rgb, ThemePalette};
use ascii_reactor_core::{ReactiveConfig, UpdateFlags};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_DEVICE_TIMEOUT_SECS: u64 = 3;
const DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_TEMPLATE: &str = r##"# ascii-reactor configuration file

# Log level: error, warn, info, debug, trace (RUST_LOG overrides this)
# log_level = "info"

# Timeout in seconds when opening an audio device (default: 3)
# device_timeout_secs = 3

# Last selected audio device (auto-saved)
# last_device = "Device Name"
# last_device_is_input = true

# =============================================================================
# Triggers
# =============================================================================

# beat_threshold = 0.99            # Amplitude a beat must exceed (0.05 - 0.99)
# novelty_threshold = 0.5          # Spectral novelty that counts as a trigger
# beat_energy_threshold = 0.5      # Reference level for running energy
# frequency_threshold_hz = 4000    # Above: next view, below: previous view
# camera_change_cooldown_ms = 60   # 20 - 2000
# direction_change_cooldown_ms = 60
# sound_animation_enabled = true

# =============================================================================
# Output
# =============================================================================

# use_theme_colors = true
# update_font_size = true
# update_cell_size = true
# update_character_color = true
# update_background_color = true
# buffer_capacity = 3              # Smoothing window in frames
# flush_period_ms = 10
# sample_rate_hz = 44100

# =============================================================================
# Theme
# =============================================================================

# [theme]
# foreground = "#E9E9E9"
# background = "#000000"
# blue = "#4E4E4E"
# green = "#A3A3A3"
# yellow = "#AFAFAF"
# red = "#282828"
# gray = "#868686"
"##;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Decode(#[from] toml::de::Error),
    #[error("cannot encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Palette colors as written in the file
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ThemeConfig {
    pub foreground: Option<String>,
    pub background: Option<String>,
    pub blue: Option<String>,
    pub green: Option<String>,
    pub yellow: Option<String>,
    pub red: Option<String>,
    pub gray: Option<String>,
}

/// Unset or invalid entries keep the default; invalid ones are logged
fn theme_color(name: &str, value: &Option<String>, default: Rgb) -> Rgb {
    match value.as_deref().map(Rgb::parse_hex) {
        None => default,
        Some(Ok(rgb)) => rgb,
        Some(Err(e)) => {
            warn!(color = name, "{}; keeping default", e);
            default
        }
    }
}

fn theme_accent(name: &str, value: &Option<String>, default: Option<Rgb>) -> Option<Rgb> {
    match default {
        Some(d) => Some(theme_color(name, value, d)),
        None => value.as_deref().and_then(|v| Rgb::parse_hex(v).ok()),
    }
}

impl ThemeConfig {
    pub fn palette(&self) -> ThemePalette {
        let base = ThemePalette::default();
        ThemePalette {
            foreground: theme_color("foreground", &self.foreground, base.foreground),
            background: theme_color("background", &self.background, base.background),
            blue: theme_accent("blue", &self.blue, base.blue),
            green: theme_accent("green", &self.green, base.green),
            yellow: theme_accent("yellow", &self.yellow, base.yellow),
            red: theme_accent("red", &self.red, base.red),
            gray: theme_accent("gray", &self.gray, base.gray),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub log_level: Option<String>,
    pub last_device: Option<String>,
    pub last_device_is_input: Option<bool>,
    pub device_timeout_secs: Option<u64>,

    // Triggers
    pub beat_threshold: Option<f32>,
    pub novelty_threshold: Option<f32>,
    pub beat_energy_threshold: Option<f32>,
    pub frequency_threshold_hz: Option<f32>,
    pub camera_change_cooldown_ms: Option<u64>,
    pub direction_change_cooldown_ms: Option<u64>,
    pub sound_animation_enabled: Option<bool>,

    // Output
    pub use_theme_colors: Option<bool>,
    pub update_font_size: Option<bool>,
    pub update_cell_size: Option<bool>,
    pub update_character_color: Option<bool>,
    pub update_background_color: Option<bool>,
    pub buffer_capacity: Option<usize>,
    pub flush_period_ms: Option<u64>,
    pub sample_rate_hz: Option<f32>,

    pub theme: Option<ThemeConfig>,
}

impl Config {
    fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".ascii-reactor.toml"))
    }

    /// Load from the home directory, writing the template on first run.
    /// Any failure yields defaults.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_or_init(&path),
            None => Self::default(),
        }
    }

    /// Load `path`, writing the template first if it does not exist
    pub fn load_or_init(path: &Path) -> Self {
        if !path.exists() {
            match fs::write(&path, CONFIG_TEMPLATE) {
                Ok(()) => info!("created config template at {:?}", path),
                Err(e) => warn!("cannot write config template to {:?}: {}", path, e),
            }
        }

        Self::load_from(path).unwrap_or_else(|e| {
            warn!("{}; using defaults", e);
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(path) = Self::path() {
            let content = toml::to_string(self)?;
            fs::write(&path, content)?;
            info!("config saved to {:?}", path);
        }
        Ok(())
    }

    pub fn set_device(&mut self, name: &str, is_input: bool) {
        self.last_device = Some(name.to_string());
        self.last_device_is_input = Some(is_input);
        if let Err(e) = self.save() {
            warn!("{}", e);
        }
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn device_timeout_secs(&self) -> u64 {
        self.device_timeout_secs.unwrap_or(DEFAULT_DEVICE_TIMEOUT_SECS)
    }

    pub fn palette(&self) -> ThemePalette {
        self.theme.as_ref().map(ThemeConfig::palette).unwrap_or_default()
    }

    /// Runtime settings, with out-of-range values clamped by the setters
    pub fn reactive(&self) -> ReactiveConfig {
        let mut config = ReactiveConfig::default();

        if let Some(v) = self.beat_threshold {
            config.set_beat_threshold(v);
        }
        if let Some(v) = self.novelty_threshold {
            config.set_novelty_threshold(v);
        }
        if let Some(v) = self.beat_energy_threshold {
            config.set_beat_energy_threshold(v);
        }
        if let Some(v) = self.frequency_threshold_hz {
            config.set_frequency_threshold_hz(v);
        }
        if let Some(v) = self.camera_change_cooldown_ms {
            config.set_camera_change_cooldown(Duration::from_millis(v));
        }
        if let Some(v) = self.direction_change_cooldown_ms {
            config.set_direction_change_cooldown(Duration::from_millis(v));
        }
        if let Some(v) = self.sound_animation_enabled {
            config.set_sound_animation_enabled(v);
        }
        if let Some(v) = self.use_theme_colors {
            config.set_use_theme_colors(v);
        }
        if let Some(v) = self.buffer_capacity {
            config.set_buffer_capacity(v);
        }
        if let Some(v) = self.flush_period_ms {
            config.set_flush_period(Duration::from_millis(v));
        }
        if let Some(v) = self.sample_rate_hz {
            config.set_sample_rate_hz(v);
        }

        let defaults = UpdateFlags::ALL;
        config.set_update_flags(UpdateFlags {
            font_size: self.update_font_size.unwrap_or(defaults.font_size),
            cell_size: self.update_cell_size.unwrap_or(defaults.cell_size),
            character_color: self.update_character_color.unwrap_or(defaults.character_color),
            background_color: self.update_background_color.unwrap_or(defaults.background_color),
        });

        config
    }
}

//! Audio-reactive parameter engine for ascii-reactor
//!
//! Analyses one audio frame per display tick, detects beats and spectral
//! novelty, maps the result to glyph sizes and colors, smooths it, and
//! flushes it to a parameter sink on a fixed interval. Beats and novelty also
//! step a camera view sequence through a dual-cooldown dispatcher.
//!
//! No windowing or audio device code lives here; the host supplies frames
//! through [`FrameSource`] and the clock as a [`std::time::Duration`].

pub mod animator;
pub mod audio;
pub mod config;
pub mod error;
pub mod frame;
pub mod mapping;
pub mod params;
pub mod schedule;
pub mod smoothing;
pub mod view;

pub use animator::{AnimatorLoop, FrameReport};
pub use audio::{FeatureExtractor, FeatureSet, FrequencyBands};
pub use config::ReactiveConfig;
pub use error::ColorParseError;
pub use frame::{AudioFrame, FrameBuffer, FrameSource, NoSource, SPECTRUM_SIZE, WAVEFORM_SIZE};
pub use mapping::{Color, Rgb, ThemePalette};
pub use params::{ParameterSink, ParameterStore, RenderableParameters, UpdateFlags};
pub use schedule::{CancellationToken, FrameGate, FrameTicket, ScheduledTask};
pub use smoothing::SmoothingBuffer;
pub use view::{Direction, PresetCycler, TriggerDispatcher, ViewConfig, ViewCycler, ViewDeck};

//! Per-tick audio analysis: stateless feature extraction plus the stateful
//! beat, novelty and energy trackers that run on top of it.

mod detectors;
mod features;

pub use detectors::{
    beat_cooldown, BeatDetector, BeatPhase, Detection, DetectorState, EnergyTracker, NoveltyTracker,
    BEAT_COOLDOWN_FLOOR,
};
pub use features::{
    adsr, amplitude, dominant_frequency, frequency_bands, spectral_centroid, spectral_flux, Adsr,
    FeatureExtractor, FeatureSet, FrequencyBands,
};

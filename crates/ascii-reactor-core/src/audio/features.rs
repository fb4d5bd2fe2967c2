//! Per-frame feature extraction.
//!
//! Turns one [`AudioFrame`] into a [`FeatureSet`]: amplitude, dominant
//! frequency, spectral centroid, three-way band split, a coarse ADSR estimate
//! and spectral flux. Everything is a pure function of the frame except flux,
//! which needs the previous spectrum.
//!
//! Non-finite samples are read as 0 and negative spectrum magnitudes as 0, so
//! no NaN leaves this module.

use crate::frame::{AudioFrame, SPECTRUM_SIZE};

/// Fraction of the spectrum (by bin count) that counts as "low"
const LOW_BAND_END: f32 = 0.1;
/// Fraction of the spectrum where "mid" ends and "high" begins
const MID_BAND_END: f32 = 0.5;

/// Share of total spectral energy in each of three bands (sums to 1)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrequencyBands {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

impl FrequencyBands {
    /// Used when the spectrum carries no energy
    pub const EVEN: FrequencyBands = FrequencyBands {
        low: 1.0 / 3.0,
        mid: 1.0 / 3.0,
        high: 1.0 / 3.0,
    };
}

impl Default for FrequencyBands {
    fn default() -> Self {
        Self::EVEN
    }
}

/// Envelope shape as fractions of the frame length.
///
/// This is a single-frame heuristic, not an envelope follower: attack is where
/// the signal first reaches 90% of its peak, release is how far from the end
/// it last sits above 10%, and decay/sustain are fixed 0.2/0.3 shares of the
/// span in between.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

/// Everything the mapper and detectors read for one tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureSet {
    /// Mean absolute waveform value
    pub amplitude: f32,
    /// Frequency of the loudest bin in Hz
    pub dominant_frequency: f32,
    /// Magnitude-weighted mean bin index (midpoint when silent)
    pub spectral_centroid: f32,
    pub frequency_bands: FrequencyBands,
    pub adsr: Adsr,
    /// Positive-only change from the previous spectrum
    pub spectral_flux: f32,
    /// Flux minus its own smoothed trend; filled in by the novelty tracker
    pub novelty: f32,
}

impl FeatureSet {
    /// Silence-equivalent features for ticks without an active source.
    ///
    /// The centroid sits at the midpoint of a stock spectrum, the same value
    /// the extractor reports for a silent one.
    pub fn neutral() -> Self {
        Self {
            amplitude: 0.0,
            dominant_frequency: 0.0,
            spectral_centroid: midpoint_bin(SPECTRUM_SIZE),
            frequency_bands: FrequencyBands::EVEN,
            adsr: Adsr::default(),
            spectral_flux: 0.0,
            novelty: 0.0,
        }
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Centroid used when a spectrum of `bins` carries no energy
fn midpoint_bin(bins: usize) -> f32 {
    bins as f32 / 2.0
}

#[inline]
fn sample(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[inline]
fn magnitude(v: f32) -> f32 {
    sample(v).max(0.0)
}

/// Mean absolute value; 0 for an empty or silent waveform
pub fn amplitude(waveform: &[f32]) -> f32 {
    if waveform.is_empty() {
        return 0.0;
    }
    waveform.iter().map(|&v| sample(v).abs()).sum::<f32>() / waveform.len() as f32
}

/// Frequency of the loudest bin, assuming bins span 0..Nyquist.
///
/// Ties go to the lowest bin, so an all-zero spectrum reports 0 Hz.
pub fn dominant_frequency(spectrum: &[f32], sample_rate_hz: f32) -> f32 {
    if spectrum.is_empty() || !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
        return 0.0;
    }

    let mut max_idx = 0;
    let mut max_val = magnitude(spectrum[0]);
    for (i, &v) in spectrum.iter().enumerate().skip(1) {
        let m = magnitude(v);
        if m > max_val {
            max_val = m;
            max_idx = i;
        }
    }

    let nyquist = sample_rate_hz / 2.0;
    max_idx as f32 / spectrum.len() as f32 * nyquist
}

/// Magnitude-weighted mean bin index, `None` when the spectrum is silent
pub fn spectral_centroid(spectrum: &[f32]) -> Option<f32> {
    let (weighted, total) = spectrum
        .iter()
        .enumerate()
        .fold((0.0f32, 0.0f32), |(w, t), (i, &v)| {
            let m = magnitude(v);
            (w + i as f32 * m, t + m)
        });

    (total > 0.0 && total.is_finite()).then(|| weighted / total)
}

/// Split into first 10% / next 40% / last 50% of bins by energy share
pub fn frequency_bands(spectrum: &[f32]) -> FrequencyBands {
    let len = spectrum.len();
    let low_end = (len as f32 * LOW_BAND_END).floor() as usize;
    let mid_end = (len as f32 * MID_BAND_END).floor() as usize;

    let sum = |bins: &[f32]| bins.iter().map(|&v| magnitude(v)).sum::<f32>();
    let low = sum(&spectrum[..low_end]);
    let mid = sum(&spectrum[low_end..mid_end]);
    let high = sum(&spectrum[mid_end..]);

    let total = low + mid + high;
    if !total.is_finite() || total <= 0.0 {
        return FrequencyBands::EVEN;
    }

    FrequencyBands {
        low: low / total,
        mid: mid / total,
        high: high / total,
    }
}

/// Coarse single-frame ADSR estimate, see [`Adsr`]
pub fn adsr(waveform: &[f32]) -> Adsr {
    let len = waveform.len();
    if len == 0 {
        return Adsr::default();
    }

    let peak = waveform
        .iter()
        .map(|&v| sample(v))
        .fold(f32::NEG_INFINITY, f32::max);

    let attack_idx = waveform
        .iter()
        .position(|&v| sample(v) >= peak * 0.9)
        .unwrap_or(0);
    let release_idx = waveform
        .iter()
        .rposition(|&v| sample(v) >= peak * 0.1)
        .unwrap_or(len - 1);

    let n = len as f32;
    let span = release_idx.saturating_sub(attack_idx) as f32 / n;

    Adsr {
        attack: attack_idx as f32 / n,
        decay: span * 0.2,
        sustain: span * 0.3,
        release: (len - release_idx) as f32 / n,
    }
}

/// Sum of positive bin-wise increases since `previous`.
///
/// No previous frame, or one of a different size, counts as no change.
pub fn spectral_flux(current: &[f32], previous: Option<&[f32]>) -> f32 {
    match previous {
        Some(prev) if prev.len() == current.len() => current
            .iter()
            .zip(prev)
            .map(|(&c, &p)| (magnitude(c) - magnitude(p)).max(0.0))
            .sum(),
        _ => 0.0,
    }
}

/// Stateful wrapper that remembers the previous spectrum for flux
pub struct FeatureExtractor {
    previous_spectrum: Vec<f32>,
    has_previous: bool,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            previous_spectrum: Vec::new(),
            has_previous: false,
        }
    }

    /// Extract features for one tick and remember this spectrum.
    /// `novelty` is left at 0 for the novelty tracker to fill in.
    pub fn extract(&mut self, frame: AudioFrame<'_>, sample_rate_hz: f32) -> FeatureSet {
        let previous = self
            .has_previous
            .then_some(self.previous_spectrum.as_slice());
        let spectral_flux = spectral_flux(frame.spectrum, previous);

        let spectral_centroid = spectral_centroid(frame.spectrum)
            .unwrap_or_else(|| midpoint_bin(frame.spectrum.len()));

        let features = FeatureSet {
            amplitude: amplitude(frame.waveform),
            dominant_frequency: dominant_frequency(frame.spectrum, sample_rate_hz),
            spectral_centroid,
            frequency_bands: frequency_bands(frame.spectrum),
            adsr: adsr(frame.waveform),
            spectral_flux,
            novelty: 0.0,
        };

        // Reuse the allocation once the frame size settles
        self.previous_spectrum.clear();
        self.previous_spectrum
            .extend(frame.spectrum.iter().map(|&v| magnitude(v)));
        self.has_previous = true;

        features
    }

    /// Forget the previous spectrum so the next flux is 0
    pub fn reset(&mut self) {
        self.previous_spectrum.clear();
        self.has_previous = false;
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::WAVEFORM_SIZE;

    const EPS: f32 = 1e-5;

    #[test]
    fn amplitude_is_mean_absolute_value() {
        assert_eq!(amplitude(&[0.5, -0.5, 0.25, -0.25]), 0.375);
        assert_eq!(amplitude(&[]), 0.0);
    }

    #[test]
    fn amplitude_zero_only_for_silence() {
        assert_eq!(amplitude(&[0.0; 256]), 0.0);
        let mut w = vec![0.0; 256];
        w[17] = -1e-3;
        assert!(amplitude(&w) > 0.0);
    }

    #[test]
    fn amplitude_ignores_non_finite_samples() {
        assert_eq!(amplitude(&[f32::NAN, 1.0]), 0.5);
        assert_eq!(amplitude(&[f32::INFINITY, 0.0]), 0.0);
    }

    #[test]
    fn dominant_frequency_scales_by_nyquist() {
        let mut spectrum = vec![0.0; 1024];
        spectrum[512] = 1.0;
        let hz = dominant_frequency(&spectrum, 44_100.0);
        assert!((hz - 11_025.0).abs() < EPS);
    }

    #[test]
    fn dominant_frequency_prefers_lowest_tie() {
        assert_eq!(dominant_frequency(&[0.0; 64], 48_000.0), 0.0);
        assert_eq!(dominant_frequency(&[], 48_000.0), 0.0);
    }

    #[test]
    fn centroid_weights_bins_by_magnitude() {
        let c = spectral_centroid(&[0.0, 1.0, 0.0, 1.0]).unwrap();
        assert!((c - 2.0).abs() < EPS);
        assert_eq!(spectral_centroid(&[0.0; 8]), None);
        assert_eq!(spectral_centroid(&[]), None);
    }

    #[test]
    fn extractor_falls_back_to_midpoint_centroid() {
        let mut extractor = FeatureExtractor::new();
        let spectrum = vec![0.0; 100];
        let f = extractor.extract(AudioFrame::new(&[0.0; 4], &spectrum), 44_100.0);
        assert_eq!(f.spectral_centroid, 50.0);
    }

    #[test]
    fn neutral_centroid_matches_silent_stock_frame() {
        let mut extractor = FeatureExtractor::new();
        let waveform = vec![0.0; WAVEFORM_SIZE];
        let spectrum = vec![0.0; SPECTRUM_SIZE];
        let silent = extractor.extract(AudioFrame::new(&waveform, &spectrum), 44_100.0);
        assert_eq!(FeatureSet::neutral().spectral_centroid, silent.spectral_centroid);
    }

    #[test]
    fn bands_partition_ten_forty_fifty() {
        let spectrum = vec![1.0; 100];
        let bands = frequency_bands(&spectrum);
        assert!((bands.low - 0.1).abs() < EPS);
        assert!((bands.mid - 0.4).abs() < EPS);
        assert!((bands.high - 0.5).abs() < EPS);
    }

    #[test]
    fn bands_sum_to_one_even_when_silent() {
        for spectrum in [vec![0.0; 1024], vec![], vec![0.3; 7], vec![2.0, 0.0, 5.0]] {
            let b = frequency_bands(&spectrum);
            assert!((b.low + b.mid + b.high - 1.0).abs() < EPS, "{:?}", spectrum);
        }
        assert_eq!(frequency_bands(&[0.0; 16]), FrequencyBands::EVEN);
    }

    #[test]
    fn adsr_locates_attack_and_release() {
        // Peak at index 2, last sample above 10% at index 5
        let w = [0.0, 0.5, 1.0, 0.8, 0.4, 0.2, 0.05, 0.0, 0.0, 0.0];
        let env = adsr(&w);
        assert!((env.attack - 0.2).abs() < EPS);
        assert!((env.release - 0.5).abs() < EPS);
        assert!((env.decay - 0.3 * 0.2).abs() < EPS);
        assert!((env.sustain - 0.3 * 0.3).abs() < EPS);
    }

    #[test]
    fn adsr_of_empty_frame_is_zero() {
        assert_eq!(adsr(&[]), Adsr::default());
    }

    #[test]
    fn flux_counts_only_increases() {
        let prev = [1.0, 1.0, 1.0];
        let cur = [2.0, 0.0, 1.5];
        assert!((spectral_flux(&cur, Some(&prev)) - 1.5).abs() < EPS);
        assert_eq!(spectral_flux(&cur, None), 0.0);
        assert_eq!(spectral_flux(&cur, Some(&[1.0])), 0.0);
    }

    #[test]
    fn extractor_flux_is_zero_on_first_tick() {
        let mut extractor = FeatureExtractor::new();
        let waveform = [0.1; 8];
        let a = [0.0, 1.0, 0.0, 0.0];
        let b = [0.5, 1.0, 2.0, 0.0];

        let first = extractor.extract(AudioFrame::new(&waveform, &a), 44_100.0);
        assert_eq!(first.spectral_flux, 0.0);

        let second = extractor.extract(AudioFrame::new(&waveform, &b), 44_100.0);
        assert!((second.spectral_flux - 2.5).abs() < EPS);

        extractor.reset();
        let third = extractor.extract(AudioFrame::new(&waveform, &a), 44_100.0);
        assert_eq!(third.spectral_flux, 0.0);
    }
}

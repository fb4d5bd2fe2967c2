//! Hann-windowed FFT producing the magnitude spectrum the core consumes.

use std::sync::Arc;

use ascii_reactor_core::SPECTRUM_SIZE;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Samples per transform; yields `SPECTRUM_SIZE` positive-frequency bins
pub const FFT_SIZE: usize = SPECTRUM_SIZE * 2;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex<f32>>,
    fft_window: Vec<f32>,
    /// Turns raw magnitudes into ~0-1 for a full-scale sine
    scale: f32,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        // Pre-compute Hann window
        let fft_window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / FFT_SIZE as f32).cos()))
            .collect();
        let window_sum: f32 = fft_window.iter().sum();

        Self {
            fft,
            fft_buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            fft_window,
            scale: 2.0 / window_sum,
        }
    }

    /// Transform the newest `FFT_SIZE` samples (zero-padded at the front if
    /// short) into `spectrum`.
    pub fn process(&mut self, samples: &[f32], spectrum: &mut [f32]) {
        let start = samples.len().saturating_sub(FFT_SIZE);
        let recent = &samples[start..];
        let pad = FFT_SIZE - recent.len();

        for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex::new(sample * self.fft_window[i], 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        for (out, bin) in spectrum.iter_mut().zip(self.fft_buffer.iter().take(SPECTRUM_SIZE)) {
            *out = (bin.norm() * self.scale).min(1.0);
        }
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

//! Device-free frame provider for demos and headless machines.
//!
//! Generates a drifting tone with randomly spaced kicks and a little noise,
//! then runs it through the same spectrum analysis as live capture.

use ascii_reactor_core::{AudioFrame, FrameSource, SPECTRUM_SIZE, WAVEFORM_SIZE};
use rand::Rng;

use super::spectrum::{SpectrumAnalyzer, FFT_SIZE};

/// Samples generated per frame at 60 fps
const SAMPLES_PER_FRAME: usize = 735;

pub struct SyntheticSource {
    sample_rate: f32,
    phase: f32,
    tone_hz: f32,
    kick_env: f32,
    samples_to_kick: usize,
    history: Vec<f32>,
    analyzer: SpectrumAnalyzer,
    waveform: Vec<f32>,
    spectrum: Vec<f32>,
}

impl SyntheticSource {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            tone_hz: 440.0,
            kick_env: 0.0,
            samples_to_kick: 0,
            history: vec![0.0; FFT_SIZE],
            analyzer: SpectrumAnalyzer::new(),
            waveform: vec![0.0; WAVEFORM_SIZE],
            spectrum: vec![0.0; SPECTRUM_SIZE],
        }
    }

    fn generate(&mut self) {
        let mut rng = rand::rng();

        // Wander the tone between ~200 Hz and ~6 kHz
        self.tone_hz = (self.tone_hz * rng.random_range(0.97..1.03)).clamp(200.0, 6000.0);
        let step = std::f32::consts::TAU * self.tone_hz / self.sample_rate;

        for _ in 0..SAMPLES_PER_FRAME {
            if self.samples_to_kick == 0 {
                self.kick_env = 1.0;
                // Kicks every 0.3 - 0.8 s
                self.samples_to_kick = ((rng.random_range(0.3..0.8f32) * self.sample_rate) as usize).max(1);
            }
            self.samples_to_kick -= 1;

            self.phase = (self.phase + step) % std::f32::consts::TAU;
            let kick = self.kick_env * (self.phase * 0.125).sin();
            self.kick_env *= 0.9995;

            let sample = 0.3 * self.phase.sin() + 0.6 * kick + rng.random_range(-0.05..0.05);
            self.history.push(sample.clamp(-1.0, 1.0));
        }

        let excess = self.history.len().saturating_sub(FFT_SIZE);
        self.history.drain(..excess);

        let tail = self.history.len() - WAVEFORM_SIZE;
        self.waveform.copy_from_slice(&self.history[tail..]);
        self.analyzer.process(&self.history, &mut self.spectrum);
    }
}

impl FrameSource for SyntheticSource {
    fn frame(&mut self) -> Option<AudioFrame<'_>> {
        self.generate();
        Some(AudioFrame::new(&self.waveform, &self.spectrum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_have_stock_sizes() {
        let mut source = SyntheticSource::new(44_100.0);
        for _ in 0..3 {
            let frame = source.frame().unwrap();
            assert_eq!(frame.waveform.len(), WAVEFORM_SIZE);
            assert_eq!(frame.spectrum.len(), SPECTRUM_SIZE);
            assert!(frame.waveform.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
            assert!(frame.spectrum.iter().all(|v| *v >= 0.0));
        }
    }
}

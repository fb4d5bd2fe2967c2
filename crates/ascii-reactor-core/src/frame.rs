//! Audio frames and the providers that produce them.
//!
//! A frame is borrowed from its provider for exactly one tick; the core
//! copies out only what flux needs (the previous spectrum).

/// Waveform samples per frame delivered by the stock providers
pub const WAVEFORM_SIZE: usize = 256;

/// Spectrum bins per frame delivered by the stock providers
pub const SPECTRUM_SIZE: usize = 1024;

/// One tick of analyser output
#[derive(Clone, Copy, Debug)]
pub struct AudioFrame<'a> {
    /// Time-domain samples, roughly -1..1
    pub waveform: &'a [f32],
    /// Non-negative magnitude per frequency bin, DC first
    pub spectrum: &'a [f32],
}

impl<'a> AudioFrame<'a> {
    pub fn new(waveform: &'a [f32], spectrum: &'a [f32]) -> Self {
        Self { waveform, spectrum }
    }
}

/// Anything that can hand the animator a frame once per tick
pub trait FrameSource {
    /// `None` means no active source (nothing playing, no device)
    fn frame(&mut self) -> Option<AudioFrame<'_>>;
}

/// A provider that is never active
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSource;

impl FrameSource for NoSource {
    fn frame(&mut self) -> Option<AudioFrame<'_>> {
        None
    }
}

/// Owned frame storage, used by synthetic providers and tests
#[derive(Clone, Debug, Default)]
pub struct FrameBuffer {
    pub waveform: Vec<f32>,
    pub spectrum: Vec<f32>,
    pub active: bool,
}

impl FrameBuffer {
    pub fn new(waveform: Vec<f32>, spectrum: Vec<f32>) -> Self {
        Self {
            waveform,
            spectrum,
            active: true,
        }
    }

    /// An active source producing digital silence at the stock frame sizes
    pub fn silent() -> Self {
        Self::new(vec![0.0; WAVEFORM_SIZE], vec![0.0; SPECTRUM_SIZE])
    }
}

impl FrameSource for FrameBuffer {
    fn frame(&mut self) -> Option<AudioFrame<'_>> {
        self.active
            .then(|| AudioFrame::new(&self.waveform, &self.spectrum))
    }
}

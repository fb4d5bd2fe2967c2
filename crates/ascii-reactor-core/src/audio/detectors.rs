//! Beat and novelty detection.
//!
//! Three small stateful trackers that run once per tick after feature
//! extraction:
//! 1. Beat detector - amplitude over a threshold, gated by a refractory period
//! 2. Novelty tracker - spectral flux against its own exponential average
//! 3. Energy tracker - slow exponential average of amplitude, kept as a
//!    diagnostic for threshold tuning (it does not gate beats)
//!
//! All three live in [`DetectorState`], owned by one animator and reset
//! whenever the animator is re-enabled.

use std::time::Duration;

use tracing::trace;

/// Shortest refractory period a beat may ever use
pub const BEAT_COOLDOWN_FLOOR: Duration = Duration::from_millis(10);

/// Weight kept from the previous running energy each tick
const ENERGY_RETAIN: f32 = 0.98;
/// Weight kept from the previous novelty average each tick
const NOVELTY_RETAIN: f32 = 0.8;

/// `retain * old + (1 - retain) * sample`, ignoring non-finite samples
#[inline]
fn ema(old: f32, sample: f32, retain: f32) -> f32 {
    if !sample.is_finite() {
        return old;
    }
    retain * old + (1.0 - retain) * sample
}

/// Refractory period used by the beat detector for a given camera cooldown.
///
/// The smaller of the fixed floor and the camera-change cooldown, so beats
/// can always fire at least as often as the camera is allowed to move.
pub fn beat_cooldown(camera_change_cooldown: Duration) -> Duration {
    BEAT_COOLDOWN_FLOOR.min(camera_change_cooldown)
}

/// Whether the beat detector can fire right now
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeatPhase {
    Armed,
    Refractory,
}

/// Threshold-and-cooldown beat detector
#[derive(Clone, Debug, Default)]
pub struct BeatDetector {
    /// When the last beat fired; `None` until the first one
    last_beat: Option<Duration>,
}

impl BeatDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Armed/refractory state at `now`. Re-arming is purely time based.
    pub fn phase(&self, now: Duration, cooldown: Duration) -> BeatPhase {
        match self.last_beat {
            Some(last) if now.saturating_sub(last) <= cooldown => BeatPhase::Refractory,
            _ => BeatPhase::Armed,
        }
    }

    /// Feed one tick's amplitude; returns `true` if a beat fires.
    ///
    /// Fires when `amplitude > threshold` and strictly more than `cooldown`
    /// has passed since the previous beat.
    pub fn process(&mut self, amplitude: f32, threshold: f32, cooldown: Duration, now: Duration) -> bool {
        if amplitude > threshold && self.phase(now, cooldown) == BeatPhase::Armed {
            self.last_beat = Some(now);
            return true;
        }
        false
    }

    pub fn last_beat(&self) -> Option<Duration> {
        self.last_beat
    }

    pub fn reset(&mut self) {
        self.last_beat = None;
    }
}

/// Spectral-flux novelty: how far this tick's flux sits above its trend
#[derive(Clone, Debug, Default)]
pub struct NoveltyTracker {
    ema: f32,
}

impl NoveltyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the average with `flux` first, then return `flux - average`
    pub fn update(&mut self, flux: f32) -> f32 {
        self.ema = ema(self.ema, flux, NOVELTY_RETAIN);
        if flux.is_finite() {
            flux - self.ema
        } else {
            0.0
        }
    }

    pub fn average(&self) -> f32 {
        self.ema
    }

    pub fn reset(&mut self) {
        self.ema = 0.0;
    }
}

/// Slow amplitude average used as an energy reference
#[derive(Clone, Debug, Default)]
pub struct EnergyTracker {
    running_energy: f32,
}

impl EnergyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, amplitude: f32) -> f32 {
        self.running_energy = ema(self.running_energy, amplitude.max(0.0), ENERGY_RETAIN);
        self.running_energy
    }

    pub fn running_energy(&self) -> f32 {
        self.running_energy
    }

    /// Whether the tracked energy sits above `threshold`
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.running_energy > threshold
    }

    pub fn reset(&mut self) {
        self.running_energy = 0.0;
    }
}

/// What the detectors concluded for one tick
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Detection {
    pub is_beat: bool,
    pub novelty: f32,
    pub running_energy: f32,
}

/// All temporal detector state owned by one animator
#[derive(Clone, Debug, Default)]
pub struct DetectorState {
    pub beat: BeatDetector,
    pub novelty: NoveltyTracker,
    pub energy: EnergyTracker,
}

impl DetectorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run all three trackers for one tick
    pub fn process(
        &mut self,
        amplitude: f32,
        spectral_flux: f32,
        beat_threshold: f32,
        cooldown: Duration,
        now: Duration,
    ) -> Detection {
        let running_energy = self.energy.update(amplitude);
        let novelty = self.novelty.update(spectral_flux);
        let is_beat = self.beat.process(amplitude, beat_threshold, cooldown, now);

        trace!(
            amplitude,
            spectral_flux,
            novelty,
            running_energy,
            is_beat,
            "detectors"
        );

        Detection {
            is_beat,
            novelty,
            running_energy,
        }
    }

    /// Back to the just-constructed state
    pub fn reset(&mut self) {
        self.beat.reset();
        self.novelty.reset();
        self.energy.reset();
    }
}

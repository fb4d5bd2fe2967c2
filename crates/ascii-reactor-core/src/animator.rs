//! The animator: one pipeline run per display frame, flushed to the
//! parameter sink on its own slower interval.
//!
//! Two named tasks drive it:
//! - `frame` runs once per rendered frame while enabled. Each run is
//!   authorised by a [`FrameTicket`]; disabling cancels the task and every
//!   outstanding ticket becomes a no-op.
//! - `flush` runs every `flush_period` (10 ms by default) and writes only
//!   the fields that changed since the sink was last written. It keeps
//!   running across disable/enable and is only stopped by [`AnimatorLoop::shutdown`].

use std::time::Duration;

use tracing::{debug, trace};

use crate::audio::{beat_cooldown, Detection, DetectorState, FeatureExtractor, FeatureSet, FrequencyBands};
use crate::config::ReactiveConfig;
use crate::frame::{AudioFrame, FrameSource};
use crate::mapping::{Color, ParameterMapper, ThemePalette};
use crate::params::{apply_changes, ParameterSink, RenderableParameters};
use crate::schedule::{FrameTicket, ScheduledTask};
use crate::smoothing::SmoothingBuffer;
use crate::view::{Direction, TriggerDispatcher, TriggerInput, ViewCycler, ViewDeck};

/// Everything one computed frame produced, for overlays and logs
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    /// `false` when the provider had nothing to give
    pub source_active: bool,
    pub is_beat: bool,
    pub frequency_bands: FrequencyBands,
    pub spectral_flux: f32,
    pub novelty: f32,
    pub dominant_frequency: f32,
    pub running_energy: f32,
    /// Running energy above the configured beat energy reference
    pub energy_over_reference: bool,
    /// View change sent this frame, if any
    pub direction: Option<Direction>,
    /// Smoothed output
    pub params: RenderableParameters,
}

pub struct AnimatorLoop {
    config: ReactiveConfig,
    extractor: FeatureExtractor,
    detectors: DetectorState,
    mapper: ParameterMapper,
    dispatcher: TriggerDispatcher,
    font_sizes: SmoothingBuffer<f32>,
    cell_sizes: SmoothingBuffer<f32>,
    character_colors: SmoothingBuffer<Color>,
    background_colors: SmoothingBuffer<Color>,
    frame_task: ScheduledTask,
    flush_task: ScheduledTask,
    latest: Option<RenderableParameters>,
    dirty: bool,
    enabled: bool,
    last_report: Option<FrameReport>,
}

impl AnimatorLoop {
    /// Starts disabled; call [`enable`](Self::enable) to get the first ticket
    pub fn new(config: ReactiveConfig, palette: ThemePalette) -> Self {
        let capacity = config.buffer_capacity();
        let mut frame_task = ScheduledTask::per_frame("frame");
        frame_task.cancel();
        let flush_task = ScheduledTask::interval("flush", config.flush_period());

        Self {
            extractor: FeatureExtractor::new(),
            detectors: DetectorState::new(),
            mapper: ParameterMapper::new(palette),
            dispatcher: TriggerDispatcher::new(),
            font_sizes: SmoothingBuffer::new(capacity),
            cell_sizes: SmoothingBuffer::new(capacity),
            character_colors: SmoothingBuffer::new(capacity),
            background_colors: SmoothingBuffer::new(capacity),
            frame_task,
            flush_task,
            latest: None,
            dirty: false,
            enabled: false,
            last_report: None,
            config,
        }
    }

    pub fn config(&self) -> &ReactiveConfig {
        &self.config
    }

    /// Changes to capacity and flush period are picked up on the next tick
    pub fn config_mut(&mut self) -> &mut ReactiveConfig {
        &mut self.config
    }

    pub fn set_palette(&mut self, palette: ThemePalette) {
        self.mapper.set_palette(palette);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    /// Latest smoothed parameters, whether or not they were flushed yet
    pub fn latest(&self) -> Option<&RenderableParameters> {
        self.latest.as_ref()
    }

    /// Start computing from a clean state.
    ///
    /// Returns the first frame ticket, or `None` if already enabled (the
    /// current ticket chain stays valid).
    pub fn enable(&mut self) -> Option<FrameTicket> {
        if self.enabled {
            return None;
        }
        self.reset_state();
        self.enabled = true;
        debug!("animator enabled");
        Some(self.frame_task.restart())
    }

    /// Stop computing. Pending tickets become no-ops; the flush task keeps
    /// running but has nothing to write.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.frame_task.cancel();
        self.dirty = false;
        self.latest = None;
        debug!("animator disabled");
    }

    /// Disable and stop the flush task for good
    pub fn shutdown(&mut self) {
        self.disable();
        self.flush_task.cancel();
        debug!("animator shut down");
    }

    /// Sound cursor back to the first view, camera cooldown cleared
    pub fn reset_sound_state(&mut self, views: &mut ViewDeck) {
        views.reset_sound_state();
        self.dispatcher.clear_camera_change();
    }

    fn reset_state(&mut self) {
        self.extractor.reset();
        self.detectors.reset();
        self.mapper.reset();
        self.dispatcher.reset();
        self.font_sizes.clear();
        self.cell_sizes.clear();
        self.character_colors.clear();
        self.background_colors.clear();
        self.latest = None;
        self.dirty = false;
        self.last_report = None;
    }

    fn sync_capacity(&mut self) {
        let capacity = self.config.buffer_capacity();
        if self.font_sizes.capacity() != capacity {
            self.font_sizes.set_capacity(capacity);
            self.cell_sizes.set_capacity(capacity);
            self.character_colors.set_capacity(capacity);
            self.background_colors.set_capacity(capacity);
        }
    }

    /// Run one frame if `ticket` is still live.
    ///
    /// Returns the ticket for the next frame, or `None` when this ticket was
    /// stale (the animator was disabled or re-enabled since it was issued).
    pub fn run_frame(
        &mut self,
        ticket: &FrameTicket,
        now: Duration,
        source: &mut dyn FrameSource,
        views: &mut dyn ViewCycler,
    ) -> Option<FrameTicket> {
        if !ticket.is_live() {
            trace!(seq = ticket.seq(), "stale frame ticket ignored");
            return None;
        }
        let frame = source.frame();
        self.compute(now, frame, views);
        Some(ticket.next())
    }

    fn compute(&mut self, now: Duration, frame: Option<AudioFrame<'_>>, views: &mut dyn ViewCycler) -> FrameReport {
        self.sync_capacity();

        let source_active = frame.is_some();
        let (features, detection, direction) = match frame {
            Some(frame) => {
                let mut features = self.extractor.extract(frame, self.config.sample_rate_hz());
                let detection = self.detectors.process(
                    features.amplitude,
                    features.spectral_flux,
                    self.config.beat_threshold(),
                    beat_cooldown(self.config.camera_change_cooldown()),
                    now,
                );
                features.novelty = detection.novelty;
                let input = TriggerInput {
                    is_beat: detection.is_beat,
                    novelty: detection.novelty,
                    dominant_frequency: features.dominant_frequency,
                };
                let direction = self.dispatcher.dispatch(now, input, &self.config, views);
                (features, detection, direction)
            }
            None => {
                let detection = Detection {
                    running_energy: self.detectors.energy.running_energy(),
                    ..Detection::default()
                };
                (FeatureSet::neutral(), detection, None)
            }
        };

        let mapped = self.mapper.map(&features, self.config.use_theme_colors());
        self.font_sizes.push(mapped.font_size);
        self.cell_sizes.push(mapped.cell_size);
        self.character_colors.push(mapped.character_color);
        self.background_colors.push(mapped.background_color);

        let params = RenderableParameters {
            font_size: self.font_sizes.read().unwrap_or(mapped.font_size).round() as u32,
            cell_size: self.cell_sizes.read().unwrap_or(mapped.cell_size).round() as u32,
            character_color: self.character_colors.read().unwrap_or(mapped.character_color),
            background_color: self.background_colors.read().unwrap_or(mapped.background_color),
        };
        self.latest = Some(params);
        self.dirty = true;

        let report = FrameReport {
            source_active,
            is_beat: detection.is_beat,
            frequency_bands: features.frequency_bands,
            spectral_flux: features.spectral_flux,
            novelty: detection.novelty,
            dominant_frequency: features.dominant_frequency,
            running_energy: detection.running_energy,
            energy_over_reference: self.detectors.energy.exceeds(self.config.beat_energy_threshold()),
            direction,
            params,
        };
        self.last_report = Some(report);
        report
    }

    /// Poll the flush task; writes to `sink` when it is due.
    ///
    /// Returns how many fields were written.
    pub fn poll_flush(&mut self, now: Duration, sink: &mut dyn ParameterSink) -> usize {
        if self.flush_task.period() != Some(self.config.flush_period()) {
            self.flush_task.set_period(self.config.flush_period());
        }
        if !self.flush_task.poll(now) {
            return 0;
        }
        self.flush(sink)
    }

    /// Write pending changes now. A no-op while disabled or clean.
    pub fn flush(&mut self, sink: &mut dyn ParameterSink) -> usize {
        if !self.enabled || !self.dirty {
            return 0;
        }
        self.dirty = false;
        match self.latest {
            Some(latest) => apply_changes(&latest, self.config.update_flags(), sink),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameBuffer, NoSource};
    use crate::params::ParameterStore;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn animator() -> AnimatorLoop {
        AnimatorLoop::new(ReactiveConfig::default(), ThemePalette::default())
    }

    #[test]
    fn starts_disabled() {
        let mut animator = animator();
        let mut store = ParameterStore::default();
        assert!(!animator.is_enabled());
        assert_eq!(animator.flush(&mut store), 0);
    }

    #[test]
    fn stale_ticket_is_a_no_op() {
        let mut animator = animator();
        let mut views = ViewDeck::builtin();
        let mut source = FrameBuffer::silent();

        let ticket = animator.enable().unwrap();
        let next = animator.run_frame(&ticket, ms(0), &mut source, &mut views).unwrap();
        animator.disable();
        assert!(animator.run_frame(&next, ms(16), &mut source, &mut views).is_none());
        assert!(animator.latest().is_none());
    }

    #[test]
    fn enable_twice_keeps_chain() {
        let mut animator = animator();
        let ticket = animator.enable().unwrap();
        assert!(animator.enable().is_none());
        assert!(ticket.is_live());
    }

    #[test]
    fn missing_source_still_maps() {
        let mut animator = animator();
        let mut views = ViewDeck::builtin();
        let ticket = animator.enable().unwrap();
        animator.run_frame(&ticket, ms(0), &mut NoSource, &mut views);

        let report = animator.last_report().unwrap();
        assert!(!report.source_active);
        assert!(!report.is_beat);
        assert_eq!(report.params.font_size, 64);
        assert_eq!(report.params.cell_size, 5);
    }

    #[test]
    fn report_compares_energy_to_reference() {
        let mut config = ReactiveConfig::default();
        config.set_beat_energy_threshold(0.05);
        let mut animator = AnimatorLoop::new(config, ThemePalette::default());
        let mut views = ViewDeck::builtin();
        let waveform = vec![0.8; crate::frame::WAVEFORM_SIZE];
        let spectrum = vec![0.1; crate::frame::SPECTRUM_SIZE];
        let mut source = FrameBuffer::new(waveform, spectrum);

        let mut ticket = animator.enable().unwrap();
        for i in 0..5 {
            ticket = animator.run_frame(&ticket, ms(i * 16), &mut source, &mut views).unwrap();
        }
        // 0.8 for five ticks at 0.98 retention: about 0.077
        assert!(animator.last_report().unwrap().energy_over_reference);

        animator.config_mut().set_beat_energy_threshold(0.5);
        animator.run_frame(&ticket, ms(80), &mut source, &mut views);
        assert!(!animator.last_report().unwrap().energy_over_reference);
    }

    #[test]
    fn flush_waits_for_interval() {
        let mut animator = animator();
        let mut views = ViewDeck::builtin();
        let mut store = ParameterStore::default();
        let mut source = FrameBuffer::silent();
        let ticket = animator.enable().unwrap();
        animator.run_frame(&ticket, ms(0), &mut source, &mut views);

        assert_eq!(animator.poll_flush(ms(0), &mut store), 0);
        assert_eq!(animator.poll_flush(ms(5), &mut store), 0);
        let written = animator.poll_flush(ms(10), &mut store);
        assert_eq!(store.parameters(), *animator.latest().unwrap());
        assert_eq!(store.writes(), written);
    }

    #[test]
    fn shutdown_stops_flushing() {
        let mut animator = animator();
        let mut store = ParameterStore::default();
        animator.enable();
        animator.shutdown();
        assert!(!animator.is_enabled());
        animator.poll_flush(ms(0), &mut store);
        assert_eq!(animator.poll_flush(ms(100), &mut store), 0);
    }
}

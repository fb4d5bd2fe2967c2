use std::time::Duration;

use ascii_reactor_core::params::apply_changes;
use ascii_reactor_core::{
    AnimatorLoop, Direction, FrameBuffer, FrameGate, ParameterSink, ParameterStore, ReactiveConfig, RenderableParameters,
    ThemePalette, UpdateFlags, ViewCycler, ViewDeck, SPECTRUM_SIZE, WAVEFORM_SIZE,
};

#[derive(Default)]
struct RecordingViews {
    directions: Vec<Direction>,
}

impl ViewCycler for RecordingViews {
    fn cycle_view(&mut self, direction: Direction) {
        self.directions.push(direction);
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Square wave at `level` with all spectral energy in `peak_bin`
fn loud_frame(level: f32, peak_bin: usize) -> FrameBuffer {
    let waveform = (0..WAVEFORM_SIZE)
        .map(|i| if i % 2 == 0 { level } else { -level })
        .collect();
    let mut spectrum = vec![0.0; SPECTRUM_SIZE];
    spectrum[peak_bin] = 1.0;
    FrameBuffer::new(waveform, spectrum)
}

fn beat_config() -> ReactiveConfig {
    let mut config = ReactiveConfig::default();
    config.set_beat_threshold(0.5);
    config
}

#[test]
fn beats_cycle_views_once_per_cooldown() {
    let mut animator = AnimatorLoop::new(beat_config(), ThemePalette::default());
    let mut views = RecordingViews::default();
    let mut source = loud_frame(0.9, 800);

    let mut ticket = animator.enable();
    let mut beats = 0;
    for frame in 0..=12u64 {
        let current = ticket.take().expect("live ticket");
        ticket = animator.run_frame(&current, ms(frame * 16), &mut source, &mut views);
        if animator.last_report().map_or(false, |r| r.is_beat) {
            beats += 1;
        }
    }

    // 16 ms frames clear the 10 ms beat floor every time
    assert_eq!(beats, 13);
    // 60 ms camera cooldown: 0, 64, 128, 192
    assert_eq!(views.directions, vec![Direction::Next; 4]);
}

#[test]
fn low_dominant_frequency_steps_back() {
    let mut animator = AnimatorLoop::new(beat_config(), ThemePalette::default());
    let mut views = RecordingViews::default();
    // bin 10 of 1024 at 44.1 kHz is ~215 Hz
    let mut source = loud_frame(0.9, 10);

    let ticket = animator.enable().expect("first ticket");
    animator.run_frame(&ticket, ms(0), &mut source, &mut views);
    assert_eq!(views.directions, vec![Direction::Previous]);
}

#[test]
fn sound_animation_off_never_cycles() {
    let mut config = beat_config();
    config.set_sound_animation_enabled(false);
    let mut animator = AnimatorLoop::new(config, ThemePalette::default());
    let mut views = ViewDeck::builtin();
    let mut source = loud_frame(0.9, 800);

    let mut ticket = animator.enable();
    for frame in 0..10u64 {
        let current = ticket.take().expect("live ticket");
        ticket = animator.run_frame(&current, ms(frame * 100), &mut source, &mut views);
    }
    assert_eq!(views.sound().cursor(), 0);
    assert!(!views.rig().animating);
}

#[test]
fn reenable_starts_from_clean_state() {
    let mut animator = AnimatorLoop::new(beat_config(), ThemePalette::default());
    let mut views = RecordingViews::default();
    let mut source = loud_frame(0.9, 800);

    let ticket = animator.enable().expect("first ticket");
    let ticket = animator
        .run_frame(&ticket, ms(0), &mut source, &mut views)
        .expect("next ticket");
    animator.run_frame(&ticket, ms(16), &mut source, &mut views);
    animator.disable();

    let ticket = animator.enable().expect("fresh ticket");
    animator.run_frame(&ticket, ms(20), &mut source, &mut views);
    let report = animator.last_report().expect("report");

    // no previous spectrum, so no flux and no novelty
    assert_eq!(report.spectral_flux, 0.0);
    assert_eq!(report.novelty, 0.0);
    assert!((report.running_energy - 0.02 * 0.9).abs() < 1e-5);
    // beat and camera cooldowns were cleared too
    assert!(report.is_beat);
    assert_eq!(report.direction, Some(Direction::Next));
}

#[test]
fn flush_writes_only_changes() {
    let mut animator = AnimatorLoop::new(beat_config(), ThemePalette::default());
    let mut views = RecordingViews::default();
    let mut store = ParameterStore::default();
    let mut source = loud_frame(0.3, 800);

    let mut ticket = animator.enable();
    let mut total = 0;
    for step in 0..40u64 {
        let now = ms(step * 5);
        if step % 3 == 0 {
            let current = ticket.take().expect("live ticket");
            ticket = animator.run_frame(&current, now, &mut source, &mut views);
        }
        total += animator.poll_flush(now, &mut store);
    }

    let latest = *animator.latest().expect("latest");
    assert_eq!(store.parameters(), latest);
    assert_eq!(store.writes(), total);
    // constant input settles after the window fills, so writes stay bounded
    assert!(total <= 4 * 3, "too many writes: {}", total);
}

#[test]
fn disabled_flags_keep_sink_untouched() {
    let mut config = beat_config();
    config.set_update_flags(UpdateFlags::NONE);
    let mut animator = AnimatorLoop::new(config, ThemePalette::default());
    let mut views = RecordingViews::default();
    let mut store = ParameterStore::default();
    let mut source = loud_frame(0.3, 800);

    let ticket = animator.enable().expect("first ticket");
    animator.run_frame(&ticket, ms(0), &mut source, &mut views);
    animator.poll_flush(ms(0), &mut store);
    assert_eq!(animator.poll_flush(ms(10), &mut store), 0);
    assert_eq!(store.parameters(), RenderableParameters::default());
}

#[test]
fn flush_after_disable_is_silent() {
    let mut animator = AnimatorLoop::new(beat_config(), ThemePalette::default());
    let mut views = RecordingViews::default();
    let mut store = ParameterStore::default();
    let mut source = loud_frame(0.3, 800);

    let ticket = animator.enable().expect("first ticket");
    animator.run_frame(&ticket, ms(0), &mut source, &mut views);
    animator.disable();
    assert_eq!(animator.flush(&mut store), 0);
    assert_eq!(store.writes(), 0);
}

#[test]
fn silence_keeps_resting_sizes() {
    let mut animator = AnimatorLoop::new(ReactiveConfig::default(), ThemePalette::default());
    let mut views = RecordingViews::default();
    let mut store = ParameterStore::default();
    let mut source = FrameBuffer::silent();

    let ticket = animator.enable().expect("first ticket");
    animator.run_frame(&ticket, ms(0), &mut source, &mut views);
    let latest = *animator.latest().expect("latest");
    assert_eq!(latest.font_size, 64);
    assert_eq!(latest.cell_size, 5);
    assert!(views.directions.is_empty());

    apply_changes(&latest, UpdateFlags::ALL, &mut store);
    assert_eq!(store.parameters().font_size, 64);
}

#[test]
fn flush_runs_on_its_own_clock() {
    let mut animator = AnimatorLoop::new(ReactiveConfig::default(), ThemePalette::default());
    let mut views = RecordingViews::default();
    let mut store = ParameterStore::default();
    let mut source = loud_frame(0.9, 800);
    let mut gate = FrameGate::new();

    let mut ticket = animator.enable();
    let mut compute_ticks = Vec::new();
    let mut flush_ticks = Vec::new();
    let mut polls = 0;

    // Host loop ticks every 10 ms; frames are presented every 16 ms
    for t in (0..=160u64).step_by(10) {
        if gate.advance(t / 16) {
            if let Some(current) = ticket.take() {
                ticket = animator.run_frame(&current, ms(t), &mut source, &mut views);
                compute_ticks.push(t);
            }
        }
        polls += 1;
        if animator.poll_flush(ms(t), &mut store) > 0 {
            flush_ticks.push(t);
        }
    }

    assert_eq!(polls, 17);
    assert_eq!(compute_ticks.len(), 11);
    assert_ne!(polls, compute_ticks.len());
    // The first write lands on a tick with no compute
    assert_eq!(flush_ticks.first(), Some(&10));
    assert!(!compute_ticks.contains(&10));
    assert_eq!(store.parameters(), *animator.latest().expect("computed"));
}

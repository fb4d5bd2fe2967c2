mod audio;
mod renderer;
mod ui;
mod utils;

use std::env;

use ascii_reactor_core::view::{PresetCycler, ViewDeck};
use ascii_reactor_core::{
    AnimatorLoop, AudioFrame, Direction, FrameGate, FrameSource, FrameTicket, ParameterSink,
    ParameterStore, RenderableParameters,
};
use audio::{SourcePipe, SyntheticSource};
use nannou::prelude::*;
use renderer::{AsciiRenderer, Diagnostics, OverlayContext};
use tracing::{error, info, warn};
use ui::bindings::{parse_key, Action};
use utils::Config;

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;

fn main() {
    nannou::app(model).update(update).run();
}

fn has_flag(names: &[&str]) -> bool {
    env::args().any(|arg| names.contains(&arg.as_str()))
}

/// Where frames come from
enum Source {
    Live(SourcePipe),
    Synthetic(SyntheticSource),
}

impl Source {
    fn sample_rate(&self, fallback: f32) -> f32 {
        match self {
            Source::Live(pipe) if pipe.is_active() => pipe.sample_rate(),
            _ => fallback,
        }
    }
}

impl FrameSource for Source {
    fn frame(&mut self) -> Option<AudioFrame<'_>> {
        match self {
            Source::Live(pipe) => pipe.frame(),
            Source::Synthetic(synth) => synth.frame(),
        }
    }
}

struct Model {
    config: Config,
    source: Source,
    animator: AnimatorLoop,
    /// Ticket for the next frame; `None` while the animator is off
    ticket: Option<FrameTicket>,
    /// `update` ticks on the flush clock; compute once per presented frame
    frame_gate: FrameGate,
    views: ViewDeck,
    presets: PresetCycler,
    store: ParameterStore,
    renderer: AsciiRenderer,
    diagnostics: Diagnostics,
}

fn model(app: &App) -> Model {
    let config = Config::load();
    utils::logging::init(config.log_level());
    let synthetic = has_flag(&["--synthetic"]);

    if !synthetic {
        // List all devices at startup
        SourcePipe::list_devices();
    }

    let mut reactive = config.reactive();
    // Flushes run on their own interval, independent of the display refresh
    app.set_loop_mode(LoopMode::Rate {
        update_interval: reactive.flush_period(),
    });
    app.set_exit_on_escape(false);

    let mut win = app
        .new_window()
        .title("ascii-reactor")
        .view(view)
        .key_pressed(key_pressed)
        .size(WINDOW_WIDTH, WINDOW_HEIGHT)
        .min_size(400, 300);

    if !has_flag(&["--windowed", "-w"]) {
        win = win.fullscreen();
    }

    if let Err(e) = win.build() {
        error!("failed to open window: {}", e);
        std::process::exit(1);
    }

    let source = if synthetic {
        info!("using synthetic audio source");
        Source::Synthetic(SyntheticSource::new(reactive.sample_rate_hz()))
    } else {
        Source::Live(SourcePipe::new(&config))
    };
    reactive.set_sample_rate_hz(source.sample_rate(reactive.sample_rate_hz()));

    let mut animator = AnimatorLoop::new(reactive, config.palette());
    let ticket = animator.enable();

    Model {
        source,
        animator,
        ticket,
        frame_gate: FrameGate::new(),
        views: ViewDeck::builtin(),
        presets: PresetCycler::builtin(),
        store: ParameterStore::new(RenderableParameters::default()),
        renderer: AsciiRenderer::new(),
        diagnostics: Diagnostics::new(has_flag(&["--debug", "-d"])),
        config,
    }
}

fn update(app: &App, model: &mut Model, _update: Update) {
    let now = app.duration.since_start;

    if model.frame_gate.advance(app.elapsed_frames()) {
        if let Some(ticket) = model.ticket.take() {
            model.ticket = model
                .animator
                .run_frame(&ticket, now, &mut model.source, &mut model.views);
        }

        model.renderer.update();
        model.diagnostics.update(model.animator.last_report());

        // Views snap into place; the transition is done after one frame
        model.views.rig_mut().animating = false;
    }

    model.animator.poll_flush(now, &mut model.store);
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let bounds = app.window_rect();
    let report = model.animator.last_report();
    let bands = report.map(|r| r.frequency_bands).unwrap_or_default();

    model.renderer.draw(
        &draw,
        bounds,
        &model.store.parameters(),
        &bands,
        model.views.rig(),
        app.time,
    );

    let config = model.animator.config();
    let view_name = model
        .views
        .active_view(config.sound_animation_enabled())
        .map(|v| v.name.as_str())
        .unwrap_or("-");
    let ctx = OverlayContext {
        animator_enabled: model.animator.is_enabled(),
        sound_animation: config.sound_animation_enabled(),
        theme_colors: config.use_theme_colors(),
        energy_reference: config.beat_energy_threshold(),
        view: view_name,
        preset: model.presets.current().unwrap_or("-"),
    };
    model.diagnostics.draw(&draw, bounds, report, &ctx);
    model.renderer.draw_notification(&draw, bounds);

    if let Err(e) = draw.to_frame(app, &frame) {
        warn!("failed to draw frame: {:?}", e);
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ON"
    } else {
        "OFF"
    }
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    let Some(action) = parse_key(key, app.keys.mods.shift()) else {
        return;
    };

    match action {
        Action::Quit => {
            model.animator.shutdown();
            model.ticket = None;
            app.quit();
        }
        Action::ToggleDiagnostics => model.diagnostics.toggle(),
        Action::ToggleAnimator => {
            if model.animator.is_enabled() {
                model.animator.disable();
                model.ticket = None;
            } else {
                model.ticket = model.animator.enable();
            }
            model
                .renderer
                .show_notification(format!("Animator: {}", on_off(model.animator.is_enabled())));
        }
        Action::ToggleSoundAnimation => {
            let enabled = !model.animator.config().sound_animation_enabled();
            model.animator.config_mut().set_sound_animation_enabled(enabled);
            if enabled {
                model.animator.reset_sound_state(&mut model.views);
            }
            model
                .renderer
                .show_notification(format!("Sound views: {}", on_off(enabled)));
        }
        Action::ToggleThemeColors => {
            let enabled = !model.animator.config().use_theme_colors();
            model.animator.config_mut().set_use_theme_colors(enabled);
            model
                .renderer
                .show_notification(format!("Theme colors: {}", on_off(enabled)));
        }
        Action::PreviousView | Action::NextView => {
            let direction = if action == Action::NextView {
                Direction::Next
            } else {
                Direction::Previous
            };
            if model.views.cycle_manual(direction) {
                if let Some(view) = model.views.current_manual_view() {
                    model.renderer.show_notification(format!("View: {}", view.name));
                }
            }
        }
        Action::PreviousPreset | Action::NextPreset => {
            let name = if action == Action::NextPreset {
                model.presets.next()
            } else {
                model.presets.previous()
            };
            if let Some(name) = name {
                let msg = format!("Preset: {}", name);
                model.renderer.show_notification(msg);
            }
        }
        Action::SelectDevice(idx) => {
            let Source::Live(pipe) = &mut model.source else {
                model
                    .renderer
                    .show_notification("Synthetic source has no devices".to_string());
                return;
            };
            let msg = match pipe.select_device(idx, &mut model.config) {
                Some((name, true)) => {
                    let rate = pipe.sample_rate();
                    model.animator.config_mut().set_sample_rate_hz(rate);
                    format!("[{}] {}", idx, name)
                }
                Some((name, false)) => format!("[{}] {} - FAILED", idx, name),
                None => format!("[{}] INVALID", idx),
            };
            model.renderer.show_notification(msg);
        }
    }
}

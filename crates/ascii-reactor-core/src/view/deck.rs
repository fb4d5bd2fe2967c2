//! Camera view sequences and the rig they drive.
//!
//! Two independent sequences share one rig: the manual sequence steps under
//! user control and stops at its ends, the sound sequence is stepped by the
//! trigger dispatcher and wraps around.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub type Vec3 = [f32; 3];

/// Which way to step through a sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Previous,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Next => write!(f, "next"),
            Direction::Previous => write!(f, "previous"),
        }
    }
}

/// Receiver of sound-driven view changes
pub trait ViewCycler {
    fn cycle_view(&mut self, direction: Direction);
}

/// One named camera setup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub name: String,
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub look_track: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_idle: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_rotate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_pan: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lamp_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speakers_popped: Option<bool>,
}

impl ViewConfig {
    pub fn new(name: impl Into<String>, position: Vec3, target: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            target,
            fov: 45.0,
            look_track: None,
            hover_idle: None,
            enable_rotate: None,
            enable_pan: None,
            lamp_on: None,
            speakers_popped: None,
        }
    }

    /// Desk-facing view: tracking and idle hover on, controls locked
    fn desk(name: &str, position: Vec3, target: Vec3) -> Self {
        Self {
            look_track: Some(true),
            hover_idle: Some(true),
            enable_rotate: Some(false),
            enable_pan: Some(false),
            lamp_on: Some(true),
            speakers_popped: Some(false),
            ..Self::new(name, position, target)
        }
    }

    fn stage(name: &str, position: Vec3, target: Vec3, lit: bool) -> Self {
        Self {
            lamp_on: Some(lit),
            speakers_popped: Some(lit),
            ..Self::new(name, position, target)
        }
    }
}

const COMPUTER_POS: Vec3 = [0.0, -0.75, 6.0];
const COMPUTER_TARGET: Vec3 = [0.0, -1.21, -1.0];
const SCREEN_POS: Vec3 = [0.0, 0.08, 1.8];
const SCREEN_TARGET: Vec3 = [0.0, -0.04, -1.8];

fn builtin_manual_views() -> Vec<ViewConfig> {
    vec![
        ViewConfig::desk("Look At Computer", COMPUTER_POS, COMPUTER_TARGET),
        ViewConfig::desk("Look At Chat", SCREEN_POS, SCREEN_TARGET),
        ViewConfig::desk("Look At Terminal", [0.0, 0.08, 0.5], [0.0, -0.04, -2.5]),
    ]
}

fn builtin_sound_views() -> Vec<ViewConfig> {
    let computer = || ViewConfig::stage("Look At Computer", COMPUTER_POS, COMPUTER_TARGET, true);
    let screen = || ViewConfig::stage("Look At Screen/Skull", SCREEN_POS, SCREEN_TARGET, true);
    vec![
        computer(),
        ViewConfig::stage("Look At Computer Left1", [2.0, 0.08, 1.8], [-0.5, -0.04, -1.8], true),
        computer(),
        ViewConfig::stage("Look At Computer Right1", [-2.0, 0.08, 1.8], [0.5, -0.04, -1.8], true),
        computer(),
        screen(),
        screen(),
        computer(),
        ViewConfig::stage("Look At Computer Lampoff", COMPUTER_POS, COMPUTER_TARGET, false),
        computer(),
        computer(),
        computer(),
        ViewConfig::stage("Look Up At Computer", [0.0, -1.75, 6.0], COMPUTER_TARGET, true),
        computer(),
        ViewConfig::stage("Look Down At Computer", [0.0, 1.25, 6.0], [0.0, -1.3, -1.0], true),
    ]
}

/// What happens when stepping past either end
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CyclePolicy {
    /// Stay put and log
    Clamp,
    /// Continue from the other end
    Wrap,
}

/// Ordered views plus a cursor
#[derive(Clone, Debug)]
pub struct ViewSequence {
    views: Vec<ViewConfig>,
    cursor: usize,
    policy: CyclePolicy,
}

impl ViewSequence {
    pub fn new(views: Vec<ViewConfig>, policy: CyclePolicy) -> Self {
        Self {
            views,
            cursor: 0,
            policy,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn views(&self) -> &[ViewConfig] {
        &self.views
    }

    /// View under the cursor, `None` if the cursor is out of range
    pub fn current(&self) -> Option<&ViewConfig> {
        self.views.get(self.cursor)
    }

    /// Move the cursor; returns the new view, or `None` if it did not move
    pub fn step(&mut self, direction: Direction) -> Option<&ViewConfig> {
        let len = self.views.len();
        if len == 0 {
            return None;
        }
        let next = match (self.policy, direction) {
            (CyclePolicy::Wrap, Direction::Next) => (self.cursor + 1) % len,
            (CyclePolicy::Wrap, Direction::Previous) => (self.cursor + len - 1) % len,
            (CyclePolicy::Clamp, Direction::Next) if self.cursor + 1 < len => self.cursor + 1,
            (CyclePolicy::Clamp, Direction::Previous) if self.cursor > 0 => self.cursor - 1,
            (CyclePolicy::Clamp, Direction::Next) => {
                warn!("already at the last view");
                return None;
            }
            (CyclePolicy::Clamp, Direction::Previous) => {
                warn!("already at the first view");
                return None;
            }
        };
        self.cursor = next;
        self.views.get(next)
    }

    pub fn push(&mut self, view: ViewConfig) {
        self.views.push(view);
    }

    /// Remove by index, keeping the cursor in range. Invalid indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<ViewConfig> {
        if index >= self.views.len() {
            warn!(index, len = self.views.len(), "cannot remove view: invalid index");
            return None;
        }
        let removed = self.views.remove(index);
        self.cursor = self.cursor.min(self.views.len().saturating_sub(1));
        Some(removed)
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// Live camera state the renderer reads
#[derive(Clone, Debug, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
    pub look_track: bool,
    pub hover_idle: bool,
    pub enable_rotate: bool,
    pub enable_pan: bool,
    pub lamp_on: bool,
    pub speakers_popped: bool,
    /// Set when a transition starts; the renderer clears it when done
    pub animating: bool,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: [0.0, -1.0, 65.0],
            target: [0.0, -2.0, -1.0],
            fov: 45.0,
            look_track: false,
            hover_idle: false,
            enable_rotate: false,
            enable_pan: false,
            lamp_on: true,
            speakers_popped: false,
            animating: false,
        }
    }
}

impl CameraRig {
    /// Manual views set every control flag, defaulting unset ones to off
    fn apply_manual(&mut self, view: &ViewConfig) {
        self.apply_common(view);
        self.look_track = view.look_track.unwrap_or(false);
        self.hover_idle = view.hover_idle.unwrap_or(false);
        self.enable_rotate = view.enable_rotate.unwrap_or(false);
        self.enable_pan = view.enable_pan.unwrap_or(false);
    }

    /// Sound views only move the camera and the props
    fn apply_sound(&mut self, view: &ViewConfig) {
        self.apply_common(view);
    }

    fn apply_common(&mut self, view: &ViewConfig) {
        self.position = view.position;
        self.target = view.target;
        self.fov = view.fov;
        if let Some(lamp_on) = view.lamp_on {
            self.lamp_on = lamp_on;
        }
        if let Some(speakers_popped) = view.speakers_popped {
            self.speakers_popped = speakers_popped;
        }
        self.animating = true;
    }
}

/// Both view sequences and the rig
#[derive(Clone, Debug)]
pub struct ViewDeck {
    manual: ViewSequence,
    sound: ViewSequence,
    rig: CameraRig,
}

impl ViewDeck {
    pub fn new(manual: Vec<ViewConfig>, sound: Vec<ViewConfig>) -> Self {
        Self {
            manual: ViewSequence::new(manual, CyclePolicy::Clamp),
            sound: ViewSequence::new(sound, CyclePolicy::Wrap),
            rig: CameraRig::default(),
        }
    }

    /// The stock desk views (3 manual, 15 sound)
    pub fn builtin() -> Self {
        Self::new(builtin_manual_views(), builtin_sound_views())
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    pub fn manual(&self) -> &ViewSequence {
        &self.manual
    }

    pub fn sound(&self) -> &ViewSequence {
        &self.sound
    }

    /// Step the manual sequence; stops at either end
    pub fn cycle_manual(&mut self, direction: Direction) -> bool {
        match self.manual.step(direction) {
            Some(view) => {
                debug!(view = %view.name, %direction, "manual view");
                self.rig.apply_manual(view);
                true
            }
            None => false,
        }
    }

    /// Step the sound sequence; wraps at either end
    pub fn cycle_sound(&mut self, direction: Direction) -> bool {
        match self.sound.step(direction) {
            Some(view) => {
                debug!(view = %view.name, %direction, "sound view");
                self.rig.apply_sound(view);
                true
            }
            None => false,
        }
    }

    pub fn current_manual_view(&self) -> Option<&ViewConfig> {
        self.manual.current()
    }

    pub fn current_sound_view(&self) -> Option<&ViewConfig> {
        self.sound.current()
    }

    /// The view currently driving the rig: the sound cursor while
    /// sound-driven cycling is on, the manual cursor otherwise
    pub fn active_view(&self, sound_driven: bool) -> Option<&ViewConfig> {
        if sound_driven {
            self.current_sound_view()
        } else {
            self.current_manual_view()
        }
    }

    pub fn add_manual_view(&mut self, view: ViewConfig) {
        self.manual.push(view);
    }

    pub fn remove_manual_view(&mut self, index: usize) -> Option<ViewConfig> {
        self.manual.remove(index)
    }

    /// Sound cursor back to the first view
    pub fn reset_sound_state(&mut self) {
        self.sound.reset();
    }
}

impl Default for ViewDeck {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ViewCycler for ViewDeck {
    fn cycle_view(&mut self, direction: Direction) {
        self.cycle_sound(direction);
    }
}

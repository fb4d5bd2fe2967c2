//! Keyboard bindings and input handling.
//!
//! Centralizes all keyboard shortcuts and key mapping logic.

use nannou::prelude::*;

/// Actions that can be triggered by key presses
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // App-level
    Quit,
    ToggleDiagnostics,

    // Animator
    ToggleAnimator,
    ToggleSoundAnimation,
    ToggleThemeColors,

    // Views and presets
    PreviousView,
    NextView,
    PreviousPreset,
    NextPreset,

    // Audio source
    SelectDevice(usize),
}

/// Digit keys to their value
fn key_to_digit(key: Key) -> Option<usize> {
    let d = match key {
        Key::Key0 => 0,
        Key::Key1 => 1,
        Key::Key2 => 2,
        Key::Key3 => 3,
        Key::Key4 => 4,
        Key::Key5 => 5,
        Key::Key6 => 6,
        Key::Key7 => 7,
        Key::Key8 => 8,
        Key::Key9 => 9,
        _ => return None,
    };
    Some(d)
}

/// Parse a key into an action. Shift adds 10 to device digits.
pub fn parse_key(key: Key, shift: bool) -> Option<Action> {
    if let Some(d) = key_to_digit(key) {
        return Some(Action::SelectDevice(if shift { d + 10 } else { d }));
    }

    match key {
        Key::Q => Some(Action::Quit),
        Key::D => Some(Action::ToggleDiagnostics),
        Key::Space => Some(Action::ToggleAnimator),
        Key::S => Some(Action::ToggleSoundAnimation),
        Key::T => Some(Action::ToggleThemeColors),
        Key::Left => Some(Action::PreviousView),
        Key::Right => Some(Action::NextView),
        Key::P => Some(Action::PreviousPreset),
        Key::N => Some(Action::NextPreset),
        _ => None,
    }
}

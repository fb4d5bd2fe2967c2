//! Renderable parameters and the sink they are flushed into.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::mapping::{Color, Rgb};

/// What the renderer reads. Each field is independent; readers may observe a
/// mix of old and new fields between flushes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderableParameters {
    pub font_size: u32,
    pub cell_size: u32,
    pub character_color: Color,
    pub background_color: Color,
}

impl Default for RenderableParameters {
    fn default() -> Self {
        Self {
            font_size: 64,
            cell_size: 5,
            character_color: Color::Hex(Rgb::new(0xe9, 0xe9, 0xe9)),
            background_color: Color::BLACK,
        }
    }
}

/// Which fields the animator may write
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFlags {
    pub font_size: bool,
    pub cell_size: bool,
    pub character_color: bool,
    pub background_color: bool,
}

impl UpdateFlags {
    pub const ALL: UpdateFlags = UpdateFlags {
        font_size: true,
        cell_size: true,
        character_color: true,
        background_color: true,
    };
    pub const NONE: UpdateFlags = UpdateFlags {
        font_size: false,
        cell_size: false,
        character_color: false,
        background_color: false,
    };
}

impl Default for UpdateFlags {
    fn default() -> Self {
        Self::ALL
    }
}

/// Key-value store the renderer reads from
pub trait ParameterSink {
    /// Current contents, used for change detection
    fn parameters(&self) -> RenderableParameters;

    fn set_font_size(&mut self, value: u32);
    fn set_cell_size(&mut self, value: u32);
    fn set_character_color(&mut self, value: Color);
    fn set_background_color(&mut self, value: Color);
}

/// In-memory sink that counts writes
#[derive(Clone, Debug, Default)]
pub struct ParameterStore {
    current: RenderableParameters,
    writes: usize,
}

impl ParameterStore {
    pub fn new(initial: RenderableParameters) -> Self {
        Self {
            current: initial,
            writes: 0,
        }
    }

    /// Total field writes since construction
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ParameterSink for ParameterStore {
    fn parameters(&self) -> RenderableParameters {
        self.current
    }

    fn set_font_size(&mut self, value: u32) {
        self.current.font_size = value;
        self.writes += 1;
    }

    fn set_cell_size(&mut self, value: u32) {
        self.current.cell_size = value;
        self.writes += 1;
    }

    fn set_character_color(&mut self, value: Color) {
        self.current.character_color = value;
        self.writes += 1;
    }

    fn set_background_color(&mut self, value: Color) {
        self.current.background_color = value;
        self.writes += 1;
    }
}

/// Write every enabled field of `latest` that differs from the sink.
///
/// Returns how many fields were written.
pub fn apply_changes<S: ParameterSink + ?Sized>(latest: &RenderableParameters, flags: UpdateFlags, sink: &mut S) -> usize {
    let current = sink.parameters();
    let mut written = 0;

    if flags.font_size && current.font_size != latest.font_size {
        sink.set_font_size(latest.font_size);
        written += 1;
    }
    if flags.cell_size && current.cell_size != latest.cell_size {
        sink.set_cell_size(latest.cell_size);
        written += 1;
    }
    if flags.character_color && current.character_color != latest.character_color {
        sink.set_character_color(latest.character_color);
        written += 1;
    }
    if flags.background_color && current.background_color != latest.background_color {
        sink.set_background_color(latest.background_color);
        written += 1;
    }

    if written > 0 {
        trace!(written, "flushed parameters");
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_fields_are_not_written() {
        let mut store = ParameterStore::default();
        let latest = RenderableParameters::default();
        assert_eq!(apply_changes(&latest, UpdateFlags::ALL, &mut store), 0);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn changed_fields_are_written_once() {
        let mut store = ParameterStore::default();
        let latest = RenderableParameters {
            font_size: 70,
            character_color: Color::vivid(120),
            ..RenderableParameters::default()
        };
        assert_eq!(apply_changes(&latest, UpdateFlags::ALL, &mut store), 2);
        assert_eq!(store.parameters(), latest);
        assert_eq!(apply_changes(&latest, UpdateFlags::ALL, &mut store), 0);
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn flags_gate_each_field() {
        let mut store = ParameterStore::default();
        let latest = RenderableParameters {
            font_size: 70,
            cell_size: 9,
            character_color: Color::WHITE,
            background_color: Color::vivid(10),
        };
        let flags = UpdateFlags {
            cell_size: false,
            background_color: false,
            ..UpdateFlags::ALL
        };
        assert_eq!(apply_changes(&latest, flags, &mut store), 2);
        let after = store.parameters();
        assert_eq!(after.font_size, 70);
        assert_eq!(after.cell_size, 5);
        assert_eq!(after.character_color, Color::WHITE);
        assert_eq!(after.background_color, Color::BLACK);
        assert_eq!(apply_changes(&latest, UpdateFlags::NONE, &mut store), 0);
    }
}

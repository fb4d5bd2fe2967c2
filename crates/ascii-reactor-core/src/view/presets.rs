//! Named visualizer presets, cycled from the keyboard.

use tracing::{debug, warn};

pub const DEFAULT_PRESET: &str = "Goody - The Wild Vort";

pub const BUILTIN_PRESETS: &[&str] = &[
    "_Mig_085",
    "_Rovastar + Geiss - Hurricane Nightmare (Posterize Mix)",
    "An AdamFX n Martin Infusion 2 flexi - Why The Sky Looks Diffrent Today - AdamFx n Martin Infusion - Tack Tile Disfunction B",
    "cope + martin - mother-of-pearl",
    "Cope - The Neverending Explosion of Red Liquid Fire",
    "Eo.S. + Phat - cubetrace - v2",
    "Zylot - Star Ornament",
    "Eo.S. + Zylot - skylight (Stained Glass Majesty mix)",
    "flexi + amandio c - organic12-3d-2.milk",
    "fiShbRaiN + Flexi - witchcraft 2.0",
    "Flexi + Martin - cascading decay swing",
    "Flexi + stahlregen - jelly showoff parade",
    "Flexi - mindblob mix",
    "flexi - patternton, district of media, capitol of the united abstractions of fractopia",
    "Flexi - predator-prey-spirals",
    "Flexi - smashing fractals [acid etching mix]",
    "flexi - swing out on the spiral",
    "flexi - what is the matrix",
    "Geiss + Flexi + Martin - disconnected",
    "Geiss - Thumb Drum",
    "Goody - The Wild Vort",
    "Milk Artist At our Best - FED - SlowFast Ft AdamFX n Martin - HD CosmoFX",
    "martin [shadow harlequins shape code] - fata morgana",
    "Martin - QBikal - Surface Turbulence IIb",
    "ORB - Waaa",
    "suksma - uninitialized variabowl (hydroponic chronic)",
    "Phat+fiShbRaiN+Eo.S_Mandala_Chasers_remix",
    "TonyMilkdrop - Leonardo Da Vinci's Balloon [Flexi - merry-go-round + techstyle]",
    "$$$ Royal - Mashup (220)",
    "_Geiss - Artifact 01",
];

/// Wrapping cursor over preset names
#[derive(Clone, Debug)]
pub struct PresetCycler {
    presets: Vec<String>,
    current: usize,
}

impl PresetCycler {
    /// Starts on [`DEFAULT_PRESET`] when the list has it
    pub fn new(presets: Vec<String>) -> Self {
        let current = presets.iter().position(|p| p == DEFAULT_PRESET).unwrap_or(0);
        Self { presets, current }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_PRESETS.iter().map(|s| s.to_string()).collect())
    }

    pub fn current(&self) -> Option<&str> {
        self.presets.get(self.current).map(String::as_str)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn next(&mut self) -> Option<&str> {
        if self.presets.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.presets.len();
        debug!(preset = %self.presets[self.current], "preset");
        self.current()
    }

    pub fn previous(&mut self) -> Option<&str> {
        if self.presets.is_empty() {
            return None;
        }
        let len = self.presets.len();
        self.current = (self.current + len - 1) % len;
        debug!(preset = %self.presets[self.current], "preset");
        self.current()
    }

    /// Jump to a preset by exact name; unknown names leave the cursor alone
    pub fn select_by_name(&mut self, name: &str) -> bool {
        match self.presets.iter().position(|p| p == name) {
            Some(idx) => {
                self.current = idx;
                true
            }
            None => {
                warn!(name, "unknown preset");
                false
            }
        }
    }
}

impl Default for PresetCycler {
    fn default() -> Self {
        Self::builtin()
    }
}

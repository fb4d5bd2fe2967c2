//! View state: camera sequences, the trigger dispatcher that steps them, and
//! the preset cycler.

mod deck;
mod dispatcher;
mod presets;

pub use deck::{CameraRig, CyclePolicy, Direction, Vec3, ViewConfig, ViewCycler, ViewDeck, ViewSequence};
pub use dispatcher::{TriggerDispatcher, TriggerInput};
pub use presets::{PresetCycler, BUILTIN_PRESETS, DEFAULT_PRESET};

//! Features to renderable values: size curves, frequency colors and the
//! color model they are expressed in.

mod color;
mod mapper;

pub use color::{contrasting_color, interpolate_hex_color, interpolate_hsl_color, Color, Rgb, ThemePalette};
pub use mapper::{
    map_amplitude_to_size, map_frequency_to_color, normalize_log_frequency, ColorLayer, MappedParameters,
    ParameterMapper, CELL_SIZE_MAX, CELL_SIZE_MIN, COLOR_WINDOW_HIGH_HZ, COLOR_WINDOW_LOW_HZ, FONT_SIZE_MAX,
    FONT_SIZE_MIN, SILENCE_THRESHOLD,
};

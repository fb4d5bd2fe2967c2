//! Error types for the reactive core

use thiserror::Error;

/// Failure to read a color string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("empty color string")]
    Empty,

    #[error("invalid hex color: {0:?} (expected #rrggbb)")]
    InvalidHex(String),

    #[error("invalid hsl color: {0:?} (expected hsl(h, s%, l%))")]
    InvalidHsl(String),

    #[error("unrecognized color format: {0:?}")]
    UnknownFormat(String),
}

//! World-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("block ({x}, {y}, {z}) is outside world bounds {width}x{height}x{depth}")]
    OutOfBounds {
        x: i16,
        y: i16,
        z: i16,
        width: i16,
        height: i16,
        depth: i16,
    },

    #[error("world entity id space is exhausted")]
    WorldFull,

    #[error("world dimensions {width}x{height}x{depth} do not match {len} blocks")]
    DimensionMismatch {
        width: i16,
        height: i16,
        depth: i16,
        len: usize,
    },

    #[error("level snapshot failed: {0}")]
    Snapshot(String),
}

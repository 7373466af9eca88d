//! Built-in flat terrain generator.

use crate::blocks;

/// Generate a flat map: grass at half height, dirt below, air above.
/// Layout is `(y * depth + z) * width + x`.
pub fn flat(width: i16, height: i16, depth: i16) -> Vec<u8> {
    let (w, h, d) = (width as usize, height as usize, depth as usize);
    let surface = h / 2;
    let mut blocks = vec![blocks::AIR; w * h * d];
    for y in 0..surface {
        let block = if y + 1 == surface {
            blocks::GRASS
        } else {
            blocks::DIRT
        };
        let layer = y * d * w;
        blocks[layer..layer + d * w].fill(block);
    }
    blocks
}

//! Classic block type ids used by the core.

pub const AIR: u8 = 0;
pub const STONE: u8 = 1;
pub const GRASS: u8 = 2;
pub const DIRT: u8 = 3;
pub const COBBLESTONE: u8 = 4;
pub const PLANKS: u8 = 5;
pub const BEDROCK: u8 = 7;
pub const WATER: u8 = 8;
pub const STILL_WATER: u8 = 9;
pub const LAVA: u8 = 10;
pub const STILL_LAVA: u8 = 11;
pub const SAND: u8 = 12;

/// Highest block id in the classic v7 palette.
pub const MAX_BLOCK_ID: u8 = 49;

/// Whether a client may place or break this block without operator
/// status (bedrock and active liquids are restricted).
pub fn placeable_by_normal_user(block: u8) -> bool {
    !matches!(block, BEDROCK | WATER | STILL_WATER | LAVA | STILL_LAVA)
}

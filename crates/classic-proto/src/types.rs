//! Base wire data types used throughout the Classic protocol.

use std::fmt;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::codec::{read_i16, read_u8, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;

// ---------------------------------------------------------------------------
// FShort (fixed-point i16, 5 fractional bits)
// ---------------------------------------------------------------------------

/// Player coordinate: signed 16-bit fixed point with 5 fractional bits
/// (32 units per block).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FShort(pub i16);

impl FShort {
    /// Fixed-point units per block.
    pub const UNITS_PER_BLOCK: i16 = 32;

    /// Coordinate at the centre of the block column `blocks`.
    pub fn from_block_center(blocks: i16) -> Self {
        FShort(blocks * Self::UNITS_PER_BLOCK + Self::UNITS_PER_BLOCK / 2)
    }

    /// Whole-block part of the coordinate.
    pub fn block(&self) -> i16 {
        self.0.div_euclid(Self::UNITS_PER_BLOCK)
    }

    pub fn to_f32(&self) -> f32 {
        f32::from(self.0) / f32::from(Self::UNITS_PER_BLOCK)
    }
}

impl ClassicEncode for FShort {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.0);
    }
}

impl ClassicDecode for FShort {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        read_i16(buf).map(FShort)
    }
}

impl fmt::Debug for FShort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FShort({})", self.to_f32())
    }
}

// ---------------------------------------------------------------------------
// Angle (u8, 256 units per revolution)
// ---------------------------------------------------------------------------

/// Yaw or pitch as an unsigned byte, 256 units per full revolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Angle(pub u8);

impl Angle {
    pub fn to_degrees(&self) -> f32 {
        f32::from(self.0) * 360.0 / 256.0
    }
}

impl ClassicEncode for Angle {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.0);
    }
}

impl ClassicDecode for Angle {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        read_u8(buf).map(Angle)
    }
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Whole-block coordinate triple (block update packets).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl BlockPos {
    pub fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}

impl ClassicEncode for BlockPos {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
    }
}

impl ClassicDecode for BlockPos {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            x: read_i16(buf)?,
            y: read_i16(buf)?,
            z: read_i16(buf)?,
        })
    }
}

/// Player position plus orientation (spawn and movement packets).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPos {
    pub x: FShort,
    pub y: FShort,
    pub z: FShort,
    pub yaw: Angle,
    pub pitch: Angle,
}

impl PlayerPos {
    /// Position standing centred on top of block `(x, y, z)`.
    pub fn above_block(x: i16, y: i16, z: i16) -> Self {
        Self {
            x: FShort::from_block_center(x),
            y: FShort((y + 1) * FShort::UNITS_PER_BLOCK + FShort::UNITS_PER_BLOCK / 2),
            z: FShort::from_block_center(z),
            yaw: Angle(0),
            pitch: Angle(0),
        }
    }
}

impl ClassicEncode for PlayerPos {
    fn encode(&self, buf: &mut impl BufMut) {
        self.x.encode(buf);
        self.y.encode(buf);
        self.z.encode(buf);
        self.yaw.encode(buf);
        self.pitch.encode(buf);
    }
}

impl ClassicDecode for PlayerPos {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            x: FShort::decode(buf)?,
            y: FShort::decode(buf)?,
            z: FShort::decode(buf)?,
            yaw: Angle::decode(buf)?,
            pitch: Angle::decode(buf)?,
        })
    }
}

/// Wire entity id a client uses to refer to itself.
pub const SELF_ENTITY_ID: u8 = 0xFF;

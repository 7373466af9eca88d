//! SetClickDistance (0x12) — Server → Client. ClickDistance v1.
//!
//! Overrides how far away the client may build, in fixed-point units.

use bytes::{Buf, BufMut};

use crate::codec::{ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;
use crate::types::FShort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetClickDistance {
    pub distance: FShort,
}

impl SetClickDistance {
    pub const ID: u8 = id::SET_CLICK_DISTANCE;
    pub const EXTENSION: &'static str = "ClickDistance";
}

impl ClassicEncode for SetClickDistance {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        self.distance.encode(buf);
    }
}

impl ClassicDecode for SetClickDistance {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            distance: FShort::decode(buf)?,
        })
    }
}

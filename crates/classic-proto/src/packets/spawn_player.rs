//! SpawnPlayer (0x07) — Server → Client.
//!
//! Places an entity in the client's world view. The client's own
//! entity uses wire id 255.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, read_u8, write_string, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;
use crate::types::PlayerPos;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnPlayer {
    /// Per-world entity id, or 255 for the receiving client itself.
    pub entity_id: u8,
    pub name: String,
    pub pos: PlayerPos,
}

impl SpawnPlayer {
    pub const ID: u8 = id::SPAWN_PLAYER;
}

impl ClassicEncode for SpawnPlayer {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        buf.put_u8(self.entity_id);
        write_string(buf, &self.name);
        self.pos.encode(buf);
    }
}

impl ClassicDecode for SpawnPlayer {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            entity_id: read_u8(buf)?,
            name: read_string(buf)?,
            pos: PlayerPos::decode(buf)?,
        })
    }
}

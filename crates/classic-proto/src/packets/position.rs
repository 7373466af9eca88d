//! PositionOrientation (0x08) — both directions.
//!
//! The client reports its own movement with entity id 255; the server
//! broadcasts absolute positions for every moving entity.

use bytes::{Buf, BufMut};

use crate::codec::{read_u8, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;
use crate::types::PlayerPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOrientation {
    /// Moving entity, or 255 when a client reports itself.
    pub entity_id: u8,
    pub pos: PlayerPos,
}

impl PositionOrientation {
    pub const ID: u8 = id::POSITION_ORIENTATION;
}

impl ClassicEncode for PositionOrientation {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        buf.put_u8(self.entity_id);
        self.pos.encode(buf);
    }
}

impl ClassicDecode for PositionOrientation {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            entity_id: read_u8(buf)?,
            pos: PlayerPos::decode(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Angle, FShort};
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = PositionOrientation {
            entity_id: 1,
            pos: PlayerPos {
                x: FShort(300),
                y: FShort(170),
                z: FShort(-12),
                yaw: Angle(128),
                pitch: Angle(32),
            },
        };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        assert_eq!(buf.len(), 10);
        let mut body = buf.freeze();
        body.advance(1);
        assert_eq!(PositionOrientation::decode(&mut body).unwrap(), pkt);
    }

    #[test]
    fn truncated_fails() {
        let raw = [1u8, 0, 100];
        assert!(PositionOrientation::decode(&mut &raw[..]).is_err());
    }
}

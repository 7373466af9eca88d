//! UpdateUserType (0x0F) — Server → Client. Toggles the client's
//! operator status (0x64 op, 0x00 normal).

use bytes::{Buf, BufMut};

use crate::codec::{read_u8, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;

pub const USER_TYPE_NORMAL: u8 = 0x00;
pub const USER_TYPE_OP: u8 = 0x64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateUserType {
    pub user_type: u8,
}

impl UpdateUserType {
    pub const ID: u8 = id::UPDATE_USER_TYPE;
}

impl ClassicEncode for UpdateUserType {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        buf.put_u8(self.user_type);
    }
}

impl ClassicDecode for UpdateUserType {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            user_type: read_u8(buf)?,
        })
    }
}

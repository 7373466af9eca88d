//! Message (0x0D) — both directions.
//!
//! Inbound: a chat line from the player. Outbound: a chat line tagged
//! with the speaking entity's id, or a message-type code when the
//! MessageTypes extension is negotiated.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, read_u8, write_string, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;

/// Outbound routing codes defined by the MessageTypes extension. For
/// plain-protocol clients only `Chat` is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Chat = 0,
    Status1 = 1,
    Status2 = 2,
    Status3 = 3,
    BottomRight1 = 11,
    BottomRight2 = 12,
    BottomRight3 = 13,
    Announcement = 100,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Inbound: unused by plain clients. Outbound: speaker entity id,
    /// or a MessageType code for clients that negotiated it.
    pub tag: u8,
    pub text: String,
}

impl Message {
    pub const ID: u8 = id::MESSAGE;

    pub fn chat(speaker: u8, text: impl Into<String>) -> Self {
        Self {
            tag: speaker,
            text: text.into(),
        }
    }

    pub fn typed(kind: MessageType, text: impl Into<String>) -> Self {
        Self {
            tag: kind as u8,
            text: text.into(),
        }
    }
}

impl ClassicEncode for Message {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        buf.put_u8(self.tag);
        write_string(buf, &self.text);
    }
}

impl ClassicDecode for Message {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            tag: read_u8(buf)?,
            text: read_string(buf)?,
        })
    }
}

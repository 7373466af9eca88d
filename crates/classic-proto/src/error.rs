//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("string field contains non-ASCII byte 0x{0:02X}")]
    NonAsciiString(u8),

    #[error("unknown packet id: 0x{0:02X}")]
    UnknownPacketId(u8),

    #[error("packet 0x{id:02X} requires extension {extension} which was not negotiated")]
    RequiresExtension { id: u8, extension: String },

    #[error("invalid field value in packet 0x{id:02X}: {reason}")]
    InvalidField { id: u8, reason: String },

    #[error("level snapshot compression error: {0}")]
    Compress(String),
}

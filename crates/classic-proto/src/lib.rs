//! Minecraft Classic protocol types, packet definitions, and CPE
//! (Classic Protocol Extension) negotiation.

pub mod codec;
pub mod cpe;
pub mod error;
pub mod level;
pub mod packets;
pub mod spec;
pub mod types;

/// Classic protocol version implemented by this crate.
pub const PROTOCOL_VERSION: u8 = 7;

/// Magic pad byte in PlayerIdentification signalling CPE support.
pub const CPE_MAGIC: u8 = 0x42;

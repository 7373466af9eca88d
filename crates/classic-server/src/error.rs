//! Server error types: startup failures and connection-fatal session
//! errors.

use thiserror::Error;

use classic_proto::error::ProtoError;
use classic_proto::cpe::RegistryError;
use classic_world::WorldError;

/// Errors that abort startup before the listener binds.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end one connection. Never fatal to the process.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unsupported protocol version {0}")]
    UnsupportedProtocolVersion(u8),

    #[error("name verification failed for {0}")]
    AuthenticationFailed(String),

    #[error("packet 0x{id:02X} requires extension {extension}")]
    CapabilityViolation { id: u8, extension: String },

    #[error("world {0} is not available")]
    WorldUnavailable(String),

    #[error("world is full")]
    WorldFull,

    #[error("server is full")]
    ServerFull,

    #[error("unexpected packet 0x{id:02X} during {state}")]
    UnexpectedPacket { id: u8, state: &'static str },

    #[error(transparent)]
    Proto(#[from] ProtoError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Human-readable reason for the 0x0E disconnect packet, where the
    /// socket still permits sending one.
    pub fn disconnect_reason(&self) -> Option<String> {
        match self {
            SessionError::UnsupportedProtocolVersion(v) => {
                Some(format!("Unsupported protocol version {v}"))
            }
            SessionError::AuthenticationFailed(_) => Some("Name verification failed".into()),
            SessionError::CapabilityViolation { extension, .. } => {
                Some(format!("Packet requires unnegotiated extension {extension}"))
            }
            SessionError::WorldUnavailable(name) => Some(format!("World {name} is unavailable")),
            SessionError::WorldFull => Some("World is full".into()),
            SessionError::ServerFull => Some("Server is full".into()),
            SessionError::UnexpectedPacket { .. } => Some("Protocol error".into()),
            SessionError::Proto(_) => Some("Malformed packet".into()),
            // The socket is gone; nothing to tell the client.
            SessionError::Io(_) => None,
        }
    }

    /// A plain EOF is the client hanging up, not a fault worth a
    /// warning.
    pub fn is_clean_close(&self) -> bool {
        matches!(
            self,
            SessionError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof
        )
    }
}

/// Map a world join failure into its session-level meaning.
impl From<WorldError> for SessionError {
    fn from(err: WorldError) -> Self {
        match err {
            WorldError::WorldFull => SessionError::WorldFull,
            other => SessionError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

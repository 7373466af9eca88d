//! Classic server: config, authentication, plugin manager, world
//! persistence, and the per-connection protocol state machine.

pub mod auth;
pub mod config;
pub mod connection;
pub mod error;
pub mod persistence;
pub mod plugin_manager;
pub mod server;

pub use config::ServerConfig;
pub use error::{SessionError, StartupError};
pub use server::Server;

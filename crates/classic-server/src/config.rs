use serde::Deserialize;
use std::path::Path;

use classic_world::OverflowPolicy;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub server: ServerSection,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    pub address: String,
    pub port: u16,
    pub name: String,
    pub motd: String,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    /// Verify client names against md5(salt + name). Off for LAN play.
    #[serde(default)]
    pub verify_names: bool,
    #[serde(default = "default_true")]
    pub enable_cpe: bool,
    /// Names granted operator status at login (case-insensitive).
    #[serde(default)]
    pub operators: Vec<String>,
}

fn default_max_players() -> u32 {
    32
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    #[serde(default = "default_world_name")]
    pub name: String,
    #[serde(default = "default_world_width")]
    pub width: i16,
    #[serde(default = "default_world_height")]
    pub height: i16,
    #[serde(default = "default_world_width")]
    pub depth: i16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Auto-save interval in seconds. 0 = disabled.
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval: u64,
}

fn default_world_name() -> String {
    "main".into()
}

fn default_world_width() -> i16 {
    128
}

fn default_world_height() -> i16 {
    64
}

fn default_data_dir() -> String {
    "worlds".into()
}

fn default_auto_save_interval() -> u64 {
    300
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            width: default_world_width(),
            height: default_world_height(),
            depth: default_world_width(),
            data_dir: default_data_dir(),
            auto_save_interval: default_auto_save_interval(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NetworkSection {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// "drop" evicts the oldest non-critical packet on overflow;
    /// "disconnect" drops the client.
    #[serde(default = "default_overflow_policy")]
    pub overflow_policy: String,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Echo a client's own movement back to it.
    #[serde(default = "default_true")]
    pub echo_self_movement: bool,
}

fn default_queue_capacity() -> usize {
    512
}

fn default_overflow_policy() -> String {
    "drop".into()
}

fn default_idle_timeout() -> u64 {
    60
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            overflow_policy: default_overflow_policy(),
            idle_timeout_secs: default_idle_timeout(),
            echo_self_movement: true,
        }
    }
}

impl NetworkSection {
    pub fn policy(&self) -> OverflowPolicy {
        match self.overflow_policy.as_str() {
            "disconnect" => OverflowPolicy::Disconnect,
            _ => OverflowPolicy::Drop,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

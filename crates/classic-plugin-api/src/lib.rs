//! Plugin API: traits, hooks, and the capability registrar for plugin
//! authors.
//!
//! This crate defines the interface built-in and external plugins
//! implement. It has no dependency on classic-server or classic-proto;
//! protocol-level types are mirrored here so plugins stay decoupled
//! from the wire format.

// ─── Types ───────────────────────────────────────────────────────────────────

/// Information about an online player, passed to plugins in hooks.
#[derive(Debug, Clone)]
pub struct HookPlayer {
    pub name: String,
    pub entity_id: u8,
    pub world: String,
}

/// Block position for plugin hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookBlockPos {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// Log level for plugin logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

/// Result of dispatching a hook to a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookResult {
    /// Continue normal handling.
    Allow,
    /// Veto the action; the message is shown to the acting player.
    Deny { message: String },
}

impl HookResult {
    pub fn deny(message: impl Into<String>) -> Self {
        HookResult::Deny {
            message: message.into(),
        }
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, HookResult::Deny { .. })
    }
}

// ─── Capability registrar ────────────────────────────────────────────────────

/// A protocol extension a plugin wants advertised during negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDecl {
    pub name: &'static str,
    pub version: i32,
}

/// Passed to plugins during enable, before the capability set is
/// frozen. Registrations after startup have no effect on the wire.
pub trait Registrar {
    fn register_extension(&mut self, decl: ExtensionDecl);
    fn log(&self, level: LogLevel, message: &str);
}

// ─── Hooks ───────────────────────────────────────────────────────────────────

/// All actions plugins can observe or veto.
#[derive(Debug, Clone)]
pub enum Hook {
    PlayerJoin {
        player: HookPlayer,
    },
    PlayerQuit {
        player: HookPlayer,
    },
    Chat {
        player: HookPlayer,
        message: String,
    },
    BlockPlace {
        player: HookPlayer,
        position: HookBlockPos,
        block_id: u8,
    },
    BlockBreak {
        player: HookPlayer,
        position: HookBlockPos,
    },
}

impl Hook {
    /// Whether this hook type can be vetoed by a plugin.
    pub fn is_vetoable(&self) -> bool {
        matches!(
            self,
            Hook::Chat { .. } | Hook::BlockPlace { .. } | Hook::BlockBreak { .. }
        )
    }
}

// ─── Plugin trait ────────────────────────────────────────────────────────────

/// Metadata about a plugin.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Implemented by built-in and external plugins.
pub trait Plugin: Send {
    /// Return plugin metadata.
    fn info(&self) -> PluginInfo;

    /// Called once at startup, before capability negotiation begins.
    /// Register protocol extensions here.
    fn on_enable(&mut self, registrar: &mut dyn Registrar);

    /// Called when the server shuts down.
    fn on_disable(&mut self) {}

    /// Called for every dispatched hook. Return `Deny` to veto
    /// vetoable hooks; the deny of a non-vetoable hook is ignored.
    fn on_hook(&mut self, hook: &Hook) -> HookResult {
        let _ = hook;
        HookResult::Allow
    }

    /// Return a default config as JSON. If `Some`, the plugin gets a
    /// config file.
    fn default_config(&self) -> Option<serde_json::Value> {
        None
    }

    /// Called with the loaded config.
    fn load_config(&mut self, _config: serde_json::Value) {}
}

// ─── Tests ───────────────────────────────────────────────────────────────────

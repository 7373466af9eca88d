//! Plugin manager: enables plugins, collects their capability
//! registrations, and dispatches hooks.

use classic_plugin_api::{ExtensionDecl, Hook, HookResult, LogLevel, Plugin, PluginInfo, Registrar};
use classic_proto::cpe::{Capability, CapabilityRegistry, RegistryError};
use classic_proto::packets::{HoldThis, SetClickDistance, TwoWayPing};
use classic_proto::spec::{Direction, FieldType, PacketSpec};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

// ─── Registrar ───────────────────────────────────────────────────────────────

/// Collects extension declarations during plugin enable.
struct RegistrarImpl {
    plugin: String,
    declarations: Vec<ExtensionDecl>,
}

impl Registrar for RegistrarImpl {
    fn register_extension(&mut self, decl: ExtensionDecl) {
        debug!(
            plugin = %self.plugin,
            extension = decl.name,
            version = decl.version,
            "extension declared"
        );
        self.declarations.push(decl);
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!(plugin = %self.plugin, "{message}"),
            LogLevel::Warn => warn!(plugin = %self.plugin, "{message}"),
            LogLevel::Error => error!(plugin = %self.plugin, "{message}"),
            LogLevel::Debug => debug!(plugin = %self.plugin, "{message}"),
        }
    }
}

/// Packet layouts contributed by a known extension. Extensions that
/// only re-type existing fields (MessageTypes) contribute none.
fn extension_packets(name: &str) -> Vec<Arc<PacketSpec>> {
    use FieldType::*;
    match name {
        "ClickDistance" => vec![Arc::new(PacketSpec::extension(
            SetClickDistance::ID,
            "SetClickDistance",
            Direction::ServerToClient,
            vec![Short],
            SetClickDistance::EXTENSION,
        ))],
        "HeldBlock" => vec![Arc::new(PacketSpec::extension(
            HoldThis::ID,
            "HoldThis",
            Direction::ServerToClient,
            vec![Byte, Byte],
            HoldThis::EXTENSION,
        ))],
        "TwoWayPing" => vec![Arc::new(PacketSpec::extension(
            TwoWayPing::ID,
            "TwoWayPing",
            Direction::Both,
            vec![Byte, Short],
            TwoWayPing::EXTENSION,
        ))],
        _ => Vec::new(),
    }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Enable every plugin and feed its extension declarations into
    /// the capability registry. Runs before the registry freezes; a
    /// registry error here aborts startup.
    pub fn enable_all(&mut self, registry: &mut CapabilityRegistry) -> Result<(), RegistryError> {
        for plugin in &mut self.plugins {
            let info = plugin.info();
            let mut registrar = RegistrarImpl {
                plugin: info.name.clone(),
                declarations: Vec::new(),
            };
            plugin.on_enable(&mut registrar);
            for decl in registrar.declarations {
                registry.register(Capability {
                    name: decl.name,
                    version: decl.version,
                    packets: extension_packets(decl.name),
                })?;
            }
            info!(plugin = %info.name, version = %info.version, "plugin enabled");
        }
        Ok(())
    }

    pub fn disable_all(&mut self) {
        for plugin in &mut self.plugins {
            plugin.on_disable();
        }
    }

    /// Dispatch a hook to every plugin in registration order. The
    /// first deny wins; later plugins never see the hook.
    pub fn dispatch(&mut self, hook: &Hook) -> HookResult {
        for plugin in &mut self.plugins {
            if let HookResult::Deny { message } = plugin.on_hook(hook) {
                if hook.is_vetoable() {
                    debug!(plugin = %plugin.info().name, "hook vetoed");
                    return HookResult::Deny { message };
                }
                warn!(
                    plugin = %plugin.info().name,
                    "deny of non-vetoable hook ignored"
                );
            }
        }
        HookResult::Allow
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

// ─── Built-in CPE plugin ─────────────────────────────────────────────────────

/// Registers the protocol extensions the server core implements.
pub struct CpePlugin;

impl Plugin for CpePlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "cpe-core".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: "Built-in protocol extensions".into(),
        }
    }

    fn on_enable(&mut self, registrar: &mut dyn Registrar) {
        for name in ["ClickDistance", "HeldBlock", "MessageTypes", "TwoWayPing"] {
            registrar.register_extension(ExtensionDecl { name, version: 1 });
        }
    }
}

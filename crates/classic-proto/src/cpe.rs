//! CPE capability catalog and per-connection negotiation.
//!
//! Capabilities are registered by modules during startup, then the
//! registry is frozen before the listener accepts its first
//! connection. Negotiation intersects the frozen catalog with the
//! entries a client declares in its ExtInfo/ExtEntry exchange.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::spec::PacketSpec;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("capability {0} is already registered")]
    DuplicateCapability(String),

    #[error("capability registry is frozen; registration is startup-only")]
    RegistryFrozen,
}

/// One named, versioned protocol extension and the packet layouts it
/// contributes. Immutable once registered.
#[derive(Clone, Debug)]
pub struct Capability {
    pub name: &'static str,
    pub version: i32,
    pub packets: Vec<Arc<PacketSpec>>,
}

/// Process-wide capability catalog. Mutable only before `freeze`.
#[derive(Default)]
pub struct CapabilityRegistry {
    caps: Vec<Capability>,
    frozen: bool,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, cap: Capability) -> Result<(), RegistryError> {
        if self.frozen {
            return Err(RegistryError::RegistryFrozen);
        }
        if self.caps.iter().any(|c| c.name == cap.name) {
            return Err(RegistryError::DuplicateCapability(cap.name.to_string()));
        }
        debug!(name = cap.name, version = cap.version, "registered capability");
        self.caps.push(cap);
        Ok(())
    }

    /// Close the catalog. After this, `register` fails and the set
    /// presented during negotiation never changes.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn list(&self) -> &[Capability] {
        &self.caps
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.caps.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.caps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caps.is_empty()
    }
}

/// Capability set agreed with one connection during its handshake.
/// Immutable after handshake completion.
#[derive(Clone, Debug, Default)]
pub struct NegotiatedCaps {
    entries: HashMap<String, i32>,
}

impl NegotiatedCaps {
    /// Empty set: a plain-protocol client.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<(String, i32)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn supports(&self, name: &str, version: i32) -> bool {
        self.entries.get(name) == Some(&version)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.entries.iter().map(|(name, &version)| (name.as_str(), version))
    }
}

/// Intersect the registered catalog with the client-declared entries.
/// Matching is by name with an exact version match; a shared name with
/// a version mismatch drops that single capability, nothing more.
pub fn negotiate(registry: &CapabilityRegistry, client: &[(String, i32)]) -> NegotiatedCaps {
    let mut entries = HashMap::new();
    for cap in registry.list() {
        match client.iter().find(|(name, _)| name.as_str() == cap.name) {
            Some((_, version)) if *version == cap.version => {
                entries.insert(cap.name.to_string(), cap.version);
            }
            Some((_, version)) => {
                debug!(
                    name = cap.name,
                    server = cap.version,
                    client = version,
                    "capability version mismatch, dropping"
                );
            }
            None => {}
        }
    }
    NegotiatedCaps { entries }
}

//! Fingerprint Registry for the VTN
//!
//! Maps VEN identifiers to the certificate fingerprints exchanged out of
//! band. The registry is the default [`FingerprintResolver`]; it can be
//! shared with handlers (for example a registration handler) so VENs are
//! added while the server runs.

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

use vtn_core::{Fingerprint, FingerprintResolver, VtnError};

/// Thread-safe map of VEN id to fingerprint
#[derive(Debug, Default)]
pub struct FingerprintRegistry {
    fingerprints: RwLock<HashMap<String, Fingerprint>>,
}

impl FingerprintRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from `(ven_id, fingerprint)` pairs
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Fingerprint)>) -> Self {
        let registry = Self::new();
        for (ven_id, fingerprint) in entries {
            registry.register(ven_id, fingerprint);
        }
        registry
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register (or replace) the fingerprint for a VEN
    pub fn register(&self, ven_id: impl Into<String>, fingerprint: Fingerprint) {
        let ven_id = ven_id.into();
        let mut fingerprints = self.fingerprints.write().unwrap();
        info!(ven_id = %ven_id, fingerprint = %fingerprint, "Registered VEN fingerprint");
        fingerprints.insert(ven_id, fingerprint);
    }

    /// Register a fingerprint given in its textual form
    pub fn register_str(&self, ven_id: impl Into<String>, fingerprint: &str) -> Result<(), VtnError> {
        let fingerprint = fingerprint.parse::<Fingerprint>()?;
        self.register(ven_id, fingerprint);
        Ok(())
    }

    /// Remove a VEN; returns whether it was registered
    pub fn unregister(&self, ven_id: &str) -> bool {
        let mut fingerprints = self.fingerprints.write().unwrap();
        let removed = fingerprints.remove(ven_id).is_some();
        if removed {
            info!(ven_id = %ven_id, "Unregistered VEN fingerprint");
        }
        removed
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Get the fingerprint registered for a VEN
    pub fn get(&self, ven_id: &str) -> Option<Fingerprint> {
        let fingerprints = self.fingerprints.read().unwrap();
        fingerprints.get(ven_id).copied()
    }

    /// Check if a VEN is registered
    pub fn has(&self, ven_id: &str) -> bool {
        let fingerprints = self.fingerprints.read().unwrap();
        fingerprints.contains_key(ven_id)
    }

    /// Registered VEN ids, sorted
    pub fn list_ven_ids(&self) -> Vec<String> {
        let fingerprints = self.fingerprints.read().unwrap();
        let mut ids: Vec<String> = fingerprints.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered VENs
    pub fn count(&self) -> usize {
        let fingerprints = self.fingerprints.read().unwrap();
        fingerprints.len()
    }
}

impl FingerprintResolver for FingerprintRegistry {
    fn resolve(&self, remote_id: &str) -> Option<Fingerprint> {
        self.get(remote_id)
    }
}

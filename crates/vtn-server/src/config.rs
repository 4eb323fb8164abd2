//! Operator configuration
//!
//! Read from environment variables:
//!
//! | Variable | Default | |
//! |---|---|---|
//! | `VTN_ID` | required | identifier used towards VENs |
//! | `VTN_CERT_PATH` | unset | PEM or DER certificate |
//! | `VTN_KEY_PATH` | unset | PEM or DER PKCS#8 key, set together with the certificate |
//! | `VTN_KEY_PASSPHRASE` | unset | passphrase of an encrypted key |
//! | `VTN_VEN_FINGERPRINTS` | unset | `ven1=AA:BB:..,ven2=..` |
//! | `VTN_BIND_ADDR` | `0.0.0.0` | |
//! | `VTN_PORT` | `8080` | |
//! | `VTN_REQUEST_TIMEOUT_SECS` | unset | per-request timeout |
//! | `VTN_LOG_LEVEL` | `info` | |

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use vtn_core::{Fingerprint, VtnIdentity};

use crate::error::{Result, ServerError};
use crate::keys::FingerprintRegistry;

/// Server configuration
#[derive(Clone)]
pub struct VtnConfig {
    pub vtn_id: String,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    pub key_passphrase: Option<String>,
    /// Fingerprints of known VENs; empty means no sender authentication
    pub ven_fingerprints: Vec<(String, Fingerprint)>,
    pub bind_addr: String,
    pub port: u16,
    pub request_timeout: Option<Duration>,
    pub log_level: String,
}

impl std::fmt::Debug for VtnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VtnConfig")
            .field("vtn_id", &self.vtn_id)
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path)
            .field("key_passphrase", &self.key_passphrase.as_ref().map(|_| "[redacted]"))
            .field("ven_fingerprints", &self.ven_fingerprints)
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("request_timeout", &self.request_timeout)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl VtnConfig {
    /// Configuration with defaults for everything but the VTN id
    pub fn new(vtn_id: impl Into<String>) -> Self {
        Self {
            vtn_id: vtn_id.into(),
            cert_path: None,
            key_path: None,
            key_passphrase: None,
            ven_fingerprints: Vec::new(),
            bind_addr: "0.0.0.0".into(),
            port: 8080,
            request_timeout: None,
            log_level: "info".into(),
        }
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let vtn_id = get("VTN_ID")
            .ok_or_else(|| ServerError::Configuration("VTN_ID must be set".into()))?;
        let mut config = Self::new(vtn_id.trim());

        config.cert_path = get("VTN_CERT_PATH").map(PathBuf::from);
        config.key_path = get("VTN_KEY_PATH").map(PathBuf::from);
        config.key_passphrase = get("VTN_KEY_PASSPHRASE");

        if let Some(raw) = get("VTN_VEN_FINGERPRINTS") {
            config.ven_fingerprints = parse_fingerprints(&raw)?;
        }
        if let Some(addr) = get("VTN_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(port) = get("VTN_PORT") {
            config.port = port.parse().map_err(|_| {
                ServerError::Configuration(format!("VTN_PORT must be a valid port number, got '{}'", port))
            })?;
        }
        if let Some(secs) = get("VTN_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ServerError::Configuration(format!(
                    "VTN_REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    secs
                ))
            })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(level) = get("VTN_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Socket address to listen on
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Load credential files into a [`VtnIdentity`]
    ///
    /// Certificate and key are read as given; validation happens when the
    /// identity context is built.
    pub fn load_identity(&self) -> Result<VtnIdentity> {
        let mut identity = VtnIdentity::unsigned(self.vtn_id.clone());
        identity.certificate = self.cert_path.as_deref().map(read_file).transpose()?;
        identity.private_key = self.key_path.as_deref().map(read_file).transpose()?;
        identity.passphrase = self.key_passphrase.clone();
        Ok(identity)
    }

    /// Fingerprint registry seeded from the configuration, if any VEN is listed
    pub fn fingerprint_registry(&self) -> Option<FingerprintRegistry> {
        if self.ven_fingerprints.is_empty() {
            return None;
        }
        Some(FingerprintRegistry::from_entries(self.ven_fingerprints.clone()))
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        ServerError::Configuration(format!("cannot read {}: {}", path.display(), e))
    })
}

/// Parse `ven1=AA:BB:..,ven2=..`
pub fn parse_fingerprints(raw: &str) -> Result<Vec<(String, Fingerprint)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<(String, Fingerprint)> {
            let (ven_id, fingerprint) = entry.split_once('=').ok_or_else(|| {
                ServerError::Configuration(format!(
                    "VTN_VEN_FINGERPRINTS entry '{}' is not of the form ven_id=fingerprint",
                    entry
                ))
            })?;
            let ven_id = ven_id.trim();
            if ven_id.is_empty() {
                return Err(ServerError::Configuration(format!(
                    "VTN_VEN_FINGERPRINTS entry '{}' has an empty VEN id",
                    entry
                )));
            }
            Ok((ven_id.to_string(), fingerprint.trim().parse::<Fingerprint>()?))
        })
        .collect()
}

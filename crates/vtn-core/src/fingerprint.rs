//! Certificate fingerprints
//!
//! A fingerprint is the last 10 bytes of the SHA-256 digest of a
//! certificate's DER encoding, written as colon separated upper-case hex.
//! Operators exchange fingerprints out of band to recognize each other's
//! certificates without shipping the certificates themselves.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::VtnError;

/// Number of digest bytes kept in a fingerprint
pub const FINGERPRINT_LEN: usize = 10;

/// Short digest identifying a certificate
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Fingerprint of a DER-encoded certificate
    pub fn of_certificate(der: &[u8]) -> Self {
        let digest = Sha256::digest(der);
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest[digest.len() - FINGERPRINT_LEN..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

impl std::str::FromStr for Fingerprint {
    type Err = VtnError;

    /// Accepts `AB:CD:..`, `ab:cd:..` or the same without colons
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s.trim().chars().filter(|c| *c != ':').collect();
        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(VtnError::InvalidFingerprint(format!(
                "invalid character '{}' in '{}'",
                bad, s
            )));
        }
        if hex.len() != FINGERPRINT_LEN * 2 {
            return Err(VtnError::InvalidFingerprint(format!(
                "expected {} hex bytes, got '{}'",
                FINGERPRINT_LEN, s
            )));
        }

        let mut bytes = [0u8; FINGERPRINT_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = hex.get(i * 2..i * 2 + 2).ok_or_else(|| {
                VtnError::InvalidFingerprint(format!("non-ASCII fingerprint '{}'", s))
            })?;
            *byte = u8::from_str_radix(pair, 16).map_err(|_| {
                VtnError::InvalidFingerprint(format!("invalid hex '{}' in '{}'", pair, s))
            })?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

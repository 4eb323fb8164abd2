//! Trust material for inbound senders

pub mod fingerprints;

pub use fingerprints::FingerprintRegistry;

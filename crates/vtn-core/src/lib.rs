//! # VTN Core
//!
//! Message model, credentials and the signed wire codec for an OpenADR
//! Virtual Top Node (VTN).
//!
//! ## Key Concepts
//!
//! - **Message**: a typed OpenADR payload (`oadrRequestEvent`, `oadrPoll`, ...)
//! - **Fingerprint**: short digest of a certificate, exchanged out of band
//! - **IdentityContext**: the VTN's own credentials plus the trust policy for
//!   inbound senders, validated once at startup
//! - **MessageCodec**: sign-and-encode / decode-and-verify, shared by every
//!   service area
//!
//! ## Failure kinds
//!
//! Undecodable bytes are `MalformedMessage`; untrusted senders are
//! `Authentication`. The two never overlap, so a bad message and a bad actor
//! can be told apart.

pub mod codec;
pub mod crypto;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod message;

pub use codec::{MessageCodec, MessageSigner, MessageVerifier, VerifiedMessage};
pub use crypto::{Certificate, SigningIdentity};
pub use error::{AuthenticationFailure, Result, VtnError};
pub use fingerprint::Fingerprint;
pub use identity::{FingerprintResolver, IdentityContext, VtnIdentity};
pub use message::{Message, MessageType, ResponseCode};

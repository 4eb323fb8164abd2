//! OpenADR VTN Server
//!
//! Receives signed OpenADR 2.0b messages from VENs, authenticates the sender,
//! and routes each message to the handler an operator bound to its extension
//! point. Replies are signed with the VTN's own certificate.
//!
//! ## API Endpoints
//!
//! ### Service Endpoints
//! - `POST /OpenADR2/Simple/2.0b/EiEvent` - event requests and acknowledgements
//! - `POST /OpenADR2/Simple/2.0b/EiReport` - report registration and data
//! - `POST /OpenADR2/Simple/2.0b/OadrPoll` - polling
//! - `POST /OpenADR2/Simple/2.0b/EiOpt` - opt schedules (no extension points)
//! - `POST /OpenADR2/Simple/2.0b/EiRegisterParty` - party registration
//!
//! ### Operator Endpoints
//! - `GET /health` - Liveness check
//! - `GET /ready` - Identity, trust mode, handler counts and dispatch statistics
//! - `GET /handlers` - Extension-point catalogue with binding state
//!
//! ## Usage
//!
//! ```ignore
//! let mut server = VtnServer::new(VtnIdentity::unsigned("vtn1"), None)?;
//! server.bind("on_request_event", handler_fn(|msg| async move {
//!     Ok(Message::new(MessageType::DistributeEvent, json!({"events": []})))
//! }))?;
//! server.serve(TcpListener::bind("0.0.0.0:8080").await?).await?;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod keys;
pub mod server;

pub use api::create_router;
pub use api::service::COSE_CONTENT_TYPE;
pub use api::stats::{DispatchStats, StatsSnapshot};
pub use config::VtnConfig;
pub use error::{Result, ServerError};
pub use keys::FingerprintRegistry;
pub use server::VtnServer;

//! VTN Handler Registry
//!
//! The operator-facing extension surface of a VTN: a fixed catalogue of
//! named extension points, grouped by service area, each bound at most once
//! to a [`MessageHandler`].
//!
//! ## Architecture
//!
//! - **Catalogue**: [`HandlerName`] enumerates the extension points and maps
//!   each to its [`ServiceArea`] and inbound message type
//! - **Handlers**: anything implementing [`MessageHandler`]; closures are
//!   adapted with [`handler_fn`] and [`sync_handler_fn`]
//! - **Registry**: [`HandlerRegistry`] validates names and rejects rebinding;
//!   unbound points answer with `NotImplemented`
//!
//! ## Usage
//!
//! ```ignore
//! use vtn_handlers::{handler_fn, HandlerRegistry};
//!
//! let mut registry = HandlerRegistry::new();
//! registry.bind_by_name("on_poll", handler_fn(|msg| async move {
//!     Ok(Message::empty(MessageType::Response))
//! }))?;
//! ```

pub mod catalogue;
pub mod error;
pub mod handler;
pub mod registry;

pub use catalogue::{HandlerName, ServiceArea, SERVICE_PREFIX};
pub use error::{HandlerError, HandlerResult, RegistryError, Result};
pub use handler::{
    handler_fn, sync_handler_fn, FnHandler, MessageHandler, NotImplementedHandler, SyncFnHandler,
};
pub use registry::{ExtensionPoint, HandlerRegistry};

//! Handler Registry - binds extension points to handlers
//!
//! Every extension point in the catalogue starts with a
//! [`NotImplementedHandler`] and may be given an operator handler once.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalogue::{HandlerName, ServiceArea};
use crate::error::{RegistryError, Result};
use crate::handler::{MessageHandler, NotImplementedHandler};

/// Current binding of one extension point
#[derive(Clone)]
enum Binding {
    Default(Arc<dyn MessageHandler>),
    Bound(Arc<dyn MessageHandler>),
}

impl Binding {
    fn handler(&self) -> &Arc<dyn MessageHandler> {
        match self {
            Binding::Default(handler) | Binding::Bound(handler) => handler,
        }
    }

    fn is_bound(&self) -> bool {
        matches!(self, Binding::Bound(_))
    }
}

/// One row of the catalogue listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionPoint {
    pub name: HandlerName,
    pub area: ServiceArea,
    pub message_type: String,
    pub bound: bool,
    pub description: String,
}

/// Registry of extension-point bindings
///
/// Owned by one server; there is no process-wide registry. Binding takes
/// `&mut self`, so once the registry is shared behind an `Arc` it is frozen.
#[derive(Clone)]
pub struct HandlerRegistry {
    bindings: HashMap<HandlerName, Binding>,
}

impl HandlerRegistry {
    /// Create a registry with every extension point on its default binding
    pub fn new() -> Self {
        let bindings = HandlerName::ALL
            .into_iter()
            .map(|name| {
                let handler: Arc<dyn MessageHandler> = Arc::new(NotImplementedHandler::new(name));
                (name, Binding::Default(handler))
            })
            .collect();

        Self { bindings }
    }

    /// Bind a handler to an extension point
    ///
    /// # Errors
    /// * `AlreadyBound` - The point already carries an operator handler
    pub fn bind<H: MessageHandler + 'static>(&mut self, name: HandlerName, handler: H) -> Result<()> {
        self.bind_arc(name, Arc::new(handler))
    }

    /// Bind a handler by its catalogue name
    ///
    /// # Errors
    /// * `UnknownHandler` - `name` is not in the catalogue; the error lists
    ///   every legal name
    /// * `AlreadyBound` - The point already carries an operator handler
    pub fn bind_by_name<H: MessageHandler + 'static>(&mut self, name: &str, handler: H) -> Result<()> {
        let name = name.parse::<HandlerName>().inspect_err(|_| {
            warn!(name = %name, "Attempt to bind unknown handler name");
        })?;
        self.bind(name, handler)
    }

    /// Bind an already shared handler
    pub fn bind_arc(&mut self, name: HandlerName, handler: Arc<dyn MessageHandler>) -> Result<()> {
        if self.is_bound(name) {
            warn!(name = %name, "Extension point already bound");
            return Err(RegistryError::AlreadyBound(name));
        }

        info!(
            name = %name,
            area = %name.area(),
            description = handler.description(),
            "Bound handler"
        );
        self.bindings.insert(name, Binding::Bound(handler));
        Ok(())
    }

    /// The handler currently answering `name`
    pub fn resolve(&self, name: HandlerName) -> Arc<dyn MessageHandler> {
        match self.bindings.get(&name) {
            Some(binding) => binding.handler().clone(),
            None => Arc::new(NotImplementedHandler::new(name)),
        }
    }

    /// Check if an operator handler is bound to `name`
    pub fn is_bound(&self, name: HandlerName) -> bool {
        self.bindings.get(&name).is_some_and(Binding::is_bound)
    }

    /// Extension points with an operator handler, in catalogue order
    pub fn bound_names(&self) -> Vec<HandlerName> {
        HandlerName::ALL
            .into_iter()
            .filter(|name| self.is_bound(*name))
            .collect()
    }

    /// Extension points still on their default binding
    pub fn unbound_names(&self) -> Vec<HandlerName> {
        HandlerName::ALL
            .into_iter()
            .filter(|name| !self.is_bound(*name))
            .collect()
    }

    /// Full catalogue with binding state
    pub fn catalogue(&self) -> Vec<ExtensionPoint> {
        HandlerName::ALL
            .into_iter()
            .map(|name| ExtensionPoint {
                name,
                area: name.area(),
                message_type: name.message_type().to_string(),
                bound: self.is_bound(name),
                description: self.resolve(name).description().to_string(),
            })
            .collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("bound", &self.bound_names())
            .finish()
    }
}

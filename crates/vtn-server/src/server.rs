//! VTN server assembly
//!
//! [`VtnServer`] owns the validated identity and the handler registry. Handlers
//! are bound through `&mut self`; [`VtnServer::into_router`] and
//! [`VtnServer::serve`] consume the server, so the registry cannot change once
//! requests are being answered.

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use vtn_core::{Fingerprint, FingerprintResolver, IdentityContext, VtnIdentity};
use vtn_handlers::{HandlerName, HandlerRegistry, MessageHandler};

use crate::api::{create_router, AppState};
use crate::config::VtnConfig;
use crate::error::Result;
use crate::keys::FingerprintRegistry;

/// An OpenADR VTN ready to have handlers bound
pub struct VtnServer {
    context: IdentityContext,
    registry: HandlerRegistry,
    fingerprints: Option<Arc<FingerprintRegistry>>,
    request_timeout: Option<Duration>,
}

impl VtnServer {
    /// Validate the identity and create a server with every extension point
    /// on its default binding
    ///
    /// Without a resolver, inbound senders are not authenticated.
    pub fn new(
        identity: VtnIdentity,
        resolver: Option<Arc<dyn FingerprintResolver>>,
    ) -> Result<Self> {
        let context = IdentityContext::new(identity, resolver)?;

        if let Some(fingerprint) = context.fingerprint() {
            info!(
                vtn_id = %context.vtn_id(),
                fingerprint = %fingerprint,
                "VTN certificate fingerprint; distribute it to your VENs out of band"
            );
        }

        Ok(Self {
            context,
            registry: HandlerRegistry::new(),
            fingerprints: None,
            request_timeout: None,
        })
    }

    /// Create a server that authenticates senders against `fingerprints`
    ///
    /// The registry stays shared: VENs registered later, for example by a
    /// registration handler, are trusted from then on.
    pub fn with_fingerprint_registry(
        identity: VtnIdentity,
        fingerprints: Arc<FingerprintRegistry>,
    ) -> Result<Self> {
        let resolver: Arc<dyn FingerprintResolver> = fingerprints.clone();
        let mut server = Self::new(identity, Some(resolver))?;
        server.fingerprints = Some(fingerprints);
        Ok(server)
    }

    /// Build a server from operator configuration
    pub fn from_config(config: &VtnConfig) -> Result<Self> {
        let identity = config.load_identity()?;
        let server = match config.fingerprint_registry() {
            Some(registry) => Self::with_fingerprint_registry(identity, Arc::new(registry))?,
            None => Self::new(identity, None)?,
        };
        Ok(server.with_request_timeout(config.request_timeout))
    }

    /// Abort requests that take longer than `timeout` (HTTP 408)
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    // =========================================================================
    // Handler binding
    // =========================================================================

    /// Bind a handler by extension-point name, e.g. `"on_poll"`
    pub fn bind<H: MessageHandler + 'static>(&mut self, name: &str, handler: H) -> Result<()> {
        self.registry.bind_by_name(name, handler)?;
        Ok(())
    }

    /// Bind a handler to a typed extension point
    pub fn bind_handler<H: MessageHandler + 'static>(
        &mut self,
        name: HandlerName,
        handler: H,
    ) -> Result<()> {
        self.registry.bind(name, handler)?;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn vtn_id(&self) -> &str {
        self.context.vtn_id()
    }

    /// Fingerprint of the VTN certificate, `None` in unsigned mode
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.context.fingerprint()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// The fingerprint registry senders are checked against, if one is used
    pub fn fingerprint_registry(&self) -> Option<&Arc<FingerprintRegistry>> {
        self.fingerprints.as_ref()
    }

    // =========================================================================
    // Serving
    // =========================================================================

    /// Freeze the registry and build the HTTP router
    pub fn into_router(self) -> Router {
        let unbound = self.registry.unbound_names();
        if !unbound.is_empty() {
            let names: Vec<&str> = unbound.iter().map(HandlerName::as_str).collect();
            warn!(
                vtn_id = %self.context.vtn_id(),
                unbound = ?names,
                "Extension points without a handler will answer 501"
            );
        }

        let state = Arc::new(AppState::new(&self.context, self.registry));
        create_router(state, self.request_timeout)
    }

    /// Serve on `listener` until Ctrl-C
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        let vtn_id = self.vtn_id().to_string();
        let router = self.into_router();

        info!(vtn_id = %vtn_id, addr = %addr, "VTN listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!(vtn_id = %vtn_id, "VTN stopped");
        Ok(())
    }
}

impl std::fmt::Debug for VtnServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VtnServer")
            .field("context", &self.context)
            .field("registry", &self.registry)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

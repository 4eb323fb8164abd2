//! Message handlers and closure adapters

use async_trait::async_trait;
use std::future::Future;
use vtn_core::Message;

use crate::catalogue::HandlerName;
use crate::error::{HandlerError, HandlerResult};

/// Trait for operator-supplied message handlers
///
/// A handler receives the decoded, authenticated request and returns the
/// reply payload. The server signs and encodes whatever is returned.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one request
    ///
    /// # Returns
    /// * `Ok(Message)` - The reply to send back
    /// * `Err(HandlerError)` - Rendered as a protocol error response
    async fn handle(&self, message: Message) -> HandlerResult;

    /// Get a description of this handler (for logging)
    fn description(&self) -> &str {
        "message handler"
    }
}

/// Adapter for async closures
pub struct FnHandler<F> {
    func: F,
    description: String,
}

impl<F> FnHandler<F> {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, message: Message) -> HandlerResult {
        (self.func)(message).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Wrap an async closure as a handler
///
/// ```ignore
/// server.bind("on_poll", handler_fn(|_msg| async {
///     Ok(Message::empty(MessageType::Response))
/// }))?;
/// ```
pub fn handler_fn<F, Fut>(func: F) -> FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    FnHandler {
        func,
        description: "async closure".to_string(),
    }
}

/// Adapter for closures that answer without suspending
pub struct SyncFnHandler<F> {
    func: F,
    description: String,
}

impl<F> SyncFnHandler<F> {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl<F> MessageHandler for SyncFnHandler<F>
where
    F: Fn(Message) -> HandlerResult + Send + Sync,
{
    async fn handle(&self, message: Message) -> HandlerResult {
        (self.func)(message)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Wrap a plain closure as a handler
pub fn sync_handler_fn<F>(func: F) -> SyncFnHandler<F>
where
    F: Fn(Message) -> HandlerResult + Send + Sync,
{
    SyncFnHandler {
        func,
        description: "closure".to_string(),
    }
}

/// Default binding of every extension point
#[derive(Debug, Clone)]
pub struct NotImplementedHandler {
    name: HandlerName,
    description: String,
}

impl NotImplementedHandler {
    pub fn new(name: HandlerName) -> Self {
        Self {
            name,
            description: format!("default binding for {}", name),
        }
    }
}

#[async_trait]
impl MessageHandler for NotImplementedHandler {
    async fn handle(&self, message: Message) -> HandlerResult {
        Err(HandlerError::NotImplemented(format!(
            "no handler bound to {} for {}",
            self.name, message.message_type
        )))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vtn_core::MessageType;

    #[tokio::test]
    async fn test_async_closure_handler() {
        let handler = handler_fn(|msg: Message| async move {
            Ok(Message::new(MessageType::DistributeEvent, json!({"echo": msg.body})))
        });

        let reply = handler
            .handle(Message::new(MessageType::RequestEvent, json!({"venID": "ven1"})))
            .await
            .unwrap();
        assert_eq!(reply.message_type, MessageType::DistributeEvent);
        assert_eq!(reply.body["echo"]["venID"], "ven1");
        assert_eq!(handler.description(), "async closure");
    }

    #[tokio::test]
    async fn test_sync_closure_handler() {
        let handler = sync_handler_fn(|_msg| Err(HandlerError::Failed("database offline".into())))
            .with_description("registration store");

        let err = handler.handle(Message::empty(MessageType::Poll)).await.unwrap_err();
        assert_eq!(err, HandlerError::Failed("database offline".into()));
        assert_eq!(handler.description(), "registration store");
    }

    #[tokio::test]
    async fn test_default_binding_is_not_implemented() {
        let handler = NotImplementedHandler::new(HandlerName::OnPoll);
        let err = handler.handle(Message::empty(MessageType::Poll)).await.unwrap_err();

        assert!(matches!(err, HandlerError::NotImplemented(_)));
        assert!(err.to_string().contains("on_poll"));
    }
}

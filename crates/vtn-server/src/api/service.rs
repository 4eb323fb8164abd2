//! Service Endpoint Handler
//!
//! One endpoint per service area. Each request goes through:
//!
//! 1. Decode the envelope and authenticate the sender
//! 2. Check that the message type belongs to this area
//! 3. Map the message type to its extension point
//! 4. Invoke the bound handler
//! 5. Sign and encode the reply
//!
//! Every failure in steps 1-4 becomes a signed `oadrResponse` carrying the
//! matching response code. No handler runs for a message that failed
//! decoding or authentication.

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

use vtn_core::{Message, ResponseCode, VerifiedMessage};
use vtn_handlers::{HandlerError, HandlerName, ServiceArea};

use crate::api::error::ApiError;
use crate::api::AppState;

/// Content type of request and response bodies
pub const COSE_CONTENT_TYPE: &str = "application/cose";

/// The transport endpoint of one service area
pub struct ServiceEndpoint {
    area: ServiceArea,
    state: Arc<AppState>,
}

impl ServiceEndpoint {
    pub fn new(area: ServiceArea, state: Arc<AppState>) -> Self {
        Self { area, state }
    }

    /// Run one request body through the pipeline and produce the reply
    pub async fn process(&self, body: &[u8]) -> Message {
        let state = &self.state;

        let verified = match state.codec.decode(body) {
            Ok(verified) => verified,
            Err(err) => {
                state.stats.record_rejected(&err);
                warn!(
                    area = %self.area,
                    error_kind = err.kind(),
                    error = %err,
                    "Rejected inbound message"
                );
                let (code, description) = if err.is_authentication() {
                    (ResponseCode::NotAuthenticated, "Sender could not be authenticated".to_string())
                } else {
                    (ResponseCode::MalformedMessage, err.to_string())
                };
                return self.protocol_error(code, description, None);
            }
        };

        let VerifiedMessage {
            message,
            sender,
            authenticated,
        } = verified;
        let message_type = message.message_type;
        let request_id = message.request_id().map(str::to_owned);

        // An authenticated sender may only speak for itself
        if authenticated {
            if let Some(ven_id) = message.ven_id().filter(|ven_id| *ven_id != sender) {
                state.stats.record_authentication_failure();
                warn!(
                    area = %self.area,
                    sender = %sender,
                    ven_id = %ven_id,
                    error_kind = "authentication",
                    "venID does not match the authenticated sender"
                );
                return self.protocol_error(
                    ResponseCode::NotAuthenticated,
                    "venID does not match the authenticated sender",
                    request_id.as_deref(),
                );
            }
        }

        if ServiceArea::for_message(message_type) != Some(self.area) {
            state.stats.record_wrong_endpoint();
            warn!(
                area = %self.area,
                sender = %sender,
                message_type = %message_type,
                "Message type not served at this endpoint"
            );
            return self.protocol_error(
                ResponseCode::WrongEndpoint,
                format!("{} is not served at {}", message_type, self.area.path()),
                request_id.as_deref(),
            );
        }

        let Some(name) = HandlerName::for_message(message_type) else {
            state.stats.record_not_implemented();
            warn!(
                area = %self.area,
                sender = %sender,
                message_type = %message_type,
                "No extension point for message type"
            );
            return self.protocol_error(
                ResponseCode::NotImplemented,
                format!("{} is not implemented by this VTN", message_type),
                request_id.as_deref(),
            );
        };

        let handler = state.registry.resolve(name);
        match handler.handle(message).await {
            Ok(reply) => {
                state.stats.record_dispatched();
                info!(
                    area = %self.area,
                    handler = %name,
                    sender = %sender,
                    authenticated,
                    reply_type = %reply.message_type,
                    "Dispatched message"
                );
                reply
            }
            Err(err) => {
                state.stats.record_handler_error(&err);
                warn!(
                    area = %self.area,
                    handler = %name,
                    sender = %sender,
                    error_kind = err.kind(),
                    error = %err,
                    "Handler returned an error"
                );
                let code = match &err {
                    HandlerError::NotImplemented(_) => ResponseCode::NotImplemented,
                    HandlerError::InvalidPayload(_) => ResponseCode::MalformedMessage,
                    HandlerError::Failed(_) => ResponseCode::HandlerFailed,
                };
                self.protocol_error(code, err.to_string(), request_id.as_deref())
            }
        }
    }

    fn protocol_error(
        &self,
        code: ResponseCode,
        description: impl Into<String>,
        request_id: Option<&str>,
    ) -> Message {
        Message::response(code, description, request_id, &self.state.vtn_id)
    }
}

/// POST /OpenADR2/Simple/2.0b/{area}
pub async fn handle_message(
    State(endpoint): State<Arc<ServiceEndpoint>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let reply = endpoint.process(&body).await;

    let bytes = endpoint.state.codec.encode(&reply).map_err(|err| {
        error!(
            area = %endpoint.area,
            error_kind = err.kind(),
            error = %err,
            "Failed to encode reply"
        );
        ApiError::from(err)
    })?;

    Ok(([(header::CONTENT_TYPE, COSE_CONTENT_TYPE)], bytes).into_response())
}

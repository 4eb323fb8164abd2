//! Typed OpenADR messages
//!
//! A [`Message`] is the decoded payload that travels inside a signed wire
//! envelope. The message type decides which service area and extension point
//! receive it; the body is left as JSON because its business semantics belong
//! to operator handlers, not to this crate.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// OpenADR 2.0b payload types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "oadrRequestEvent")]
    RequestEvent,
    #[serde(rename = "oadrDistributeEvent")]
    DistributeEvent,
    #[serde(rename = "oadrCreatedEvent")]
    CreatedEvent,
    #[serde(rename = "oadrRegisterReport")]
    RegisterReport,
    #[serde(rename = "oadrRegisteredReport")]
    RegisteredReport,
    #[serde(rename = "oadrCreateReport")]
    CreateReport,
    #[serde(rename = "oadrCreatedReport")]
    CreatedReport,
    #[serde(rename = "oadrRequestReport")]
    RequestReport,
    #[serde(rename = "oadrUpdateReport")]
    UpdateReport,
    #[serde(rename = "oadrUpdatedReport")]
    UpdatedReport,
    #[serde(rename = "oadrCancelReport")]
    CancelReport,
    #[serde(rename = "oadrCanceledReport")]
    CanceledReport,
    #[serde(rename = "oadrPoll")]
    Poll,
    #[serde(rename = "oadrResponse")]
    Response,
    #[serde(rename = "oadrCreateOpt")]
    CreateOpt,
    #[serde(rename = "oadrCreatedOpt")]
    CreatedOpt,
    #[serde(rename = "oadrCancelOpt")]
    CancelOpt,
    #[serde(rename = "oadrCanceledOpt")]
    CanceledOpt,
    #[serde(rename = "oadrQueryRegistration")]
    QueryRegistration,
    #[serde(rename = "oadrCreatePartyRegistration")]
    CreatePartyRegistration,
    #[serde(rename = "oadrCreatedPartyRegistration")]
    CreatedPartyRegistration,
    #[serde(rename = "oadrCancelPartyRegistration")]
    CancelPartyRegistration,
    #[serde(rename = "oadrCanceledPartyRegistration")]
    CanceledPartyRegistration,
}

impl MessageType {
    /// Every message type, in declaration order
    pub const ALL: [MessageType; 23] = [
        MessageType::RequestEvent,
        MessageType::DistributeEvent,
        MessageType::CreatedEvent,
        MessageType::RegisterReport,
        MessageType::RegisteredReport,
        MessageType::CreateReport,
        MessageType::CreatedReport,
        MessageType::RequestReport,
        MessageType::UpdateReport,
        MessageType::UpdatedReport,
        MessageType::CancelReport,
        MessageType::CanceledReport,
        MessageType::Poll,
        MessageType::Response,
        MessageType::CreateOpt,
        MessageType::CreatedOpt,
        MessageType::CancelOpt,
        MessageType::CanceledOpt,
        MessageType::QueryRegistration,
        MessageType::CreatePartyRegistration,
        MessageType::CreatedPartyRegistration,
        MessageType::CancelPartyRegistration,
        MessageType::CanceledPartyRegistration,
    ];

    /// Wire name, e.g. `oadrRequestEvent`
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::RequestEvent => "oadrRequestEvent",
            MessageType::DistributeEvent => "oadrDistributeEvent",
            MessageType::CreatedEvent => "oadrCreatedEvent",
            MessageType::RegisterReport => "oadrRegisterReport",
            MessageType::RegisteredReport => "oadrRegisteredReport",
            MessageType::CreateReport => "oadrCreateReport",
            MessageType::CreatedReport => "oadrCreatedReport",
            MessageType::RequestReport => "oadrRequestReport",
            MessageType::UpdateReport => "oadrUpdateReport",
            MessageType::UpdatedReport => "oadrUpdatedReport",
            MessageType::CancelReport => "oadrCancelReport",
            MessageType::CanceledReport => "oadrCanceledReport",
            MessageType::Poll => "oadrPoll",
            MessageType::Response => "oadrResponse",
            MessageType::CreateOpt => "oadrCreateOpt",
            MessageType::CreatedOpt => "oadrCreatedOpt",
            MessageType::CancelOpt => "oadrCancelOpt",
            MessageType::CanceledOpt => "oadrCanceledOpt",
            MessageType::QueryRegistration => "oadrQueryRegistration",
            MessageType::CreatePartyRegistration => "oadrCreatePartyRegistration",
            MessageType::CreatedPartyRegistration => "oadrCreatedPartyRegistration",
            MessageType::CancelPartyRegistration => "oadrCancelPartyRegistration",
            MessageType::CanceledPartyRegistration => "oadrCanceledPartyRegistration",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown message type: {}", s))
    }
}

/// Protocol-level result codes carried in `oadrResponse`
///
/// These travel inside a valid signed response; the HTTP status stays 2xx.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    Ok,
    MalformedMessage,
    NotAuthenticated,
    WrongEndpoint,
    HandlerFailed,
    NotImplemented,
}

impl ResponseCode {
    pub fn code(&self) -> u16 {
        match self {
            ResponseCode::Ok => 200,
            ResponseCode::MalformedMessage => 400,
            ResponseCode::NotAuthenticated => 401,
            ResponseCode::WrongEndpoint => 405,
            ResponseCode::HandlerFailed => 500,
            ResponseCode::NotImplemented => 501,
        }
    }
}

/// A decoded protocol message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Which protocol payload this is
    pub message_type: MessageType,

    /// Payload contents
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub body: Value,
}

impl Message {
    /// Create a message with the given body
    pub fn new(message_type: MessageType, body: Value) -> Self {
        Self { message_type, body }
    }

    /// Create a message with an empty object body
    pub fn empty(message_type: MessageType) -> Self {
        Self::new(message_type, Value::Object(Map::new()))
    }

    /// Build an `oadrResponse`
    pub fn response(
        code: ResponseCode,
        description: impl Into<String>,
        request_id: Option<&str>,
        vtn_id: &str,
    ) -> Self {
        let mut body = json!({
            "responseCode": code.code(),
            "responseDescription": description.into(),
            "vtnID": vtn_id,
        });
        if let (Some(request_id), Some(obj)) = (request_id, body.as_object_mut()) {
            obj.insert("requestID".into(), Value::String(request_id.to_string()));
        }
        Self::new(MessageType::Response, body)
    }

    /// The `requestID` field of the body, if any
    pub fn request_id(&self) -> Option<&str> {
        self.body.get("requestID").and_then(Value::as_str)
    }

    /// The `venID` field of the body, if any
    pub fn ven_id(&self) -> Option<&str> {
        self.body.get("venID").and_then(Value::as_str)
    }

    /// The `responseCode` of an `oadrResponse`
    pub fn response_code(&self) -> Option<u16> {
        if self.message_type != MessageType::Response {
            return None;
        }
        self.body
            .get("responseCode")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Into::into)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| crate::VtnError::MalformedMessage(format!("invalid payload: {}", e)))
    }
}

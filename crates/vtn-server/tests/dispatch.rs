//! Dispatch Tests
//!
//! These tests drive the full router in-process and check how messages reach
//! handlers:
//! - Every extension point dispatches to exactly the handler bound to it
//! - Unbound points, wrong endpoints and handler failures become protocol
//!   responses with the matching code
//! - Operator endpoints report the catalogue and dispatch statistics

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use vtn_core::{Message, MessageSigner, MessageType, MessageVerifier, VtnIdentity};
use vtn_handlers::{handler_fn, sync_handler_fn, HandlerError, HandlerName, ServiceArea};
use vtn_server::{VtnServer, COSE_CONTENT_TYPE};

// =============================================================================
// Test Helpers
// =============================================================================

fn unsigned_server() -> VtnServer {
    VtnServer::new(VtnIdentity::unsigned("vtn1"), None).expect("unsigned server")
}

async fn post(router: &Router, path: &str, body: Vec<u8>) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, COSE_CONTENT_TYPE)
        .body(Body::from(body))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn get_json(router: &Router, path: &str) -> Value {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send `message` as VEN `ven1` and decode the VTN's reply
async fn exchange(router: &Router, area: ServiceArea, message: &Message) -> Message {
    let bytes = MessageSigner::unsigned("ven1").encode(message).unwrap();
    let (status, body) = post(router, &area.path(), bytes).await;
    assert_eq!(status, StatusCode::OK);

    let reply = MessageVerifier::without_resolver().decode(&body).unwrap();
    assert_eq!(reply.sender, "vtn1");
    reply.message
}

fn request(message_type: MessageType, request_id: &str) -> Message {
    Message::new(message_type, json!({"requestID": request_id, "venID": "ven1"}))
}

// =============================================================================
// Dispatch to bound handlers
// =============================================================================

#[tokio::test]
async fn test_request_event_returns_bound_payload() {
    let payload = Message::new(
        MessageType::DistributeEvent,
        json!({"vtnID": "vtn1", "events": [{"eventID": "evt-1", "signal": "SIMPLE", "level": 2}]}),
    );

    let mut server = unsigned_server();
    let expected = payload.clone();
    server
        .bind(
            "on_request_event",
            handler_fn(move |_msg| {
                let payload = payload.clone();
                async move { Ok(payload) }
            }),
        )
        .unwrap();
    let router = server.into_router();

    let reply = exchange(&router, ServiceArea::Event, &request(MessageType::RequestEvent, "r1")).await;
    assert_eq!(reply, expected);
}

#[tokio::test]
async fn test_every_extension_point_reaches_its_own_handler() {
    let calls: Arc<Mutex<Vec<HandlerName>>> = Arc::new(Mutex::new(Vec::new()));

    let mut server = unsigned_server();
    for name in HandlerName::ALL {
        let calls = calls.clone();
        server
            .bind_handler(
                name,
                sync_handler_fn(move |msg: Message| {
                    calls.lock().unwrap().push(name);
                    Ok(Message::new(
                        MessageType::Response,
                        json!({"handler": name.as_str(), "seen": msg.message_type.as_str()}),
                    ))
                }),
            )
            .unwrap();
    }
    let router = server.into_router();

    for name in HandlerName::ALL {
        calls.lock().unwrap().clear();

        let reply = exchange(&router, name.area(), &request(name.message_type(), "r")).await;

        assert_eq!(reply.body["handler"], name.as_str());
        assert_eq!(reply.body["seen"], name.message_type().as_str());
        assert_eq!(*calls.lock().unwrap(), vec![name]);
    }
}

#[tokio::test]
async fn test_handler_sees_decoded_request() {
    let mut server = unsigned_server();
    server
        .bind(
            "on_update_report",
            sync_handler_fn(|msg| {
                let value = msg.body["reports"][0]["value"]
                    .as_f64()
                    .ok_or_else(|| HandlerError::InvalidPayload("missing value".into()))?;
                Ok(Message::new(
                    MessageType::UpdatedReport,
                    json!({"requestID": msg.request_id(), "doubled": value * 2.0}),
                ))
            }),
        )
        .unwrap();
    let router = server.into_router();

    let update = Message::new(
        MessageType::UpdateReport,
        json!({"requestID": "u1", "venID": "ven1", "reports": [{"value": 21.5}]}),
    );
    let reply = exchange(&router, ServiceArea::Report, &update).await;

    assert_eq!(reply.message_type, MessageType::UpdatedReport);
    assert_eq!(reply.body["requestID"], "u1");
    assert_eq!(reply.body["doubled"], 43.0);
}

// =============================================================================
// Protocol errors
// =============================================================================

#[tokio::test]
async fn test_unbound_extension_point_is_not_implemented() {
    let router = unsigned_server().into_router();

    let reply = exchange(&router, ServiceArea::Poll, &request(MessageType::Poll, "p1")).await;

    assert_eq!(reply.message_type, MessageType::Response);
    assert_eq!(reply.response_code(), Some(501));
    assert_eq!(reply.body["requestID"], "p1");
    assert_eq!(reply.body["vtnID"], "vtn1");
    assert!(reply.body["responseDescription"]
        .as_str()
        .unwrap()
        .contains("on_poll"));
}

#[tokio::test]
async fn test_wrong_endpoint_never_reaches_handler() {
    let calls = Arc::new(Mutex::new(0usize));
    let mut server = unsigned_server();
    let counter = calls.clone();
    server
        .bind(
            "on_request_event",
            sync_handler_fn(move |_msg| {
                *counter.lock().unwrap() += 1;
                Ok(Message::empty(MessageType::DistributeEvent))
            }),
        )
        .unwrap();
    let router = server.into_router();

    let reply = exchange(&router, ServiceArea::Report, &request(MessageType::RequestEvent, "x")).await;
    assert_eq!(reply.response_code(), Some(405));
    assert_eq!(reply.body["requestID"], "x");

    // Outbound-only types are served nowhere
    let reply = exchange(&router, ServiceArea::Event, &request(MessageType::Response, "y")).await;
    assert_eq!(reply.response_code(), Some(405));

    assert_eq!(*calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_opt_messages_are_not_implemented() {
    let router = unsigned_server().into_router();

    let reply = exchange(&router, ServiceArea::Opt, &request(MessageType::CreateOpt, "o1")).await;
    assert_eq!(reply.response_code(), Some(501));
    assert_eq!(reply.body["requestID"], "o1");
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let router = unsigned_server().into_router();

    let (status, body) = post(&router, &ServiceArea::Event.path(), b"<oadrPayload/>".to_vec()).await;
    assert_eq!(status, StatusCode::OK);

    let reply = MessageVerifier::without_resolver().decode(&body).unwrap().message;
    assert_eq!(reply.response_code(), Some(400));
    assert!(reply.request_id().is_none());
}

#[tokio::test]
async fn test_envelope_with_invalid_payload_is_400() {
    use coset::{CborSerializable, CoseSign1Builder, HeaderBuilder};

    let envelope = CoseSign1Builder::new()
        .protected(HeaderBuilder::new().key_id(b"ven1".to_vec()).build())
        .payload(b"{\"messageType\":\"oadrSomethingElse\"}".to_vec())
        .build()
        .to_vec()
        .unwrap();

    let router = unsigned_server().into_router();
    let (_, body) = post(&router, &ServiceArea::Event.path(), envelope).await;
    let reply = MessageVerifier::without_resolver().decode(&body).unwrap().message;
    assert_eq!(reply.response_code(), Some(400));
}

#[tokio::test]
async fn test_handler_errors_map_to_response_codes() {
    let mut server = unsigned_server();
    server
        .bind(
            "on_create_party_registration",
            sync_handler_fn(|_msg| Err(HandlerError::Failed("registration store offline".into()))),
        )
        .unwrap();
    server
        .bind(
            "on_query_registration",
            sync_handler_fn(|_msg| Err(HandlerError::InvalidPayload("missing profile".into()))),
        )
        .unwrap();
    server
        .bind(
            "on_cancel_party_registration",
            sync_handler_fn(|_msg| Err(HandlerError::NotImplemented("cancel disabled".into()))),
        )
        .unwrap();
    let router = server.into_router();

    let failed = exchange(
        &router,
        ServiceArea::Registration,
        &request(MessageType::CreatePartyRegistration, "c1"),
    )
    .await;
    assert_eq!(failed.response_code(), Some(500));
    assert_eq!(failed.body["requestID"], "c1");

    let invalid = exchange(
        &router,
        ServiceArea::Registration,
        &request(MessageType::QueryRegistration, "q1"),
    )
    .await;
    assert_eq!(invalid.response_code(), Some(400));

    let disabled = exchange(
        &router,
        ServiceArea::Registration,
        &request(MessageType::CancelPartyRegistration, "x1"),
    )
    .await;
    assert_eq!(disabled.response_code(), Some(501));
}

#[tokio::test]
async fn test_request_timeout() {
    let mut server = unsigned_server().with_request_timeout(Some(Duration::from_millis(50)));
    server
        .bind(
            "on_poll",
            handler_fn(|_msg| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(Message::empty(MessageType::Response))
            }),
        )
        .unwrap();
    let router = server.into_router();

    let bytes = MessageSigner::unsigned("ven1")
        .encode(&request(MessageType::Poll, "slow"))
        .unwrap();
    let (status, _) = post(&router, &ServiceArea::Poll.path(), bytes).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
}

// =============================================================================
// Operator endpoints
// =============================================================================

#[tokio::test]
async fn test_reply_content_type() {
    let router = unsigned_server().into_router();
    let bytes = MessageSigner::unsigned("ven1")
        .encode(&request(MessageType::Poll, "p"))
        .unwrap();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(ServiceArea::Poll.path())
                .body(Body::from(bytes))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        COSE_CONTENT_TYPE
    );
}

#[tokio::test]
async fn test_health() {
    let router = unsigned_server().into_router();
    let health = get_json(&router, "/health").await;
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn test_handlers_catalogue() {
    let mut server = unsigned_server();
    server
        .bind(
            "on_poll",
            sync_handler_fn(|_msg| Ok(Message::empty(MessageType::Response)))
                .with_description("poll queue"),
        )
        .unwrap();
    let router = server.into_router();

    let catalogue = get_json(&router, "/handlers").await;
    let rows = catalogue.as_array().unwrap();
    assert_eq!(rows.len(), 11);

    let poll = rows.iter().find(|row| row["name"] == "on_poll").unwrap();
    assert_eq!(poll["bound"], true);
    assert_eq!(poll["area"], "poll");
    assert_eq!(poll["message_type"], "oadrPoll");
    assert_eq!(poll["description"], "poll queue");

    let event = rows.iter().find(|row| row["name"] == "on_created_event").unwrap();
    assert_eq!(event["bound"], false);
}

#[tokio::test]
async fn test_ready_reports_dispatch_statistics() {
    let mut server = unsigned_server();
    server
        .bind(
            "on_poll",
            sync_handler_fn(|_msg| Ok(Message::empty(MessageType::Response))),
        )
        .unwrap();
    let router = server.into_router();

    exchange(&router, ServiceArea::Poll, &request(MessageType::Poll, "1")).await;
    exchange(&router, ServiceArea::Poll, &request(MessageType::Poll, "2")).await;
    exchange(&router, ServiceArea::Event, &request(MessageType::CreatedEvent, "3")).await;
    exchange(&router, ServiceArea::Event, &request(MessageType::Poll, "4")).await;
    post(&router, &ServiceArea::Event.path(), b"garbage".to_vec()).await;

    let ready = get_json(&router, "/ready").await;
    assert_eq!(ready["ready"], true);
    assert_eq!(ready["vtn_id"], "vtn1");
    assert_eq!(ready["signing"], false);
    assert_eq!(ready["authenticating_senders"], false);
    assert!(ready.get("fingerprint").is_none());
    assert_eq!(ready["bound_handlers"], 1);
    assert_eq!(ready["unbound_handlers"], 10);

    let stats = &ready["stats"];
    assert_eq!(stats["dispatched"], 2);
    assert_eq!(stats["not_implemented"], 1);
    assert_eq!(stats["wrong_endpoint"], 1);
    assert_eq!(stats["malformed"], 1);
    assert_eq!(stats["authentication_failures"], 0);
}

#[tokio::test]
async fn test_servers_are_independent() {
    let mut first = unsigned_server();
    first
        .bind(
            "on_poll",
            sync_handler_fn(|_msg| Ok(Message::new(MessageType::Response, json!({"from": "first"})))),
        )
        .unwrap();
    let second = unsigned_server();

    let first = first.into_router();
    let second = second.into_router();

    let a = exchange(&first, ServiceArea::Poll, &request(MessageType::Poll, "a")).await;
    let b = exchange(&second, ServiceArea::Poll, &request(MessageType::Poll, "b")).await;
    assert_eq!(a.body["from"], "first");
    assert_eq!(b.response_code(), Some(501));
}

use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::notifications::mailer::StartupMailer;
use crate::notifications::notification_router;

fn notify_request(body: Value) -> Request<Body> {
    Request::post("/api/v1/notifications/startup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serializable")))
        .expect("valid request")
}

async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[tokio::test]
async fn notify_route_accepts_feedback_email() {
    let (mailer, transport) = build_mailer();
    let app = notification_router(Arc::new(mailer));

    let response = app
        .oneshot(notify_request(json!({
            "startup": startup(),
            "notification": {
                "kind": "feedback",
                "feedback": { "id": "fb-1", "feedback": "Great demo day." },
                "sender": { "email": "mentor@sv.co" }
            }
        })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["subject"], "Feedback from Team SV.");
    assert_eq!(payload["reply_to"], "mentor@sv.co");
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn notify_route_rejects_startups_without_founders() {
    let (mailer, transport) = build_mailer();
    let app = notification_router(Arc::new(mailer));
    let mut contact = startup();
    contact.founders.clear();

    let response = app
        .oneshot(notify_request(json!({
            "startup": contact,
            "notification": { "kind": "startup_rejected" }
        })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn notify_route_reports_transport_outage() {
    let app = notification_router(Arc::new(StartupMailer::new(
        Arc::new(OfflineTransport),
        FROM,
    )));

    let response = app
        .oneshot(notify_request(json!({
            "startup": startup(),
            "notification": { "kind": "startup_approved" }
        })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|message| message.contains("smtp relay offline")));
}

//! Attribute write, read and delete flows over the HTTP surface

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{BASE, DEVICE, OTHER_TENANT, TestApp, body_json, body_text};
use telegate_core::{AttributeScope, AuditOperation, TelemetryUpdate};

#[tokio::test]
async fn test_write_then_read_values_and_keys() {
    let app = TestApp::new();

    let response = app
        .post(
            &format!("/DEVICE/{DEVICE}/SERVER_SCOPE"),
            r#"{"firmware": "1.4.2", "maxTemp": 80, "active": true}"#,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get(&format!("/DEVICE/{DEVICE}/values/attributes/SERVER_SCOPE?keys=maxTemp"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["key"], "maxTemp");
    assert_eq!(body[0]["value"], 80);
    assert!(body[0]["lastUpdateTs"].as_i64().unwrap() > 0);

    let response = app.get(&format!("/DEVICE/{DEVICE}/keys/attributes")).await;
    assert_eq!(
        body_json(response).await,
        serde_json::json!(["firmware", "maxTemp", "active"])
    );
}

#[tokio::test]
async fn test_short_write_path_targets_device() {
    let app = TestApp::new();

    let response = app
        .post(&format!("/{DEVICE}/SHARED_SCOPE"), r#"{"targetFirmware": "2.0"}"#)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get(&format!("/DEVICE/{DEVICE}/values/attributes/SHARED_SCOPE"))
        .await;
    assert_eq!(body_json(response).await[0]["value"], "2.0");

    match &app.notifier.updates()[0] {
        TelemetryUpdate::Attributes { scope, attributes, .. } => {
            assert_eq!(*scope, AttributeScope::Shared);
            assert_eq!(attributes.len(), 1);
        }
        other => panic!("unexpected update: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_scope_is_deletable_but_not_writable() {
    let app = TestApp::new();

    let response = app
        .post(&format!("/DEVICE/{DEVICE}/CLIENT_SCOPE"), r#"{"mode": "eco"}"#)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.notifier.updates().is_empty());

    let response = app
        .delete(&format!("/DEVICE/{DEVICE}/CLIENT_SCOPE?keys=mode"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_removes_only_named_keys() {
    let app = TestApp::new();
    app.post(&format!("/DEVICE/{DEVICE}/SERVER_SCOPE"), r#"{"a": 1, "b": 2, "c": 3}"#)
        .await;

    let response = app
        .delete(&format!("/DEVICE/{DEVICE}/SERVER_SCOPE?keys=a,c"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get(&format!("/DEVICE/{DEVICE}/keys/attributes/SERVER_SCOPE"))
        .await;
    assert_eq!(body_json(response).await, serde_json::json!(["b"]));

    let operations: Vec<AuditOperation> = app.audit.events().iter().map(|e| e.operation).collect();
    assert_eq!(
        operations,
        vec![AuditOperation::AttributesUpdated, AuditOperation::AttributesDeleted]
    );
}

#[tokio::test]
async fn test_delete_without_keys_is_400() {
    let app = TestApp::new();

    let response = app.delete(&format!("/DEVICE/{DEVICE}/SERVER_SCOPE")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.audit.events().is_empty());
}

#[tokio::test]
async fn test_values_read_is_audited() {
    let app = TestApp::new();

    app.get(&format!("/DEVICE/{DEVICE}/values/attributes?keys=a")).await;

    let events = app.audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].operation, AuditOperation::AttributesRead);
    assert_eq!(events[0].keys, Some(vec!["a".to_string()]));
}

#[tokio::test]
async fn test_write_without_tenant_is_rejected() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri(format!("{BASE}/DEVICE/{DEVICE}/SERVER_SCOPE"))
                .body(Body::from(r#"{"a": 1}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.starts_with("Tenant required"));
}

#[tokio::test]
async fn test_invalid_tenant_header_is_rejected() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri(format!("{BASE}/DEVICE/{DEVICE}/SERVER_SCOPE"))
                .header("x-tenant-id", "not-a-tenant")
                .body(Body::from(r#"{"a": 1}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_foreign_tenant_write_is_forbidden() {
    let app = TestApp::new();
    app.post(&format!("/DEVICE/{DEVICE}/SERVER_SCOPE"), r#"{"a": 1}"#)
        .await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri(format!("{BASE}/DEVICE/{DEVICE}/SERVER_SCOPE"))
                .header("x-tenant-id", OTHER_TENANT)
                .body(Body::from(r#"{"a": 2}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_json(response).await["message"].is_string());
    assert_eq!(app.notifier.updates().len(), 1);
}

#[tokio::test]
async fn test_store_failure_on_attribute_write_is_400() {
    let app = TestApp::new();
    app.store.fail_next("replica offline");

    let response = app
        .post(&format!("/DEVICE/{DEVICE}/SERVER_SCOPE"), r#"{"a": 1}"#)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.notifier.updates().is_empty());

    let events = app.audit.events();
    assert_eq!(events.len(), 1);
    assert!(events[0].error.is_some());
}

#[tokio::test]
async fn test_empty_attribute_payload_is_rejected() {
    let app = TestApp::new();

    let response = app.post(&format!("/DEVICE/{DEVICE}/SERVER_SCOPE"), "{}").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_text(response).await,
        "No attributes data found in request body!"
    );
}

#[tokio::test]
async fn test_audit_events_carry_request_and_trace_ids() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri(format!("{BASE}/DEVICE/{DEVICE}/SERVER_SCOPE"))
                .header("x-tenant-id", common::TENANT)
                .header("x-request-id", "e2e-audit-1")
                .header("traceparent", "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01")
                .body(Body::from(r#"{"a": 1}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "e2e-audit-1");

    let events = app.audit.events();
    assert_eq!(events[0].request_id.as_deref(), Some("e2e-audit-1"));
    assert_eq!(
        events[0].trace_id.as_deref(),
        Some("4bf92f3577b34da6a3ce929d0e0e4736")
    );
}

//! Webhook delivery against a local HTTP listener

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use career_assistant_core::{Error, NotificationChannel, NotificationMessage, NotificationSink};
use career_assistant_notify::SlackWebhookSink;

type Received = Arc<Mutex<Vec<serde_json::Value>>>;

async fn spawn_webhook(status: StatusCode) -> (String, Received) {
    let received: Received = Arc::default();

    let app = Router::new()
        .route(
            "/hook",
            post(
                move |State(received): State<Received>, Json(body): Json<serde_json::Value>| async move {
                    received.lock().push(body);
                    status
                },
            ),
        )
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/hook", addr), received)
}

#[tokio::test]
async fn test_delivers_payload() {
    let (url, received) = spawn_webhook(StatusCode::OK).await;
    let sink = SlackWebhookSink::new(Duration::from_secs(2)).unwrap();

    sink.send(
        &NotificationChannel::new("test", url),
        &NotificationMessage::plain("hello"),
    )
    .await
    .unwrap();

    let bodies = received.lock().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["text"], "hello");
}

#[tokio::test]
async fn test_non_success_status_is_error() {
    let (url, received) = spawn_webhook(StatusCode::FORBIDDEN).await;
    let sink = SlackWebhookSink::new(Duration::from_secs(2)).unwrap();

    let err = sink
        .send(
            &NotificationChannel::new("test", url),
            &NotificationMessage::plain("hello"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.upstream_status(), Some(403));
    assert_eq!(received.lock().len(), 1);
}

#[tokio::test]
async fn test_unreachable_webhook_is_error() {
    let sink = SlackWebhookSink::new(Duration::from_millis(500)).unwrap();
    let result = sink
        .send(
            &NotificationChannel::new("test", "http://127.0.0.1:1/hook"),
            &NotificationMessage::plain("hello"),
        )
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_slow_webhook_reports_configured_timeout() {
    let app = Router::new().route(
        "/hook",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let sink = SlackWebhookSink::new(Duration::from_millis(200)).unwrap();
    let err = sink
        .send(
            &NotificationChannel::new("test", format!("http://{}/hook", addr)),
            &NotificationMessage::plain("hello"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(200)), "got {:?}", err);
}

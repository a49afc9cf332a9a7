//! HTTP Endpoints
//!
//! Router, CORS and the small endpoints that do not warrant their own module.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::{assistant, live_chat, notifications, ServerError};

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_origins);
    let body_limit = state.settings.server.body_limit_bytes;

    let assistant_route = || post_only(post(assistant::handle));

    let mut router = Router::new()
        // Completion proxy, plus the path the widget used when hosted on Netlify
        .route("/api/assistant", assistant_route())
        .route("/.netlify/functions/claude", assistant_route())
        // Notification relay
        .route("/api/contact", post_only(post(notifications::contact)))
        .route("/api/chat", post_only(post(notifications::chat)))
        .route("/api/slack-dm", post_only(post(notifications::slack_dm)))
        // Live chat
        .route("/ws/live-chat", get(live_chat::ws_handler))
        .route("/api/live-chat/reply", post_only(post(live_chat::operator_reply)))
        .route("/health", get(health_check));

    if state.settings.observability.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// `OPTIONS` answers 200, any method other than `POST` answers 405
fn post_only(router: MethodRouter<AppState>) -> MethodRouter<AppState> {
    router
        .options(|| async { StatusCode::OK })
        .fallback(|| async { ServerError::MethodNotAllowed })
}

/// Wildcard origin unless specific origins are configured
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::warn!("All configured CORS origins are invalid, allowing any origin");
        return layer.allow_origin(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed.len());
    layer.allow_origin(parsed)
}

/// `GET /health`
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "completionConfigured": state.completion.is_some(),
        "notificationsConfigured": state.notification_channel().is_some(),
        "liveChatConnections": state.live_chat.connection_count(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

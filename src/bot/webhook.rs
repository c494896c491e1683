//! Webhook endpoint for OneBot "HTTP POST" event reporting.
//!
//! The OneBot implementation POSTs every event as JSON. Requests are
//! answered with `204` right away and the event is handled on its own
//! task, so a slow lookup or send never holds up the reporter.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use super::dispatcher::AppState;
use crate::onebot::event::RawEvent;

/// Build the webhook router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(receive_event))
        .route("/onebot", post(receive_event))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

async fn receive_event(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if !is_authorized(state.access_token.as_deref(), &headers, query.access_token.as_deref()) {
        warn!("Rejected webhook request with a missing or wrong access token");
        return StatusCode::UNAUTHORIZED;
    }

    let event: RawEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            debug!("Undecodable webhook body: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    if event.is_meta() {
        trace!("Meta event: {:?}", event.meta_event_type);
        return StatusCode::NO_CONTENT;
    }

    if state.resolver.should_handle(&event) {
        tokio::spawn(async move {
            state.handle_event(event).await;
        });
    }

    StatusCode::NO_CONTENT
}

/// Check the bearer header or `access_token` query parameter.
fn is_authorized(expected: Option<&str>, headers: &HeaderMap, query_token: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };

    let header_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("Token ")))
        .map(str::trim);

    [header_token, query_token]
        .into_iter()
        .flatten()
        .any(|token| constant_time_eq(token, expected))
}

/// Compare tokens without short-circuiting on the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

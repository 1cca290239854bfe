use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::server::api::{self, ApiError};
use crate::server::{sync, AppState};

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn json(body: String) -> Self {
        Self {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body,
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

fn split_path(path: &str) -> (&str, &str) {
    match path.split_once('?') {
        Some((route, query)) => (route, query),
        None => (path, ""),
    }
}

/// Dispatch one request against the shared state. Pure apart from the state locks, so it is
/// testable without a socket.
pub fn route_request(
    method: &str,
    path: &str,
    body: &str,
    sync_token: Option<&str>,
    state: &AppState,
) -> HttpResponse {
    let (route, query) = split_path(path);
    let segments: Vec<&str> = route.trim_matches('/').split('/').collect();

    let result = match (method, segments.as_slice()) {
        ("GET", ["api", "health"]) => api::health_payload(state),
        ("GET", ["api", "fleets", id]) => api::fleet_payload(state, id),
        ("GET", ["api", "ships"]) => api::ships_payload(state, query),
        ("GET", ["api", "equipment"]) => api::equipment_payload(state, query),
        ("GET", ["api", "battles"]) => api::battles_list_payload(state),
        ("POST", ["api", "battles"]) => api::battle_ingest_payload(state, body),
        ("GET", ["api", "battles", id, "summary"]) => api::summary_payload(state, id),
        ("GET", ["api", "battles", id, "phases"]) => api::phases_payload(state, id),
        ("POST", ["api", "sync"]) => return sync::sync_payload(body, sync_token, state),
        _ => Err(ApiError::RouteNotFound),
    };

    match result {
        Ok(payload) => HttpResponse::json(payload),
        Err(err) => error_response(&err),
    }
}

pub(crate) fn error_response(err: &ApiError) -> HttpResponse {
    let (status_code, status_text) = err.status();
    if status_code >= 500 {
        tracing::error!(target: "fleetview::server", error = %err, "request.failed");
    }
    json_error(status_code, status_text, &err.to_string())
}

pub(crate) fn json_error(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    let body = serde_json::json!({
        "status": "error",
        "message": message,
    });
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: serde_json::to_string_pretty(&body)
            .unwrap_or_else(|_| r#"{"status":"error","message":"Unknown error"}"#.to_string()),
    }
}

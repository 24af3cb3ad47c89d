//! API layer - HTTP and WebSocket entry points.

pub mod connections;
pub mod http;
pub mod session;
pub mod websocket;

pub use connections::{ConnectionManager, SharedConnectionManager};

use axum::http::HeaderMap;
use farmstead_domain::UserId;
use uuid::Uuid;

/// Header the client uses to identify its user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity from the `X-User-Id` header, if present and well-formed.
pub fn user_id_from_headers(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .map(UserId::from_uuid)
}

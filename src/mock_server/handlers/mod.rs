//! HTTP request handlers for the mock server.

pub mod auth;
pub mod replists;
pub mod stored_queries;
pub mod users;

pub use auth::*;
pub use replists::*;
pub use stored_queries::*;
pub use users::*;

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;
use crate::pagination::DEFAULT_PAGE_LIMIT;

pub type SharedState = Arc<RwLock<MockState>>;

/// Cursor and limit of a collection request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

impl PageQuery {
    pub fn limit(&self) -> usize {
        self.limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT as usize)
    }
}

/// Error response in the Cybsi `{code, message}` format.
pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "code": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn not_found(what: &str) -> Response {
    api_error(StatusCode::NOT_FOUND, "NotFound", format!("{what} not found"))
}

/// Reject requests without the current access token.
pub fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if state.is_authorized(authorization) {
        Ok(())
    } else {
        Err(api_error(
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            "access token is missing or expired",
        ))
    }
}

/// `Link` header value pointing at the next page.
pub fn next_link(path: &str, cursor: &str, limit: usize) -> String {
    format!(
        "<{path}?cursor={}&limit={limit}>; rel=\"next\"",
        urlencoding::encode(cursor)
    )
}

/// Insert a header, skipping values that are not valid header text.
///
/// `name` must be lowercase.
pub fn set_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

/// Full view response carrying an `ETag`.
pub fn tagged<T: Serialize>(etag: &str, view: &T) -> Response {
    let mut headers = HeaderMap::new();
    set_header(&mut headers, "etag", etag);
    (StatusCode::OK, headers, Json(view)).into_response()
}

/// Serve one page of `items` with offset cursors.
///
/// The cursor of a page is `offset=N`; it is advertised in `X-Cursor` and
/// in the `Link` header only while more items follow.
pub fn paginate<T: Serialize>(
    items: &[T],
    path: &str,
    query: &PageQuery,
    mut headers: HeaderMap,
) -> Response {
    let offset = match query.cursor.as_deref() {
        None | Some("") => 0,
        Some(cursor) => match cursor
            .strip_prefix("offset=")
            .and_then(|n| n.parse::<usize>().ok())
        {
            Some(offset) => offset.min(items.len()),
            None => {
                return api_error(
                    StatusCode::BAD_REQUEST,
                    "InvalidCursor",
                    format!("malformed cursor '{cursor}'"),
                )
            }
        },
    };

    let limit = query.limit();
    let end = (offset + limit).min(items.len());
    if end < items.len() {
        let cursor = format!("offset={end}");
        set_header(&mut headers, "x-cursor", &cursor);
        set_header(&mut headers, "link", &next_link(path, &cursor, limit));
    }

    (StatusCode::OK, headers, Json(&items[offset..end])).into_response()
}

//! User endpoint handlers.

use axum::{extract::State, http::HeaderMap, response::Response};

use super::{authorize, not_found, tagged, SharedState};

/// GET /users/me
pub async fn get_me(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = state.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    match &state.current_user {
        Some(user) => tagged("\"1\"", user),
        None => not_found("user"),
    }
}

//! Token endpoint handler.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{api_error, SharedState};

/// Lifetime of issued tokens, in seconds.
const TOKEN_LIFETIME: u64 = 3600;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenQuery {
    pub api_key: Option<String>,
}

/// GET /auth/token
pub async fn get_token(
    State(state): State<SharedState>,
    Query(query): Query<TokenQuery>,
) -> Response {
    let mut state = state.write().await;

    if query.api_key.as_deref() != Some(state.api_key.as_str()) {
        return api_error(
            StatusCode::FORBIDDEN,
            "InvalidCredentials",
            "API key is invalid or revoked",
        );
    }

    let token = state.issue_token();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "accessToken": token,
            "tokenType": "Bearer",
            "expiresIn": TOKEN_LIFETIME,
        })),
    )
        .into_response()
}

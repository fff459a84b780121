//! Stored query endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{authorize, not_found, paginate, tagged, PageQuery, SharedState};
use crate::{RefView, StoredQueryCommonView, StoredQueryView, Tag};

/// Body of `POST /search/stored-queries`.
#[derive(Debug, Deserialize)]
pub struct StoredQueryBody {
    pub name: String,
    pub text: String,
}

/// GET /search/stored-queries
pub async fn list_stored_queries(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let state = state.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let items: Vec<StoredQueryCommonView> = state
        .stored_queries
        .values()
        .map(|q| StoredQueryCommonView {
            uuid: q.uuid,
            url: q.url.clone(),
            name: q.name.clone(),
        })
        .collect();
    paginate(&items, "/search/stored-queries", &query, HeaderMap::new())
}

/// GET /search/stored-queries/{uuid}
pub async fn get_stored_query(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(uuid): Path<Uuid>,
) -> Response {
    let state = state.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    match state.stored_queries.get(&uuid) {
        Some(query) => tagged("\"1\"", query),
        None => not_found("stored query"),
    }
}

/// POST /search/stored-queries
pub async fn register_stored_query(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<StoredQueryBody>,
) -> Response {
    let mut state = state.write().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let author = match &state.current_user {
        Some(user) => RefView {
            uuid: user.uuid,
            url: None,
        },
        None => return not_found("user"),
    };

    let uuid = Uuid::new_v4();
    state.stored_queries.insert(
        uuid,
        StoredQueryView {
            uuid,
            url: None,
            name: body.name,
            text: body.text,
            author,
            tag: Tag::default(),
        },
    );

    (StatusCode::CREATED, Json(RefView { uuid, url: None })).into_response()
}

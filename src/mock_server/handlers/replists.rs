//! Replist endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{
    api_error, authorize, next_link, not_found, paginate, set_header, tagged, PageQuery,
    SharedState,
};
use crate::mock_server::state::MockReplist;
use crate::{
    RefView, ReplistCommonView, ReplistView, ShareLevel, StoredQueryCommonView, Tag,
};

/// Body of replist registration and edit requests.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplistBody {
    #[serde(rename = "queryUUID")]
    pub query_uuid: Option<Uuid>,
    pub share_level: Option<ShareLevel>,
    pub is_enabled: Option<bool>,
}

/// Change log cursor pointing after the first `position` changes.
pub fn change_cursor(position: usize) -> String {
    format!("ch-{position}")
}

fn parse_change_cursor(cursor: &str) -> Option<usize> {
    cursor.strip_prefix("ch-")?.parse().ok()
}

fn stored_query_not_found() -> Response {
    api_error(
        StatusCode::UNPROCESSABLE_ENTITY,
        "StoredQueryNotFound",
        "stored query not found",
    )
}

/// GET /replists
pub async fn list_replists(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let state = state.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let items: Vec<ReplistCommonView> = state
        .replists
        .values()
        .map(|r| r.view.common.clone())
        .collect();
    paginate(&items, "/replists", &query, HeaderMap::new())
}

/// GET /replists/{uuid}
pub async fn get_replist(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(uuid): Path<Uuid>,
) -> Response {
    let state = state.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    match state.replists.get(&uuid) {
        Some(replist) => tagged(&replist.etag(), &replist.view),
        None => not_found("replist"),
    }
}

/// POST /replists
pub async fn register_replist(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<ReplistBody>,
) -> Response {
    let mut state = state.write().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let (Some(query_uuid), Some(share_level)) = (body.query_uuid, body.share_level) else {
        return api_error(
            StatusCode::BAD_REQUEST,
            "InvalidData",
            "queryUUID and shareLevel are required",
        );
    };
    let Some(query) = state.stored_queries.get(&query_uuid) else {
        return stored_query_not_found();
    };
    let Some(author) = state.current_user.as_ref().map(|u| u.uuid) else {
        return not_found("user");
    };

    let uuid = Uuid::new_v4();
    let replist = MockReplist::new(ReplistView {
        common: ReplistCommonView {
            uuid,
            url: None,
            query: StoredQueryCommonView {
                uuid: query.uuid,
                url: None,
                name: query.name.clone(),
            },
            author: RefView {
                uuid: author,
                url: None,
            },
            share_level,
            is_enabled: body.is_enabled.unwrap_or(true),
        },
        status: "Active".to_string(),
        updated_at: Some(chrono::Utc::now()),
        tag: Tag::default(),
    });
    state.replists.insert(uuid, replist);

    (StatusCode::CREATED, Json(RefView { uuid, url: None })).into_response()
}

/// PATCH /replists/{uuid}
pub async fn edit_replist(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(uuid): Path<Uuid>,
    Json(body): Json<ReplistBody>,
) -> Response {
    let mut state = state.write().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let query = match body.query_uuid {
        Some(query_uuid) => match state.stored_queries.get(&query_uuid) {
            Some(query) => Some(StoredQueryCommonView {
                uuid: query.uuid,
                url: None,
                name: query.name.clone(),
            }),
            None => return stored_query_not_found(),
        },
        None => None,
    };

    let Some(replist) = state.replists.get_mut(&uuid) else {
        return not_found("replist");
    };

    let if_match = headers.get(header::IF_MATCH).and_then(|v| v.to_str().ok());
    if if_match != Some(replist.etag().as_str()) {
        return api_error(
            StatusCode::PRECONDITION_FAILED,
            "ResourceModified",
            "replist was modified",
        );
    }

    if let Some(query) = query {
        replist.view.common.query = query;
    }
    if let Some(share_level) = body.share_level {
        replist.view.common.share_level = share_level;
    }
    if let Some(is_enabled) = body.is_enabled {
        replist.view.common.is_enabled = is_enabled;
    }
    replist.version += 1;
    replist.view.updated_at = Some(chrono::Utc::now());

    StatusCode::NO_CONTENT.into_response()
}

/// GET /replists/{uuid}/entities
///
/// Every page carries the change cursor of the moment it was served.
pub async fn list_replist_entities(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(uuid): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Response {
    let state = state.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let Some(replist) = state.replists.get(&uuid) else {
        return not_found("replist");
    };

    let mut response_headers = HeaderMap::new();
    set_header(
        &mut response_headers,
        "x-change-cursor",
        &change_cursor(replist.changes.len()),
    );
    paginate(
        &replist.entities,
        &format!("/replists/{uuid}/entities"),
        &query,
        response_headers,
    )
}

/// GET /replists/{uuid}/changes
///
/// Pages advertise `X-Cursor` whenever they carry changes. A poll at the
/// head of the log returns an empty page without a cursor.
pub async fn list_replist_changes(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(uuid): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Response {
    let state = state.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let Some(replist) = state.replists.get(&uuid) else {
        return not_found("replist");
    };
    let Some(cursor) = query.cursor.as_deref() else {
        return api_error(StatusCode::BAD_REQUEST, "InvalidData", "cursor is required");
    };

    let position = match parse_change_cursor(cursor) {
        Some(p) if p >= replist.compacted && p <= replist.changes.len() => p,
        _ => {
            return api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "CursorOutOfRange",
                format!("cursor '{cursor}' is out of range"),
            )
        }
    };

    let limit = query.limit();
    let end = (position + limit).min(replist.changes.len());
    let changes = &replist.changes[position..end];

    let mut response_headers = HeaderMap::new();
    if !changes.is_empty() {
        let next = change_cursor(end);
        set_header(&mut response_headers, "x-cursor", &next);
        if end < replist.changes.len() {
            set_header(
                &mut response_headers,
                "link",
                &next_link(&format!("/replists/{uuid}/changes"), &next, limit),
            );
        }
    }

    (StatusCode::OK, response_headers, Json(changes)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_cursor_round_trip() {
        assert_eq!(parse_change_cursor(&change_cursor(42)), Some(42));
        assert_eq!(parse_change_cursor("offset=1"), None);
        assert_eq!(parse_change_cursor("ch-x"), None);
    }
}

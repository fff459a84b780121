//! Reputation lists.
//!
//! A replist is the live result set of a stored query. Consumers download
//! the full entity snapshot once with [`replist_entities`], then follow the
//! change log from the cursor advertised by the last snapshot page, either
//! one page at a time
//! with [`replist_changes`] or through a [`ChangeStream`](crate::ChangeStream).

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::CybsiClient;
use crate::error::Result;
use crate::executor::ApiRequest;
use crate::models::{EntityView, RefView, ShareLevel, StoredQueryCommonView, Tag};
use crate::pagination::{Cursor, Page, PaginationParams};
use crate::traits::{Edit, Get, List, Register};

pub(crate) const REPLISTS_PATH: &str = "replists";

/// Header carrying the change log position of an entity snapshot.
pub const X_CHANGE_CURSOR_HEADER: &str = "X-Change-Cursor";

/// Replist registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplistForm {
    #[serde(rename = "queryUUID")]
    pub query_uuid: Uuid,
    pub share_level: ShareLevel,
    /// Initial status; the server default applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

impl ReplistForm {
    pub fn new(query_uuid: Uuid, share_level: ShareLevel) -> Self {
        Self {
            query_uuid,
            share_level,
            is_enabled: None,
        }
    }

    #[must_use]
    pub fn enabled(mut self, is_enabled: bool) -> Self {
        self.is_enabled = Some(is_enabled);
        self
    }
}

impl Register for ReplistForm {
    const PATH: &'static str = REPLISTS_PATH;
}

/// Replist short view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplistCommonView {
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Stored query the list is built from, without its text.
    pub query: StoredQueryCommonView,
    pub author: RefView,
    pub share_level: ShareLevel,
    pub is_enabled: bool,
}

/// Replist full view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplistView {
    #[serde(flatten)]
    pub common: ReplistCommonView,
    /// Build status reported by the server.
    pub status: String,
    #[serde(default, alias = "createdAt")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Version used to guard edits.
    #[serde(skip)]
    pub tag: Tag,
}

impl std::ops::Deref for ReplistView {
    type Target = ReplistCommonView;

    fn deref(&self) -> &ReplistCommonView {
        &self.common
    }
}

/// Replist changes. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplistEditParams {
    #[serde(rename = "queryUUID", skip_serializing_if = "Option::is_none")]
    pub query_uuid: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_level: Option<ShareLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

/// Kind of change applied to a replist entity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntitySetOperation {
    Add,
    Remove,
}

impl fmt::Display for EntitySetOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("Add"),
            Self::Remove => f.write_str("Remove"),
        }
    }
}

/// One entry of a replist change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySetChange<T> {
    pub operation: EntitySetOperation,
    pub entity: T,
}

/// One page of a replist snapshot.
///
/// Every snapshot page advertises the change log position it was served
/// at. Only the last page's position is safe to follow changes from:
/// entities added while earlier pages were read show up on later pages
/// and must not be replayed as changes.
#[derive(Debug)]
pub struct ReplistEntities {
    pub page: Page<EntityView>,
    /// Change log position advertised with this page.
    pub change_cursor: Cursor,
}

impl ReplistEntities {
    fn from_page(page: Page<EntityView>, previous: Option<&Cursor>) -> Self {
        let advertised = Cursor::from_header(page.header(X_CHANGE_CURSOR_HEADER));
        // A page without the header keeps the position seen before it.
        let change_cursor = match previous {
            Some(previous) if advertised.is_empty() => previous.clone(),
            _ => advertised,
        };
        tracing::debug!(%change_cursor, items = page.len(), "fetched replist snapshot page");
        Self {
            page,
            change_cursor,
        }
    }

    /// Whether this is the final page of the snapshot.
    #[must_use]
    pub fn is_last(&self) -> bool {
        !self.page.has_next()
    }

    /// Fetch the following snapshot page.
    pub async fn next_page(&self) -> Result<Option<ReplistEntities>> {
        let next = self.page.next_page().await?;
        Ok(next.map(|page| Self::from_page(page, Some(&self.change_cursor))))
    }

    /// Read the rest of the snapshot.
    ///
    /// The returned change cursor is the one advertised by the last page.
    pub async fn collect_all(self) -> Result<ReplistSnapshot> {
        let mut entities = Vec::new();
        let mut current = self;
        loop {
            let next = current.next_page().await?;
            let ReplistEntities {
                page,
                change_cursor,
            } = current;
            entities.extend(page.into_items());
            match next {
                Some(page) => current = page,
                None => {
                    return Ok(ReplistSnapshot {
                        entities,
                        change_cursor,
                    })
                }
            }
        }
    }
}

/// A fully read replist snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplistSnapshot {
    pub entities: Vec<EntityView>,
    /// Change log position of the last snapshot page.
    pub change_cursor: Cursor,
}

#[async_trait]
impl Get for ReplistView {
    type Id = Uuid;

    #[tracing::instrument(skip(client))]
    async fn get(client: &CybsiClient, id: Uuid) -> Result<Self> {
        let response = client
            .execute(ApiRequest::get(format!("{REPLISTS_PATH}/{id}")))
            .await?;
        let mut view: Self = response.json()?;
        view.tag = response.tag();
        Ok(view)
    }
}

#[async_trait]
impl List for ReplistCommonView {
    type Query = ();

    #[tracing::instrument(skip(client, _query))]
    async fn list_page(
        client: &CybsiClient,
        _query: &(),
        params: &PaginationParams,
    ) -> Result<Page<Self>> {
        client
            .fetch_page(params.apply(ApiRequest::get(REPLISTS_PATH)))
            .await
    }
}

#[async_trait]
impl Edit for ReplistView {
    type Id = Uuid;
    type Params = ReplistEditParams;

    #[tracing::instrument(skip(client, params))]
    async fn edit(
        client: &CybsiClient,
        id: Uuid,
        tag: &Tag,
        params: &ReplistEditParams,
    ) -> Result<()> {
        client
            .execute(ApiRequest::patch(format!("{REPLISTS_PATH}/{id}"), tag, params)?)
            .await?;
        Ok(())
    }
}

/// Fetch the first page of a replist entity snapshot.
///
/// Follow the page chain with [`ReplistEntities::next_page`] or
/// [`ReplistEntities::collect_all`]; the change cursor of the last page is
/// the starting point for [`replist_changes`].
///
/// # Errors
///
/// Returns [`CybsiError::NotFound`](crate::CybsiError::NotFound) if the
/// replist does not exist.
#[tracing::instrument(skip(client))]
pub async fn replist_entities(
    client: &CybsiClient,
    replist_uuid: Uuid,
    params: &PaginationParams,
) -> Result<ReplistEntities> {
    let request = params.apply(ApiRequest::get(format!(
        "{REPLISTS_PATH}/{replist_uuid}/entities"
    )));
    let page = client.fetch_page(request).await?;
    Ok(ReplistEntities::from_page(page, None))
}

/// Fetch one page of replist changes after `cursor`.
///
/// An empty [`Page::cursor`] on the result means every change made so far
/// was returned; it is not a valid position. Keep using the last non-empty
/// cursor and poll again later. [`ChangeStream`](crate::ChangeStream) does
/// this bookkeeping.
///
/// # Errors
///
/// Returns a [`CybsiError::Semantic`](crate::CybsiError::Semantic) error
/// with [`SemanticErrorCode::CursorOutOfRange`](crate::SemanticErrorCode::CursorOutOfRange)
/// when the cursor is no longer known to the server.
#[tracing::instrument(skip(client))]
pub async fn replist_changes(
    client: &CybsiClient,
    replist_uuid: Uuid,
    cursor: &Cursor,
    limit: Option<u32>,
) -> Result<Page<EntitySetChange<EntityView>>> {
    let request = ApiRequest::get(format!("{REPLISTS_PATH}/{replist_uuid}/changes"))
        .query("cursor", cursor)
        .query_opt("limit", limit);
    client.fetch_page(request).await
}

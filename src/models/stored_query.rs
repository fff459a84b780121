//! Stored search queries.
//!
//! Replists are built on top of stored queries: the query text selects the
//! entities that end up in the list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::CybsiClient;
use crate::error::Result;
use crate::executor::ApiRequest;
use crate::models::{RefView, Tag};
use crate::pagination::{Page, PaginationParams};
use crate::traits::{Edit, Get, List, Register};

const STORED_QUERIES_PATH: &str = "search/stored-queries";

/// Stored query registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredQueryForm {
    pub name: String,
    /// Query text in the Cybsi query language.
    pub text: String,
}

impl StoredQueryForm {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl Register for StoredQueryForm {
    const PATH: &'static str = STORED_QUERIES_PATH;
}

/// Short stored query view, as returned by the list endpoint and embedded
/// in replists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredQueryCommonView {
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub name: String,
}

/// Full stored query view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredQueryView {
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub name: String,
    pub text: String,
    pub author: RefView,
    /// Version used to guard edits.
    #[serde(skip)]
    pub tag: Tag,
}

/// Stored query changes. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoredQueryEditParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[async_trait]
impl Get for StoredQueryView {
    type Id = Uuid;

    #[tracing::instrument(skip(client))]
    async fn get(client: &CybsiClient, id: Uuid) -> Result<Self> {
        let response = client
            .execute(ApiRequest::get(format!("{STORED_QUERIES_PATH}/{id}")))
            .await?;
        let mut view: Self = response.json()?;
        view.tag = response.tag();
        Ok(view)
    }
}

#[async_trait]
impl List for StoredQueryCommonView {
    type Query = ();

    #[tracing::instrument(skip(client, _query))]
    async fn list_page(
        client: &CybsiClient,
        _query: &(),
        params: &PaginationParams,
    ) -> Result<Page<Self>> {
        client
            .fetch_page(params.apply(ApiRequest::get(STORED_QUERIES_PATH)))
            .await
    }
}

#[async_trait]
impl Edit for StoredQueryView {
    type Id = Uuid;
    type Params = StoredQueryEditParams;

    #[tracing::instrument(skip(client, params))]
    async fn edit(
        client: &CybsiClient,
        id: Uuid,
        tag: &Tag,
        params: &StoredQueryEditParams,
    ) -> Result<()> {
        client
            .execute(ApiRequest::patch(
                format!("{STORED_QUERIES_PATH}/{id}"),
                tag,
                params,
            )?)
            .await?;
        Ok(())
    }
}

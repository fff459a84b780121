//! API keys.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::CybsiClient;
use crate::error::Result;
use crate::executor::ApiRequest;
use crate::models::{Permission, Tag};
use crate::pagination::{Page, PaginationParams};
use crate::traits::{Edit, Get};

const API_KEYS_PATH: &str = "api-keys";

/// Whose API keys to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyOwner {
    /// Any user; requires the `APIKeys` permission.
    User(Uuid),
    /// The authenticated user.
    Me,
}

impl ApiKeyOwner {
    fn collection_path(&self) -> String {
        match self {
            Self::User(uuid) => format!("users/{uuid}/{API_KEYS_PATH}"),
            Self::Me => format!("users/me/{API_KEYS_PATH}"),
        }
    }
}

/// API key generation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyForm {
    /// The key is revoked automatically after this moment.
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Inherited from the owner when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,
}

/// Reference to a generated key, including the secret.
///
/// The secret is only ever returned here.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ApiKeyRefView {
    pub id: Uuid,
    #[serde(default)]
    pub url: Option<String>,
    pub key: String,
}

impl std::fmt::Debug for ApiKeyRefView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyRefView")
            .field("id", &self.id)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// API key short view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyCommonView {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked: bool,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// API key full view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyView {
    #[serde(flatten)]
    pub common: ApiKeyCommonView,
    #[serde(skip)]
    pub tag: Tag,
}

impl std::ops::Deref for ApiKeyView {
    type Target = ApiKeyCommonView;

    fn deref(&self) -> &ApiKeyCommonView {
        &self.common
    }
}

/// API key changes. Revocation cannot be undone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApiKeyEditParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<bool>,
}

/// Generate a new key for a user.
#[tracing::instrument(skip(client, form))]
pub async fn generate_api_key(
    client: &CybsiClient,
    user_uuid: Uuid,
    form: &ApiKeyForm,
) -> Result<ApiKeyRefView> {
    let path = ApiKeyOwner::User(user_uuid).collection_path();
    client.execute(ApiRequest::post(path, form)?).await?.json()
}

/// List the keys of a user, or of the authenticated user.
#[tracing::instrument(skip(client))]
pub async fn list_api_keys(
    client: &CybsiClient,
    owner: ApiKeyOwner,
    params: &PaginationParams,
) -> Result<Page<ApiKeyCommonView>> {
    client
        .fetch_page(params.apply(ApiRequest::get(owner.collection_path())))
        .await
}

/// Revoke a key.
pub async fn revoke_api_key(client: &CybsiClient, id: Uuid, tag: &Tag) -> Result<()> {
    let params = ApiKeyEditParams {
        revoked: Some(true),
        ..Default::default()
    };
    ApiKeyView::edit(client, id, tag, &params).await
}

#[async_trait]
impl Get for ApiKeyView {
    type Id = Uuid;

    #[tracing::instrument(skip(client))]
    async fn get(client: &CybsiClient, id: Uuid) -> Result<Self> {
        let response = client
            .execute(ApiRequest::get(format!("{API_KEYS_PATH}/{id}")))
            .await?;
        let mut view: Self = response.json()?;
        view.tag = response.tag();
        Ok(view)
    }
}

#[async_trait]
impl Edit for ApiKeyView {
    type Id = Uuid;
    type Params = ApiKeyEditParams;

    #[tracing::instrument(skip(client, params))]
    async fn edit(
        client: &CybsiClient,
        id: Uuid,
        tag: &Tag,
        params: &ApiKeyEditParams,
    ) -> Result<()> {
        client
            .execute(ApiRequest::patch(format!("{API_KEYS_PATH}/{id}"), tag, params)?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedExecutor;
    use serde_json::json;

    const USER: &str = "5a0b7e8e-2d2c-4f5b-8a37-0a0e8f6b2b11";

    #[tokio::test]
    async fn test_generate_posts_to_user_keys() {
        let executor = ScriptedExecutor::new();
        executor.push_json(
            json!({"id": "1b2c3d4e-5f60-4718-8293-a4b5c6d7e8f9", "key": "s3cr3t"}),
            &[],
        );
        let client = CybsiClient::with_executor(executor.clone());

        let form = ApiKeyForm {
            expires_at: "2030-01-01T00:00:00Z".parse().unwrap(),
            description: Some("ci".into()),
            permissions: vec![Permission::try_from("ReputationLists:r".to_string()).unwrap()],
        };
        let key = generate_api_key(&client, USER.parse().unwrap(), &form)
            .await
            .unwrap();
        assert_eq!(key.key, "s3cr3t");
        assert!(!format!("{key:?}").contains("s3cr3t"));

        let request = &executor.requests()[0];
        assert_eq!(request.target.to_string(), format!("users/{USER}/api-keys"));
        let body = request.body.as_ref().unwrap();
        assert_eq!(body["permissions"], json!(["ReputationLists:r"]));
        assert_eq!(body["description"], json!("ci"));
    }

    #[tokio::test]
    async fn test_revoke_patches_key() {
        let executor = ScriptedExecutor::new();
        executor.push_json(json!({}), &[]);
        let client = CybsiClient::with_executor(executor.clone());

        let id: Uuid = "1b2c3d4e-5f60-4718-8293-a4b5c6d7e8f9".parse().unwrap();
        revoke_api_key(&client, id, &Tag::new("t1")).await.unwrap();

        let request = &executor.requests()[0];
        assert_eq!(request.target.to_string(), format!("api-keys/{id}"));
        assert_eq!(request.body, Some(json!({"revoked": true})));
    }

    #[test]
    fn test_owner_paths() {
        assert_eq!(ApiKeyOwner::Me.collection_path(), "users/me/api-keys");
        assert_eq!(
            ApiKeyOwner::User(USER.parse().unwrap()).collection_path(),
            format!("users/{USER}/api-keys")
        );
    }
}

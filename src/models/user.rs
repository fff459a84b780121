//! Users and the current user.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::CybsiClient;
use crate::error::{CybsiError, Result};
use crate::executor::ApiRequest;
use crate::models::{Nullable, RefView, ShareLevel, Tag};
use crate::pagination::{Page, PaginationParams};
use crate::traits::{Edit, Get, List, Register};

const USERS_PATH: &str = "users";
const ME_PATH: &str = "users/me";

/// Permission granted to a user, such as `Users:rw`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    /// Resource name, e.g. `ReputationLists`.
    pub resource: String,
    /// Allowed actions: `r`, `w` or `rw`.
    pub actions: String,
}

impl Permission {
    pub fn can_read(&self) -> bool {
        self.actions.contains('r')
    }

    pub fn can_write(&self) -> bool {
        self.actions.contains('w')
    }
}

impl TryFrom<String> for Permission {
    type Error = CybsiError;

    fn try_from(value: String) -> Result<Self> {
        let (resource, actions) = value
            .split_once(':')
            .ok_or_else(|| CybsiError::InvalidData(format!("invalid permission '{value}'")))?;
        Ok(Self {
            resource: resource.to_string(),
            actions: actions.to_string(),
        })
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.actions)
    }
}

/// Role assigned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCommonView {
    pub uuid: Uuid,
    /// Role name, e.g. `FeedDataReader`.
    pub name: String,
}

/// User short view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCommonView {
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub login: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub is_disabled: bool,
    #[serde(rename = "authProviderID")]
    pub auth_provider_id: String,
}

/// User full view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(flatten)]
    pub common: UserCommonView,
    pub access_level: ShareLevel,
    #[serde(default)]
    pub roles: Vec<RoleCommonView>,
    /// Permissions derived from the roles.
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub data_source: Option<RefView>,
    #[serde(skip)]
    pub tag: Tag,
}

impl std::ops::Deref for UserView {
    type Target = UserCommonView;

    fn deref(&self) -> &UserCommonView {
        &self.common
    }
}

/// View of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserView {
    #[serde(flatten)]
    pub common: UserCommonView,
    pub access_level: ShareLevel,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub data_source: Option<RefView>,
    #[serde(skip)]
    pub tag: Tag,
}

impl std::ops::Deref for CurrentUserView {
    type Target = UserCommonView;

    fn deref(&self) -> &UserCommonView {
        &self.common
    }
}

impl CurrentUserView {
    /// Fetch the user the client is authenticated as.
    #[tracing::instrument(skip(client))]
    pub async fn me(client: &CybsiClient) -> Result<Self> {
        let response = client.execute(ApiRequest::get(ME_PATH)).await?;
        let mut view: Self = response.json()?;
        view.tag = response.tag();
        Ok(view)
    }

    /// Change the profile of the authenticated user.
    #[tracing::instrument(skip(client, params))]
    pub async fn edit_me(client: &CybsiClient, tag: &Tag, params: &ProfileEditParams) -> Result<()> {
        client
            .execute(ApiRequest::patch(ME_PATH, tag, params)?)
            .await?;
        Ok(())
    }

    /// Change the password of the authenticated user.
    ///
    /// # Errors
    ///
    /// Fails with [`SemanticErrorCode::PasswordAuthDisabled`](crate::SemanticErrorCode::PasswordAuthDisabled)
    /// for users of external auth providers.
    #[tracing::instrument(skip_all)]
    pub async fn change_password(
        client: &CybsiClient,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let form = serde_json::json!({
            "oldPassword": old_password,
            "newPassword": new_password,
        });
        client
            .execute(ApiRequest::put(format!("{ME_PATH}/password"), &form)?)
            .await?;
        Ok(())
    }
}

/// User registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub login: String,
    pub access_level: ShareLevel,
    /// Role names.
    pub roles: Vec<String>,
    /// Required for local users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "dataSourceUUID", skip_serializing_if = "Option::is_none")]
    pub data_source_uuid: Option<Uuid>,
}

impl UserForm {
    pub fn new(login: impl Into<String>, access_level: ShareLevel, roles: Vec<String>) -> Self {
        Self {
            login: login.into(),
            access_level,
            roles,
            password: None,
            full_name: None,
            email: None,
            data_source_uuid: None,
        }
    }
}

impl Register for UserForm {
    const PATH: &'static str = USERS_PATH;
}

/// User filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uuid: Vec<Uuid>,
    #[serde(rename = "dataSourceUUID", skip_serializing_if = "Option::is_none")]
    pub data_source_uuid: Option<Uuid>,
    /// Substring of login, name or email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(rename = "providerID", skip_serializing_if = "Vec::is_empty")]
    pub provider_id: Vec<String>,
}

/// User changes. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEditParams {
    #[serde(skip_serializing_if = "Nullable::is_unset")]
    pub full_name: Nullable<String>,
    #[serde(skip_serializing_if = "Nullable::is_unset")]
    pub email: Nullable<String>,
    #[serde(rename = "dataSourceUUID", skip_serializing_if = "Nullable::is_unset")]
    pub data_source_uuid: Nullable<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<ShareLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
}

/// Profile changes of the authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEditParams {
    #[serde(skip_serializing_if = "Nullable::is_unset")]
    pub full_name: Nullable<String>,
    #[serde(skip_serializing_if = "Nullable::is_unset")]
    pub email: Nullable<String>,
}

#[async_trait]
impl Get for UserView {
    type Id = Uuid;

    #[tracing::instrument(skip(client))]
    async fn get(client: &CybsiClient, id: Uuid) -> Result<Self> {
        let response = client
            .execute(ApiRequest::get(format!("{USERS_PATH}/{id}")))
            .await?;
        let mut view: Self = response.json()?;
        view.tag = response.tag();
        Ok(view)
    }
}

#[async_trait]
impl List for UserCommonView {
    type Query = UserListQuery;

    #[tracing::instrument(skip(client))]
    async fn list_page(
        client: &CybsiClient,
        query: &UserListQuery,
        params: &PaginationParams,
    ) -> Result<Page<Self>> {
        let request = ApiRequest::get(USERS_PATH).query_struct(query)?;
        client.fetch_page(params.apply(request)).await
    }
}

#[async_trait]
impl Edit for UserView {
    type Id = Uuid;
    type Params = UserEditParams;

    #[tracing::instrument(skip(client, params))]
    async fn edit(client: &CybsiClient, id: Uuid, tag: &Tag, params: &UserEditParams) -> Result<()> {
        client
            .execute(ApiRequest::patch(format!("{USERS_PATH}/{id}"), tag, params)?)
            .await?;
        Ok(())
    }
}

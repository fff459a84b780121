//! Edit trait for modifying resources.

use async_trait::async_trait;
use serde::Serialize;

use crate::client::CybsiClient;
use crate::error::Result;
use crate::models::Tag;

/// Modify an existing resource.
///
/// Edits are guarded by the resource [`Tag`]: if the resource changed since
/// the tag was read, the call fails with
/// [`CybsiError::ResourceModified`](crate::CybsiError::ResourceModified).
///
/// # Example
///
/// ```ignore
/// use cybsi::{CybsiClient, Edit, Get, Nullable, UserEditParams, UserView};
///
/// let user = UserView::get(&client, user_uuid).await?;
/// UserView::edit(
///     &client,
///     user_uuid,
///     &user.tag,
///     &UserEditParams {
///         email: Nullable::Null,
///         ..Default::default()
///     },
/// ).await?;
/// ```
#[async_trait]
pub trait Edit {
    /// The identifier type for this resource.
    type Id: Send;

    /// Fields to change.
    type Params: Serialize + Send + Sync;

    /// Apply the edit.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource is missing, was modified, or the
    /// request fails.
    async fn edit(client: &CybsiClient, id: Self::Id, tag: &Tag, params: &Self::Params)
        -> Result<()>;
}

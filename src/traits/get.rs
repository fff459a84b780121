//! Get trait for fetching single resources.

use async_trait::async_trait;

use crate::client::CybsiClient;
use crate::error::Result;

/// Fetch a single resource by its identifier.
///
/// # Example
///
/// ```ignore
/// use cybsi::{CybsiClient, Get, ReplistView};
///
/// let client = CybsiClient::from_env()?;
/// let replist = ReplistView::get(&client, replist_uuid).await?;
/// println!("{} ({})", replist.query.name, replist.status);
/// ```
#[async_trait]
pub trait Get: Sized {
    /// The identifier type for this resource.
    type Id: Send;

    /// Fetch the resource.
    ///
    /// # Errors
    ///
    /// Returns [`CybsiError::NotFound`](crate::CybsiError::NotFound) if the
    /// resource does not exist, or any transport error.
    async fn get(client: &CybsiClient, id: Self::Id) -> Result<Self>;
}

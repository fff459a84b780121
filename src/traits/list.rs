//! List trait for fetching collections.

use async_trait::async_trait;

use crate::client::CybsiClient;
use crate::error::Result;
use crate::pagination::{Page, PaginationParams};

/// Filter resources with cursor pagination.
///
/// # Example
///
/// ```ignore
/// use cybsi::{CybsiClient, List, PaginationParams, ReplistCommonView};
///
/// let client = CybsiClient::from_env()?;
///
/// // Fetch a single page
/// let page = ReplistCommonView::list_page(&client, &(), &PaginationParams::with_limit(50)).await?;
/// let resume_from = page.cursor().clone();
///
/// // Fetch all pages
/// let all = ReplistCommonView::list_all(&client, &()).await?;
/// ```
#[async_trait]
pub trait List: Sized + Send + 'static {
    /// Filter parameters.
    type Query: Default + Send + Sync;

    /// Fetch one page of resources matching the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the page cannot be decoded.
    async fn list_page(
        client: &CybsiClient,
        query: &Self::Query,
        params: &PaginationParams,
    ) -> Result<Page<Self>>;

    /// Fetch every resource matching the query, following all pages.
    ///
    /// # Errors
    ///
    /// Returns the first error from any page request.
    async fn list_all(client: &CybsiClient, query: &Self::Query) -> Result<Vec<Self>> {
        Self::list_page(client, query, &PaginationParams::default())
            .await?
            .collect_all()
            .await
    }
}

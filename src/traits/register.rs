//! Register trait for creating resources.

use async_trait::async_trait;
use serde::Serialize;

use crate::client::CybsiClient;
use crate::error::Result;
use crate::executor::ApiRequest;
use crate::models::RefView;

/// Register a new resource from a filled form.
#[async_trait]
pub trait Register: Serialize + Sync {
    /// Collection path the form is posted to.
    const PATH: &'static str;

    /// Post the form and return a reference to the new resource.
    ///
    /// # Errors
    ///
    /// Returns [`CybsiError::Semantic`](crate::CybsiError::Semantic) if the
    /// form violates business rules, or any transport error.
    #[tracing::instrument(skip_all, fields(path = Self::PATH))]
    async fn register(&self, client: &CybsiClient) -> Result<RefView> {
        let response = client.execute(ApiRequest::post(Self::PATH, self)?).await?;
        response.json()
    }
}

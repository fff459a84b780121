//! Cybsi API client.
//!
//! Thin handle over an [`Executor`]. Higher-level operations are implemented
//! via traits on model types and free functions in the resource modules.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::Result;
use crate::executor::{ApiRequest, ApiResponse, Executor, HttpExecutor};
use crate::pagination::{serde_decoder, Page};

/// Cybsi API client.
///
/// Entity-specific operations are implemented via the `Get`, `List`,
/// `Register` and `Edit` traits on model types.
///
/// This struct is cheaply cloneable; clones share the same connection pool
/// and access token.
///
/// # Example
///
/// ```no_run
/// use cybsi::{Config, CybsiClient};
///
/// # fn example() -> cybsi::Result<()> {
/// // Create from environment variables
/// let client = CybsiClient::from_env()?;
///
/// // Or configure manually
/// let config = Config::new("https://cybsi.local/api", "your-api-key")?
///     .with_ssl_verify(false);
/// let client = CybsiClient::new(&config)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CybsiClient {
    executor: Arc<dyn Executor>,
}

impl std::fmt::Debug for CybsiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CybsiClient")
            .field("executor", &self.executor)
            .finish()
    }
}

impl CybsiClient {
    /// Create a client from environment variables.
    ///
    /// See [`Config::from_env`].
    ///
    /// # Errors
    ///
    /// Returns an error if `CYBSI_API_URL` or `CYBSI_API_KEY` is not set.
    pub fn from_env() -> Result<Self> {
        Self::new(&Config::from_env()?)
    }

    /// Create a client talking HTTP to the configured API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_executor(Arc::new(HttpExecutor::new(config)?)))
    }

    /// Create a client on top of a custom executor.
    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// The executor every request goes through.
    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// Execute a raw request.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.executor.execute(request).await
    }

    /// Execute a collection request and wrap the response as a page.
    pub async fn fetch_page<T>(&self, request: ApiRequest) -> Result<Page<T>>
    where
        T: DeserializeOwned,
    {
        Page::fetch(Arc::clone(&self.executor), request, serde_decoder()).await
    }
}

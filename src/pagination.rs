//! Cursor pagination over Cybsi collection endpoints.
//!
//! Collection endpoints return a JSON array per request. Continuation is
//! advertised with a `Link: <url>; rel="next"` header and the position in
//! the collection with an `X-Cursor` header. A [`Page`] holds one such
//! response; [`chain_pages`] flattens the whole chain into a stream.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CybsiError, Result};
use crate::executor::{ApiRequest, ApiResponse, Executor};

/// Header carrying the page cursor.
pub const X_CURSOR_HEADER: &str = "X-Cursor";

/// Page size the server uses when no limit is requested.
pub const DEFAULT_PAGE_LIMIT: u32 = 30;

/// Opaque position in a collection or change log.
///
/// Only the server interprets the value. An empty cursor means "from the
/// start" when sent, and "nothing advertised" when received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a cursor value obtained earlier from the API.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn from_header(value: Option<&str>) -> Self {
        Self(value.unwrap_or_default().to_string())
    }

    /// `None` for an empty cursor.
    pub fn non_empty(&self) -> Option<&Self> {
        (!self.is_empty()).then_some(self)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Query parameters for paginated requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationParams {
    /// Position to continue from; the first page when absent or empty.
    pub cursor: Option<Cursor>,
    /// Requested page size. The server may apply a lower maximum.
    pub limit: Option<u32>,
}

impl PaginationParams {
    /// Pagination params with a page size only.
    #[must_use]
    pub fn with_limit(limit: u32) -> Self {
        Self {
            cursor: None,
            limit: Some(limit),
        }
    }

    /// Pagination params continuing from `cursor`.
    #[must_use]
    pub fn from_cursor(cursor: Cursor, limit: Option<u32>) -> Self {
        Self {
            cursor: Some(cursor),
            limit,
        }
    }

    /// Add `cursor` and `limit` to a request.
    pub(crate) fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .query_opt("cursor", self.cursor.as_ref().and_then(Cursor::non_empty))
            .query_opt("limit", self.limit)
    }
}

/// Turns one raw collection element into an item.
pub type Decoder<T> = Arc<dyn Fn(serde_json::Value) -> Result<T> + Send + Sync>;

/// Decoder deserializing elements with `serde`.
pub fn serde_decoder<T: DeserializeOwned>() -> Decoder<T> {
    Arc::new(|value| {
        serde_json::from_value(value)
            .map_err(|e| CybsiError::InvalidData(format!("unexpected collection element: {e}")))
    })
}

/// One page of a collection.
///
/// Pages are immutable. [`Page::next_page`] fetches the following page as a
/// new value; there is no way back.
pub struct Page<T> {
    executor: Arc<dyn Executor>,
    decode: Decoder<T>,
    items: Vec<T>,
    cursor: Cursor,
    next_link: Option<Url>,
    headers: HeaderMap,
}

impl<T: fmt::Debug> fmt::Debug for Page<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("items", &self.items)
            .field("cursor", &self.cursor)
            .field("next_link", &self.next_link.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

impl<T> Page<T> {
    /// Build a page from a collection response.
    ///
    /// # Errors
    ///
    /// Fails with [`CybsiError::InvalidData`] if the body is not an array,
    /// if any element fails to decode, or if the `Link` target is not a URL.
    pub fn from_response(
        executor: Arc<dyn Executor>,
        response: ApiResponse,
        decode: Decoder<T>,
    ) -> Result<Self> {
        let raw: Vec<serde_json::Value> = response.json()?;
        let items = raw
            .into_iter()
            .map(|value| decode(value))
            .collect::<Result<Vec<_>>>()?;

        let cursor = Cursor::from_header(response.header(X_CURSOR_HEADER));
        let next_link = next_link(&response)?;

        Ok(Self {
            cursor,
            next_link,
            headers: response.headers,
            executor,
            decode,
            items,
        })
    }

    /// Execute `request` and wrap the response as the first page.
    pub async fn fetch(
        executor: Arc<dyn Executor>,
        request: ApiRequest,
        decode: Decoder<T>,
    ) -> Result<Self> {
        let response = executor.execute(request).await?;
        Self::from_response(executor, response, decode)
    }

    /// Items of this page in server order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cursor advertised for this page; empty if none was.
    #[must_use]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Continuation link, present iff more data follows.
    #[must_use]
    pub fn next_link(&self) -> Option<&Url> {
        self.next_link.as_ref()
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next_link.is_some()
    }

    /// Header of the response this page was read from.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Move the items out, leaving the continuation in place.
    pub(crate) fn take_items(&mut self) -> Vec<T> {
        std::mem::take(&mut self.items)
    }
}

impl<T: Send + 'static> Page<T> {
    /// Fetch the following page.
    ///
    /// Performs exactly one request when a continuation link exists and
    /// none otherwise. Executor errors are returned unchanged.
    pub fn next_page(&self) -> impl Future<Output = Result<Option<Page<T>>>> + Send + 'static {
        let link = self.next_link.clone();
        let executor = Arc::clone(&self.executor);
        let decode = Arc::clone(&self.decode);

        async move {
            let Some(link) = link else {
                return Ok(None);
            };
            tracing::debug!(%link, "fetching next page");
            Page::fetch(executor, ApiRequest::follow(link), decode)
                .await
                .map(Some)
        }
    }

    /// Stream every item of this page and all following pages.
    ///
    /// See [`chain_pages`].
    pub fn into_stream(self) -> BoxStream<'static, Result<T>> {
        chain_pages(self)
    }

    /// Fetch the remaining pages and collect every item.
    pub async fn collect_all(self) -> Result<Vec<T>> {
        self.into_stream().try_collect().await
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Flatten a chain of pages into one stream of items.
///
/// Yields the items of `start`, then follows continuation links one page at
/// a time until a page without one. Empty pages in the middle of the chain
/// are followed. A failed fetch is yielded once and ends the stream. The
/// stream cannot be restarted; fetch a new first page to iterate again.
pub fn chain_pages<T: Send + 'static>(start: Page<T>) -> BoxStream<'static, Result<T>> {
    struct Chain<T> {
        items: std::vec::IntoIter<T>,
        page: Page<T>,
    }

    impl<T> Chain<T> {
        fn new(mut page: Page<T>) -> Self {
            let items = page.take_items().into_iter();
            Self { items, page }
        }
    }

    stream::unfold(Some(Chain::new(start)), |state| async move {
        let mut chain = state?;
        loop {
            if let Some(item) = chain.items.next() {
                return Some((Ok(item), Some(chain)));
            }
            match chain.page.next_page().await {
                Ok(Some(page)) => chain = Chain::new(page),
                Ok(None) => return None,
                Err(e) => return Some((Err(e), None)),
            }
        }
    })
    .boxed()
}

fn next_link(response: &ApiResponse) -> Result<Option<Url>> {
    let target = response
        .headers
        .get_all(reqwest::header::LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| parse_link_header(value, "next"));

    target
        .map(|target| {
            response.url.join(target).map_err(|e| {
                CybsiError::InvalidData(format!("invalid next page link '{target}': {e}"))
            })
        })
        .transpose()
}

/// Extract the target of the link with relation `target_rel`.
///
/// Accepts `<url>; rel="next"` as well as unbracketed targets and
/// space-separated relation lists.
fn parse_link_header<'a>(header: &'a str, target_rel: &str) -> Option<&'a str> {
    for part in header.split(',') {
        let mut segments = part.split(';');
        let target = segments.next().unwrap_or_default().trim();
        let target = target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .unwrap_or(target);

        let is_match = segments.any(|segment| {
            segment
                .trim()
                .strip_prefix("rel=")
                .map(|rel| {
                    rel.trim_matches(|c| c == '"' || c == '\'')
                        .split_whitespace()
                        .any(|r| r.eq_ignore_ascii_case(target_rel))
                })
                .unwrap_or(false)
        });

        if is_match && !target.is_empty() {
            return Some(target);
        }
    }

    None
}

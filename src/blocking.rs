//! Blocking facade over the async client.
//!
//! [`BlockingClient`] owns a current-thread tokio runtime and drives the
//! same async code the async API uses. Do not call it from inside an async
//! context; use [`CybsiClient`] there.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use uuid::Uuid;

use crate::changes::{ChangeState, ChangeStream};
use crate::client::CybsiClient;
use crate::config::Config;
use crate::error::Result;
use crate::executor::Executor;
use crate::models::{
    replist_changes, replist_entities, CurrentUserView, EntitySetChange, EntityView, RefView,
    ReplistSnapshot, Tag,
};
use crate::pagination::{Cursor, Page, PaginationParams};
use crate::traits::{Edit, Get, List, Register};

/// Blocking Cybsi API client.
///
/// # Example
///
/// ```no_run
/// use cybsi::blocking::BlockingClient;
/// use cybsi::{PaginationParams, ReplistCommonView};
///
/// # fn example() -> cybsi::Result<()> {
/// let client = BlockingClient::from_env()?;
/// let page = client.list_page::<ReplistCommonView>(&(), &PaginationParams::default())?;
/// for replist in page.into_chain() {
///     println!("{}", replist?.uuid);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BlockingClient {
    inner: CybsiClient,
    runtime: Arc<Runtime>,
}

impl BlockingClient {
    /// See [`CybsiClient::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::wrap(CybsiClient::from_env()?)
    }

    /// See [`CybsiClient::new`].
    pub fn new(config: &Config) -> Result<Self> {
        Self::wrap(CybsiClient::new(config)?)
    }

    /// See [`CybsiClient::with_executor`].
    pub fn with_executor(executor: Arc<dyn Executor>) -> Result<Self> {
        Self::wrap(CybsiClient::with_executor(executor))
    }

    fn wrap(inner: CybsiClient) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }

    /// The async client this facade drives.
    pub fn async_client(&self) -> &CybsiClient {
        &self.inner
    }

    pub fn get<T: Get>(&self, id: T::Id) -> Result<T> {
        self.runtime.block_on(T::get(&self.inner, id))
    }

    pub fn list_page<T: List>(&self, query: &T::Query, params: &PaginationParams) -> Result<BlockingPage<T>> {
        let page = self.runtime.block_on(T::list_page(&self.inner, query, params))?;
        Ok(self.page(page))
    }

    pub fn register<F: Register>(&self, form: &F) -> Result<RefView> {
        self.runtime.block_on(form.register(&self.inner))
    }

    pub fn edit<T: Edit>(&self, id: T::Id, tag: &Tag, params: &T::Params) -> Result<()> {
        self.runtime.block_on(T::edit(&self.inner, id, tag, params))
    }

    pub fn me(&self) -> Result<CurrentUserView> {
        self.runtime.block_on(CurrentUserView::me(&self.inner))
    }

    /// Read a whole replist snapshot along with the change cursor of its
    /// last page. See [`replist_entities`].
    pub fn replist_snapshot(
        &self,
        replist_uuid: Uuid,
        params: &PaginationParams,
    ) -> Result<ReplistSnapshot> {
        self.runtime.block_on(async {
            replist_entities(&self.inner, replist_uuid, params)
                .await?
                .collect_all()
                .await
        })
    }

    /// See [`replist_changes`].
    pub fn replist_changes(
        &self,
        replist_uuid: Uuid,
        cursor: &Cursor,
        limit: Option<u32>,
    ) -> Result<BlockingPage<EntitySetChange<EntityView>>> {
        let page = self
            .runtime
            .block_on(replist_changes(&self.inner, replist_uuid, cursor, limit))?;
        Ok(self.page(page))
    }

    /// Follow replist changes after `cursor`. See [`ChangeStream`].
    pub fn change_stream(&self, replist_uuid: Uuid, cursor: Cursor) -> BlockingChangeStream {
        BlockingChangeStream {
            inner: ChangeStream::new(self.inner.clone(), replist_uuid, cursor),
            runtime: Arc::clone(&self.runtime),
        }
    }

    fn page<T>(&self, page: Page<T>) -> BlockingPage<T> {
        BlockingPage {
            page,
            runtime: Arc::clone(&self.runtime),
        }
    }
}

/// Page returned by [`BlockingClient`].
#[derive(Debug)]
pub struct BlockingPage<T> {
    page: Page<T>,
    runtime: Arc<Runtime>,
}

impl<T> BlockingPage<T> {
    pub fn items(&self) -> &[T] {
        self.page.items()
    }

    pub fn into_items(self) -> Vec<T> {
        self.page.into_items()
    }

    pub fn cursor(&self) -> &Cursor {
        self.page.cursor()
    }

    pub fn has_next(&self) -> bool {
        self.page.has_next()
    }
}

impl<T: Send + 'static> BlockingPage<T> {
    /// Fetch the following page. See [`Page::next_page`].
    pub fn next_page(&self) -> Result<Option<BlockingPage<T>>> {
        let next = self.runtime.block_on(self.page.next_page())?;
        Ok(next.map(|page| BlockingPage {
            page,
            runtime: Arc::clone(&self.runtime),
        }))
    }

    /// Iterate over the items of this page and every following page.
    ///
    /// A failed fetch is yielded once and ends the iteration.
    pub fn into_chain(self) -> BlockingChain<T> {
        BlockingChain {
            items: Vec::new().into_iter(),
            page: Some(self),
            started: false,
        }
    }

    /// Fetch the remaining pages and collect every item.
    pub fn collect_all(self) -> Result<Vec<T>> {
        self.into_chain().collect()
    }
}

/// Iterator returned by [`BlockingPage::into_chain`].
#[derive(Debug)]
pub struct BlockingChain<T> {
    items: std::vec::IntoIter<T>,
    page: Option<BlockingPage<T>>,
    started: bool,
}

impl<T: Send + 'static> Iterator for BlockingChain<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        loop {
            if let Some(item) = self.items.next() {
                return Some(Ok(item));
            }

            let page = self.page.as_mut()?;
            if !self.started {
                self.started = true;
                self.items = page.page.take_items().into_iter();
                continue;
            }

            match page.next_page() {
                Ok(Some(mut next)) => {
                    self.items = next.page.take_items().into_iter();
                    self.page = Some(next);
                }
                Ok(None) => {
                    self.page = None;
                    return None;
                }
                Err(e) => {
                    self.page = None;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Blocking counterpart of [`ChangeStream`].
#[derive(Debug)]
pub struct BlockingChangeStream {
    inner: ChangeStream,
    runtime: Arc<Runtime>,
}

impl BlockingChangeStream {
    pub fn state(&self) -> &ChangeState {
        self.inner.state()
    }

    /// Last cursor the server advertised. Safe to checkpoint.
    pub fn cursor(&self) -> &Cursor {
        self.inner.cursor()
    }

    pub fn is_caught_up(&self) -> bool {
        self.inner.is_caught_up()
    }

    /// See [`ChangeStream::poll`].
    pub fn poll(&mut self) -> Result<Vec<EntitySetChange<EntityView>>> {
        self.runtime.block_on(self.inner.poll())
    }

    /// See [`ChangeStream::next_changes`].
    pub fn next_changes(&mut self, interval: Duration) -> Result<Vec<EntitySetChange<EntityView>>> {
        self.runtime.block_on(self.inner.next_changes(interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CybsiError;
    use crate::models::ReplistCommonView;
    use crate::testing::ScriptedExecutor;
    use serde_json::json;

    fn replist(uuid: &str) -> serde_json::Value {
        json!({
            "uuid": uuid,
            "query": {"uuid": "0f7c6b1e-0e35-4d1c-9d0b-8d5f3b0b3b7d", "name": "q"},
            "author": {"uuid": "5a0b7e8e-2d2c-4f5b-8a37-0a0e8f6b2b11"},
            "shareLevel": "White",
            "isEnabled": true
        })
    }

    #[test]
    fn test_blocking_chain_follows_pages() {
        let executor = ScriptedExecutor::new();
        let next = [("link", "</api/replists?cursor=2>; rel=\"next\"")];
        executor.push_json(json!([replist("a5d2f13c-5a0f-4bc9-9b0c-6f1f0a4a2b4e")]), &next);
        executor.push_json(json!([]), &next);
        executor.push_json(json!([replist("2c1cb0e2-5a4b-4ed2-a1d1-b6a1b1e8b7c5")]), &[]);

        let client = BlockingClient::with_executor(executor.clone()).unwrap();
        let page = client
            .list_page::<ReplistCommonView>(&(), &PaginationParams::default())
            .unwrap();
        assert_eq!(page.items().len(), 1);

        let all = page.collect_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(executor.requests().len(), 3);
    }

    #[test]
    fn test_blocking_chain_yields_error_once() {
        let executor = ScriptedExecutor::new();
        executor.push_json(
            json!([replist("a5d2f13c-5a0f-4bc9-9b0c-6f1f0a4a2b4e")]),
            &[("link", "</api/replists?cursor=2>; rel=\"next\"")],
        );
        executor.push(Err(CybsiError::from_status(404, b"")));

        let client = BlockingClient::with_executor(executor.clone()).unwrap();
        let mut chain = client
            .list_page::<ReplistCommonView>(&(), &PaginationParams::default())
            .unwrap()
            .into_chain();
        assert!(chain.next().unwrap().is_ok());
        assert!(matches!(chain.next(), Some(Err(CybsiError::NotFound(_)))));
        assert!(chain.next().is_none());
    }

    #[test]
    fn test_blocking_change_stream_keeps_cursor() {
        let executor = ScriptedExecutor::new();
        executor.push_json(json!([]), &[]);

        let client = BlockingClient::with_executor(executor.clone()).unwrap();
        let mut changes = client.change_stream(
            "a5d2f13c-5a0f-4bc9-9b0c-6f1f0a4a2b4e".parse().unwrap(),
            Cursor::new("c0"),
        );
        assert!(changes.poll().unwrap().is_empty());
        assert!(changes.is_caught_up());
        assert_eq!(changes.cursor().as_str(), "c0");
    }
}

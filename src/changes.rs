//! Replist change stream.
//!
//! The change log of a replist never ends. A response without an
//! `X-Cursor` header means "caught up for now", and the position that
//! produced it stays the one to poll from. [`ChangeStream`] holds that
//! position so an absent cursor can never be checkpointed by mistake.

use std::time::Duration;

use uuid::Uuid;

use crate::client::CybsiClient;
use crate::error::Result;
use crate::models::{replist_changes, EntitySetChange, EntityView, ReplistSnapshot};
use crate::pagination::Cursor;

/// Position of a [`ChangeStream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeState {
    /// The last poll advertised this cursor; more changes may follow
    /// immediately.
    Positioned(Cursor),
    /// The last poll returned everything available. The cursor is the last
    /// one the server advertised and is reused by the next poll.
    ExhaustedForNow(Cursor),
}

impl ChangeState {
    /// The cursor the next poll is sent with.
    pub fn cursor(&self) -> &Cursor {
        match self {
            Self::Positioned(cursor) | Self::ExhaustedForNow(cursor) => cursor,
        }
    }
}

/// Follows the change log of one replist.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use cybsi::{replist_entities, ChangeStream, PaginationParams};
///
/// let snapshot = replist_entities(&client, replist_uuid, &PaginationParams::default())
///     .await?
///     .collect_all()
///     .await?;
///
/// let mut changes = ChangeStream::from_snapshot(client, replist_uuid, &snapshot);
/// loop {
///     for change in changes.next_changes(Duration::from_secs(10)).await? {
///         println!("{} {}", change.operation, change.entity.uuid);
///     }
///     save_checkpoint(changes.cursor());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ChangeStream {
    client: CybsiClient,
    replist_uuid: Uuid,
    limit: Option<u32>,
    state: ChangeState,
}

impl ChangeStream {
    /// Start following changes after `cursor`.
    ///
    /// The cursor is either the change cursor of a snapshot or a checkpoint
    /// taken from [`ChangeStream::cursor`] earlier.
    pub fn new(client: CybsiClient, replist_uuid: Uuid, cursor: Cursor) -> Self {
        Self {
            client,
            replist_uuid,
            limit: None,
            state: ChangeState::Positioned(cursor),
        }
    }

    /// Start following changes where a fully read snapshot ends.
    pub fn from_snapshot(client: CybsiClient, replist_uuid: Uuid, snapshot: &ReplistSnapshot) -> Self {
        Self::new(client, replist_uuid, snapshot.change_cursor.clone())
    }

    /// Ask for at most `limit` changes per poll.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn replist_uuid(&self) -> Uuid {
        self.replist_uuid
    }

    pub fn state(&self) -> &ChangeState {
        &self.state
    }

    /// Last cursor the server advertised. Safe to checkpoint.
    pub fn cursor(&self) -> &Cursor {
        self.state.cursor()
    }

    /// Whether the last poll returned every change available at that time.
    pub fn is_caught_up(&self) -> bool {
        matches!(self.state, ChangeState::ExhaustedForNow(_))
    }

    /// Fetch the next batch of changes.
    ///
    /// Issues exactly one request. An empty batch is not the end of the
    /// stream; see [`ChangeStream::is_caught_up`].
    ///
    /// # Errors
    ///
    /// Request errors are returned unchanged and leave the position as it
    /// was. A [`CursorOutOfRange`](crate::SemanticErrorCode::CursorOutOfRange)
    /// error means the position is gone for good: take a new snapshot.
    pub async fn poll(&mut self) -> Result<Vec<EntitySetChange<EntityView>>> {
        let cursor = self.state.cursor().clone();
        let page = replist_changes(&self.client, self.replist_uuid, &cursor, self.limit).await?;

        let advertised = page.cursor().clone();
        let changes = page.into_items();

        self.state = if advertised.is_empty() {
            ChangeState::ExhaustedForNow(cursor)
        } else {
            ChangeState::Positioned(advertised)
        };

        tracing::debug!(
            replist = %self.replist_uuid,
            count = changes.len(),
            caught_up = self.is_caught_up(),
            cursor = %self.cursor(),
            "polled replist changes"
        );
        Ok(changes)
    }

    /// Poll until at least one change arrives.
    ///
    /// Sleeps `interval` after every empty batch, whether or not the server
    /// advertised a new cursor with it.
    ///
    /// # Errors
    ///
    /// Returns the first poll error, see [`ChangeStream::poll`].
    pub async fn next_changes(&mut self, interval: Duration) -> Result<Vec<EntitySetChange<EntityView>>> {
        loop {
            let changes = self.poll().await?;
            if !changes.is_empty() {
                return Ok(changes);
            }
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CybsiError, SemanticErrorCode};
    use crate::models::EntitySetOperation;
    use crate::testing::ScriptedExecutor;
    use serde_json::json;
    use std::sync::Arc;

    const REPLIST_UUID: &str = "a5d2f13c-5a0f-4bc9-9b0c-6f1f0a4a2b4e";

    fn change(operation: &str, uuid: &str) -> serde_json::Value {
        json!({
            "operation": operation,
            "entity": {
                "uuid": uuid,
                "type": "IPAddress",
                "keys": [{"type": "String", "value": "10.0.0.1"}]
            }
        })
    }

    fn stream(executor: &Arc<ScriptedExecutor>, cursor: &str) -> ChangeStream {
        let client = CybsiClient::with_executor(executor.clone());
        ChangeStream::new(client, REPLIST_UUID.parse().unwrap(), Cursor::new(cursor))
    }

    #[tokio::test]
    async fn test_absent_cursor_keeps_last_good_cursor() {
        let executor = ScriptedExecutor::new();
        executor.push_json(
            json!([
                change("Add", "2c1cb0e2-5a4b-4ed2-a1d1-b6a1b1e8b7c5"),
                change("Remove", "9e3b5c2a-1f4d-4c8e-8a7b-3d2e1f0a9b8c")
            ]),
            &[],
        );
        executor.push_json(json!([]), &[]);

        let mut changes = stream(&executor, "c0");
        let batch = changes.poll().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].operation, EntitySetOperation::Remove);
        assert_eq!(
            changes.state(),
            &ChangeState::ExhaustedForNow(Cursor::new("c0"))
        );

        // Next poll reuses the kept cursor.
        changes.poll().await.unwrap();
        let requests = executor.requests();
        assert_eq!(requests[0].query_value("cursor"), Some("c0"));
        assert_eq!(requests[1].query_value("cursor"), Some("c0"));
    }

    #[tokio::test]
    async fn test_new_cursor_without_entries_is_positioned() {
        let executor = ScriptedExecutor::new();
        executor.push_json(json!([]), &[("x-cursor", "c1")]);

        let mut changes = stream(&executor, "c0");
        assert!(changes.poll().await.unwrap().is_empty());
        assert_eq!(changes.state(), &ChangeState::Positioned(Cursor::new("c1")));
        assert!(!changes.is_caught_up());
    }

    #[tokio::test]
    async fn test_cursor_out_of_range_is_distinct_and_keeps_position() {
        let executor = ScriptedExecutor::new();
        executor.push(Err(CybsiError::from_status(
            422,
            br#"{"code": "CursorOutOfRange", "message": "cursor is out of range"}"#,
        )));

        let mut changes = stream(&executor, "stale");
        let err = changes.poll().await.unwrap_err();
        assert!(err.is_cursor_out_of_range());
        assert_eq!(err.semantic_code(), Some(&SemanticErrorCode::CursorOutOfRange));
        assert!(!err.is_retryable());
        assert_eq!(changes.cursor().as_str(), "stale");
    }

    #[tokio::test]
    async fn test_emptiness_is_not_final() {
        let executor = ScriptedExecutor::new();
        executor.push_json(json!([]), &[]);
        executor.push_json(
            json!([change("Add", "2c1cb0e2-5a4b-4ed2-a1d1-b6a1b1e8b7c5")]),
            &[("x-cursor", "c1")],
        );

        let mut changes = stream(&executor, "c0");
        assert!(changes.poll().await.unwrap().is_empty());
        assert!(changes.is_caught_up());

        let batch = changes.poll().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(changes.cursor().as_str(), "c1");
    }

    #[tokio::test]
    async fn test_next_changes_sleeps_after_every_empty_batch() {
        let executor = ScriptedExecutor::new();
        executor.push_json(json!([]), &[]);
        executor.push_json(json!([]), &[("x-cursor", "c1")]);
        executor.push_json(
            json!([change("Add", "2c1cb0e2-5a4b-4ed2-a1d1-b6a1b1e8b7c5")]),
            &[("x-cursor", "c2")],
        );

        let mut changes = stream(&executor, "c0").with_limit(10);
        let interval = Duration::from_millis(20);
        let started = std::time::Instant::now();
        let batch = changes.next_changes(interval).await.unwrap();
        assert_eq!(batch.len(), 1);
        // Caught up once, then positioned but empty once.
        assert!(started.elapsed() >= interval * 2);
        assert_eq!(changes.cursor().as_str(), "c2");

        let cursors: Vec<_> = executor
            .requests()
            .iter()
            .map(|r| r.query_value("cursor").unwrap_or_default().to_string())
            .collect();
        assert_eq!(cursors, vec!["c0", "c0", "c1"]);
        assert!(executor
            .requests()
            .iter()
            .all(|r| r.query_value("limit") == Some("10")));
    }
}

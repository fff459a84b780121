//! Mock server state management.
//!
//! Provides the in-memory data store for the mock Cybsi API server.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    EntitySetChange, EntitySetOperation, EntityView, ReplistView, StoredQueryView, UserView,
};

/// A replist together with its content and change log.
#[derive(Debug, Clone)]
pub struct MockReplist {
    pub view: ReplistView,
    /// Current entity set, in insertion order.
    pub entities: Vec<EntityView>,
    /// Every change since the replist was created.
    pub changes: Vec<EntitySetChange<EntityView>>,
    /// Changes before this index were dropped from the log.
    pub compacted: usize,
    /// Bumped on every edit; served as the `ETag`.
    pub version: u64,
}

impl MockReplist {
    pub fn new(view: ReplistView) -> Self {
        Self {
            view,
            entities: Vec::new(),
            changes: Vec::new(),
            compacted: 0,
            version: 1,
        }
    }

    pub fn etag(&self) -> String {
        format!("\"{}\"", self.version)
    }
}

/// Shared state for the mock server.
///
/// It's wrapped in `Arc<RwLock<_>>` so tests can change it while the server
/// is running.
#[derive(Debug)]
pub struct MockState {
    /// The only API key the token endpoint accepts.
    pub api_key: String,
    /// Token currently accepted on API requests.
    pub access_token: Option<String>,
    /// Number of tokens issued so far.
    pub tokens_issued: u32,
    /// The user every valid token belongs to.
    pub current_user: Option<UserView>,
    pub users: BTreeMap<Uuid, UserView>,
    pub stored_queries: BTreeMap<Uuid, StoredQueryView>,
    pub replists: BTreeMap<Uuid, MockReplist>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            api_key: "test-api-key".to_string(),
            access_token: None,
            tokens_issued: 0,
            current_user: None,
            users: BTreeMap::new(),
            stored_queries: BTreeMap::new(),
            replists: BTreeMap::new(),
        }
    }
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Set the API key accepted by the token endpoint.
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = api_key.to_string();
        self
    }

    /// Add a user and make it the authenticated one.
    pub fn with_current_user(mut self, user: UserView) -> Self {
        self.users.insert(user.uuid, user.clone());
        self.current_user = Some(user);
        self
    }

    pub fn with_stored_query(mut self, query: StoredQueryView) -> Self {
        self.stored_queries.insert(query.uuid, query);
        self
    }

    pub fn with_replist(mut self, replist: MockReplist) -> Self {
        self.replists.insert(replist.view.uuid, replist);
        self
    }

    /// Issue a new access token, replacing the previous one.
    pub fn issue_token(&mut self) -> String {
        self.tokens_issued += 1;
        let token = format!("token-{}", self.tokens_issued);
        self.access_token = Some(token.clone());
        token
    }

    /// Reject every token issued so far.
    pub fn expire_tokens(&mut self) {
        self.access_token = None;
    }

    pub fn is_authorized(&self, authorization: Option<&str>) -> bool {
        match (&self.access_token, authorization) {
            (Some(token), Some(header)) => header.strip_prefix("Bearer ") == Some(token.as_str()),
            _ => false,
        }
    }

    /// Add an entity to a replist and log the change.
    ///
    /// Returns `false` if the replist does not exist.
    pub fn add_entity(&mut self, replist_uuid: Uuid, entity: EntityView) -> bool {
        let Some(replist) = self.replists.get_mut(&replist_uuid) else {
            return false;
        };
        replist.entities.push(entity.clone());
        replist.changes.push(EntitySetChange {
            operation: EntitySetOperation::Add,
            entity,
        });
        true
    }

    /// Remove an entity from a replist and log the change.
    ///
    /// Returns `false` if the replist or the entity does not exist.
    pub fn remove_entity(&mut self, replist_uuid: Uuid, entity_uuid: Uuid) -> bool {
        let Some(replist) = self.replists.get_mut(&replist_uuid) else {
            return false;
        };
        let Some(index) = replist.entities.iter().position(|e| e.uuid == entity_uuid) else {
            return false;
        };
        let entity = replist.entities.remove(index);
        replist.changes.push(EntitySetChange {
            operation: EntitySetOperation::Remove,
            entity,
        });
        true
    }

    /// Drop the change log of a replist. Cursors issued before become
    /// out of range.
    pub fn compact_changes(&mut self, replist_uuid: Uuid) {
        if let Some(replist) = self.replists.get_mut(&replist_uuid) {
            replist.compacted = replist.changes.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server::Fixtures;

    #[test]
    fn test_token_rotation() {
        let mut state = MockState::new();
        assert!(!state.is_authorized(Some("Bearer token-1")));

        let token = state.issue_token();
        assert!(state.is_authorized(Some(&format!("Bearer {token}"))));
        assert!(!state.is_authorized(None));

        state.expire_tokens();
        assert!(!state.is_authorized(Some(&format!("Bearer {token}"))));
        assert_eq!(state.issue_token(), "token-2");
    }

    #[test]
    fn test_entity_changes_are_logged() {
        let replist = Fixtures::replist("b61f4a0e-3a53-4d41-9b8e-21c1a2f0f001");
        let replist_uuid = replist.view.uuid;
        let entity = Fixtures::domain("b61f4a0e-3a53-4d41-9b8e-21c1a2f0e001", "a.example");
        let mut state = MockState::new().with_replist(replist);

        assert!(state.add_entity(replist_uuid, entity.clone()));
        assert!(state.remove_entity(replist_uuid, entity.uuid));
        assert!(!state.remove_entity(replist_uuid, entity.uuid));

        let replist = &state.replists[&replist_uuid];
        assert!(replist.entities.is_empty());
        let operations: Vec<_> = replist.changes.iter().map(|c| c.operation).collect();
        assert_eq!(
            operations,
            vec![EntitySetOperation::Add, EntitySetOperation::Remove]
        );
    }
}

//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use uuid::Uuid;

use super::state::{MockReplist, MockState};
use crate::{
    EntityKeyType, EntityKeyView, EntityType, EntityView, Permission, RefView, ReplistCommonView,
    ReplistView, RoleCommonView, ShareLevel, StoredQueryCommonView, StoredQueryView, Tag,
    UserCommonView, UserView,
};

/// Identifier of the default user.
pub const DEFAULT_USER_UUID: &str = "5a0b7e8e-2d2c-4f5b-8a37-0a0e8f6b2b11";
/// Identifier of the default stored query.
pub const DEFAULT_QUERY_UUID: &str = "0f7c6b1e-0e35-4d1c-9d0b-8d5f3b0b3b7d";
/// Identifier of the default replist.
pub const DEFAULT_REPLIST_UUID: &str = "a5d2f13c-5a0f-4bc9-9b0c-6f1f0a4a2b4e";

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    fn uuid(value: &str) -> Uuid {
        Uuid::parse_str(value).unwrap_or_else(|_| Uuid::new_v4())
    }

    // =========================================================================
    // User Fixtures
    // =========================================================================

    pub fn user(uuid: &str, login: &str) -> UserView {
        UserView {
            common: UserCommonView {
                uuid: Self::uuid(uuid),
                url: None,
                login: login.to_string(),
                full_name: None,
                email: None,
                is_disabled: false,
                auth_provider_id: "cybsi".to_string(),
            },
            access_level: ShareLevel::Amber,
            roles: vec![RoleCommonView {
                uuid: Uuid::new_v4(),
                name: "FeedDataReader".to_string(),
            }],
            permissions: vec![
                Permission {
                    resource: "ReputationLists".to_string(),
                    actions: "rw".to_string(),
                },
                Permission {
                    resource: "StoredQuery".to_string(),
                    actions: "rw".to_string(),
                },
            ],
            data_source: None,
            tag: Tag::default(),
        }
    }

    // =========================================================================
    // Stored Query Fixtures
    // =========================================================================

    pub fn stored_query(uuid: &str, name: &str, text: &str) -> StoredQueryView {
        StoredQueryView {
            uuid: Self::uuid(uuid),
            url: None,
            name: name.to_string(),
            text: text.to_string(),
            author: RefView {
                uuid: Self::uuid(DEFAULT_USER_UUID),
                url: None,
            },
            tag: Tag::default(),
        }
    }

    // =========================================================================
    // Replist Fixtures
    // =========================================================================

    /// Enabled replist built on the default stored query, with no content.
    pub fn replist(uuid: &str) -> MockReplist {
        MockReplist::new(ReplistView {
            common: ReplistCommonView {
                uuid: Self::uuid(uuid),
                url: None,
                query: StoredQueryCommonView {
                    uuid: Self::uuid(DEFAULT_QUERY_UUID),
                    url: None,
                    name: "domains".to_string(),
                },
                author: RefView {
                    uuid: Self::uuid(DEFAULT_USER_UUID),
                    url: None,
                },
                share_level: ShareLevel::Green,
                is_enabled: true,
            },
            status: "Active".to_string(),
            updated_at: Some(chrono::Utc::now()),
            tag: Tag::default(),
        })
    }

    // =========================================================================
    // Entity Fixtures
    // =========================================================================

    pub fn domain(uuid: &str, name: &str) -> EntityView {
        EntityView {
            uuid: Self::uuid(uuid),
            url: None,
            entity_type: EntityType::DomainName,
            keys: vec![EntityKeyView {
                key_type: EntityKeyType::String,
                value: name.to_string(),
            }],
        }
    }

    /// `count` domain entities named `host-N.example`.
    pub fn domains(count: usize) -> Vec<EntityView> {
        (0..count)
            .map(|i| EntityView {
                uuid: Uuid::new_v4(),
                url: None,
                entity_type: EntityType::DomainName,
                keys: vec![EntityKeyView {
                    key_type: EntityKeyType::String,
                    value: format!("host-{i}.example"),
                }],
            })
            .collect()
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    /// Default user and stored query, plus one replist holding `entities`
    /// domains. The snapshot has no change history.
    pub fn default_scenario(entities: usize) -> MockState {
        let mut replist = Self::replist(DEFAULT_REPLIST_UUID);
        replist.entities = Self::domains(entities);

        MockState::new()
            .with_current_user(Self::user(DEFAULT_USER_UUID, "analyst"))
            .with_stored_query(Self::stored_query(
                DEFAULT_QUERY_UUID,
                "domains",
                "EntityType = DomainName",
            ))
            .with_replist(replist)
    }
}

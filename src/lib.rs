//! Cybsi API client library.
//!
//! A Rust client for the Cybsi threat intelligence REST API, built around
//! cursor pagination and replist change tracking. Operations are defined as
//! traits (`Get`, `List`, `Register`, `Edit`) that resource types implement.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use cybsi::{replist_entities, ChangeStream, CybsiClient, PaginationParams};
//!
//! #[tokio::main]
//! async fn main() -> cybsi::Result<()> {
//!     let client = CybsiClient::from_env()?;
//!     let replist_uuid = "a5d2f13c-5a0f-4bc9-9b0c-6f1f0a4a2b4e".parse().unwrap();
//!
//!     // Download the whole snapshot first...
//!     let snapshot = replist_entities(&client, replist_uuid, &PaginationParams::default())
//!         .await?
//!         .collect_all()
//!         .await?;
//!     println!("replist holds {} entities", snapshot.entities.len());
//!
//!     // ...then follow changes from where its last page left off.
//!     let mut changes = ChangeStream::from_snapshot(client, replist_uuid, &snapshot);
//!     loop {
//!         for change in changes.next_changes(Duration::from_secs(10)).await? {
//!             println!("{} {}", change.operation, change.entity.uuid);
//!         }
//!     }
//! }
//! ```
//!
//! # Pagination
//!
//! Collection endpoints return a [`Page`]. A page knows its [`Cursor`] and
//! whether more data follows; [`Page::next_page`] fetches the next one and
//! [`Page::into_stream`] flattens the whole chain.
//!
//! The replist change log is different: an empty cursor means "caught up
//! for now", never "finished". [`ChangeStream`] keeps the last valid cursor
//! so it is the only one a caller can checkpoint.
//!
//! # Configuration
//!
//! [`Config::from_env`] reads:
//!
//! - `CYBSI_API_URL` (required) - API root, e.g. `https://cybsi.local/api`
//! - `CYBSI_API_KEY` (required) - API key
//! - `CYBSI_SSL_VERIFY` (optional) - `false` disables TLS certificate checks
//!
//! A synchronous facade lives in [`blocking`].

mod auth;
pub mod blocking;
mod changes;
pub mod cli;
mod client;
mod config;
mod error;
mod executor;
mod models;
pub mod output;
mod pagination;
mod traits;

#[cfg(test)]
mod testing;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use auth::{ApiKeyAuth, TokenView};
pub use changes::{ChangeState, ChangeStream};
pub use client::CybsiClient;
pub use config::Config;
pub use error::{CybsiError, ErrorView, ForbiddenErrorCode, Result, SemanticErrorCode};
pub use executor::{ApiRequest, ApiResponse, Executor, HttpExecutor, Target};
pub use pagination::{
    chain_pages, serde_decoder, Cursor, Decoder, Page, PaginationParams, DEFAULT_PAGE_LIMIT,
    X_CURSOR_HEADER,
};

// Re-export traits
pub use traits::{Edit, Get, List, Register};

// Re-export models
pub use models::{
    // Common types
    Nullable,
    RefView,
    ShareLevel,
    Tag,
    // Entity types
    EntityForm,
    EntityKeyType,
    EntityKeyView,
    EntityType,
    EntityView,
    // Replist types
    EntitySetChange,
    EntitySetOperation,
    ReplistCommonView,
    ReplistEditParams,
    ReplistEntities,
    ReplistForm,
    ReplistSnapshot,
    ReplistView,
    X_CHANGE_CURSOR_HEADER,
    // Stored query types
    StoredQueryCommonView,
    StoredQueryEditParams,
    StoredQueryForm,
    StoredQueryView,
    // User types
    CurrentUserView,
    Permission,
    ProfileEditParams,
    RoleCommonView,
    UserCommonView,
    UserEditParams,
    UserForm,
    UserListQuery,
    UserView,
    // API key types
    ApiKeyCommonView,
    ApiKeyEditParams,
    ApiKeyForm,
    ApiKeyOwner,
    ApiKeyRefView,
    ApiKeyView,
};

// Re-export convenience functions
pub use models::{replist_changes, replist_entities};
pub use models::{generate_api_key, list_api_keys, revoke_api_key};

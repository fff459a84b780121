//! Mock Cybsi API server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates the Cybsi
//! API for integration and end-to-end testing. Unlike wiremock which mocks
//! at the HTTP level per-test, this server maintains state across requests,
//! so a test can change a replist between two polls of its change log.
//!
//! # Example
//!
//! ```ignore
//! use cybsi::mock_server::{Fixtures, MockServer, DEFAULT_REPLIST_UUID};
//! use cybsi::{Config, CybsiClient, Get, ReplistView};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = CybsiClient::new(&server.config().await).unwrap();
//!
//!     let replist = ReplistView::get(&client, DEFAULT_REPLIST_UUID.parse().unwrap())
//!         .await
//!         .unwrap();
//!     assert!(replist.is_enabled);
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{Fixtures, DEFAULT_QUERY_UUID, DEFAULT_REPLIST_UUID, DEFAULT_USER_UUID};
pub use server::MockServer;
pub use state::{MockReplist, MockState};

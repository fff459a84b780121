//! In-process HTTP server speaking the Cybsi REST dialect.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;
use crate::Config;

/// Entities in the default replist; more than one default-sized page.
const DEFAULT_ENTITY_COUNT: usize = 45;

type Shared = Arc<RwLock<MockState>>;

/// A stateful Cybsi API double bound to a loopback port.
///
/// Tests mutate the backing [`MockState`] through [`MockServer::state`] to
/// drive replist changes, token expiry and compaction between client calls.
pub struct MockServer {
    addr: SocketAddr,
    url: String,
    task: JoinHandle<()>,
    state: Shared,
}

impl MockServer {
    /// Serves the default scenario: one stored query and one replist of
    /// [`DEFAULT_ENTITY_COUNT`] domains.
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_scenario(DEFAULT_ENTITY_COUNT)).await
    }

    /// Serves no queries, replists or users. Only the token endpoint works.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    pub async fn with_state(state: MockState) -> Self {
        let state = state.shared();

        // Port 0 lets parallel tests each get their own server.
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("mock server could not bind a loopback port");
        let addr = listener
            .local_addr()
            .expect("bound listener has a local address");

        let app = routes(state.clone());
        let task = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                tracing::error!(%err, "mock server stopped");
            }
        });
        tracing::debug!(%addr, "mock Cybsi API listening");

        Self {
            addr,
            url: format!("http://{addr}"),
            task,
            state,
        }
    }

    /// Base URL, e.g. `http://127.0.0.1:53412`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Client configuration pointing at this server with its API key.
    pub async fn config(&self) -> Config {
        let api_key = self.state.read().await.api_key.clone();
        Config::new(&self.url, &api_key).expect("mock server URL is valid")
    }

    pub fn state(&self) -> Shared {
        Arc::clone(&self.state)
    }

    /// Stops serving. Connections already accepted are dropped.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

fn routes(state: Shared) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/auth/token", get(handlers::get_token))
        .route("/users/me", get(handlers::get_me))
        .merge(stored_query_routes())
        .merge(replist_routes())
        .with_state(state)
}

fn stored_query_routes() -> Router<Shared> {
    const BASE: &str = "/search/stored-queries";
    Router::new()
        .route(
            BASE,
            get(handlers::list_stored_queries).post(handlers::register_stored_query),
        )
        .route(&format!("{BASE}/:uuid"), get(handlers::get_stored_query))
}

fn replist_routes() -> Router<Shared> {
    Router::new()
        .route(
            "/replists",
            get(handlers::list_replists).post(handlers::register_replist),
        )
        .route(
            "/replists/:uuid",
            get(handlers::get_replist).patch(handlers::edit_replist),
        )
        .route("/replists/:uuid/entities", get(handlers::list_replist_entities))
        .route("/replists/:uuid/changes", get(handlers::list_replist_changes))
}

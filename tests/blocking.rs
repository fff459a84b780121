//! Execution tests for the blocking client.
//!
//! Runs outside of any async runtime; the mock server is driven through
//! `tokio_test::block_on`.

use cybsi::blocking::BlockingClient;
use cybsi::{Config, Cursor, PaginationParams, ReplistCommonView, ReplistView};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPLIST: &str = "a5d2f13c-5a0f-4bc9-9b0c-6f1f0a4a2b4e";

fn replist_json() -> serde_json::Value {
    serde_json::json!({
        "uuid": REPLIST,
        "query": {"uuid": "0f7c6b1e-0e35-4d1c-9d0b-8d5f3b0b3b7d", "name": "domains"},
        "author": {"uuid": "5a0b7e8e-2d2c-4f5b-8a37-0a0e8f6b2b11"},
        "shareLevel": "Green",
        "isEnabled": true,
        "status": "Active"
    })
}

fn setup() -> (MockServer, BlockingClient) {
    let mock_server = tokio_test::block_on(MockServer::start());
    tokio_test::block_on(
        Mock::given(method("GET"))
            .and(path("/auth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": "t1",
                "tokenType": "Bearer"
            })))
            .mount(&mock_server),
    );

    let config = Config::new(&mock_server.uri(), "test-key").unwrap();
    let client = BlockingClient::new(&config).unwrap();
    (mock_server, client)
}

#[test]
fn test_blocking_get() {
    let (mock_server, client) = setup();

    tokio_test::block_on(
        Mock::given(method("GET"))
            .and(path(format!("/replists/{REPLIST}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(replist_json())
                    .insert_header("ETag", "\"3\""),
            )
            .expect(1)
            .mount(&mock_server),
    );

    let replist = client.get::<ReplistView>(REPLIST.parse().unwrap()).unwrap();
    assert_eq!(replist.query.name, "domains");
    assert_eq!(replist.tag.as_str(), "\"3\"");
}

#[test]
fn test_blocking_chain_iterates_all_pages() {
    let (mock_server, client) = setup();

    tokio_test::block_on(async {
        Mock::given(method("GET"))
            .and(path("/replists"))
            .and(query_param("limit", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([replist_json()]))
                    .insert_header("X-Cursor", "p2")
                    .insert_header("Link", "<replists?cursor=p2>; rel=\"next\""),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/replists"))
            .and(query_param("cursor", "p2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([replist_json()])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
    });

    let page = client
        .list_page::<ReplistCommonView>(&(), &PaginationParams::with_limit(1))
        .unwrap();
    assert_eq!(page.items().len(), 1);
    assert_eq!(page.cursor().as_str(), "p2");
    assert!(page.has_next());

    let all: Vec<ReplistCommonView> = page.into_chain().collect::<cybsi::Result<_>>().unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn test_blocking_change_stream() {
    let (mock_server, client) = setup();

    tokio_test::block_on(
        Mock::given(method("GET"))
            .and(path(format!("/replists/{REPLIST}/changes")))
            .and(query_param("cursor", "ch-5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&mock_server),
    );

    let mut stream = client.change_stream(REPLIST.parse().unwrap(), Cursor::new("ch-5"));
    assert!(stream.poll().unwrap().is_empty());
    assert!(stream.is_caught_up());
    assert_eq!(stream.cursor().as_str(), "ch-5");
}

#[test]
fn test_blocking_snapshot_takes_last_change_cursor() {
    let (mock_server, client) = setup();
    let entity = |uuid: &str| {
        serde_json::json!({
            "uuid": uuid,
            "type": "DomainName",
            "keys": [{"type": "String", "value": "example.com"}]
        })
    };

    tokio_test::block_on(async {
        Mock::given(method("GET"))
            .and(path(format!("/replists/{REPLIST}/entities")))
            .and(query_param_is_missing("cursor"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([entity("2c1cb0e2-5a4b-4ed2-a1d1-b6a1b1e8b7c5")]))
                    .insert_header("X-Change-Cursor", "ch-4")
                    .insert_header("Link", "<entities?cursor=p2>; rel=\"next\""),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/replists/{REPLIST}/entities")))
            .and(query_param("cursor", "p2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([entity("9e3b5c2a-1f4d-4c8e-8a7b-3d2e1f0a9b8c")]))
                    .insert_header("X-Change-Cursor", "ch-5"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
    });

    let snapshot = client
        .replist_snapshot(REPLIST.parse().unwrap(), &PaginationParams::default())
        .unwrap();
    assert_eq!(snapshot.entities.len(), 2);
    assert_eq!(snapshot.change_cursor.as_str(), "ch-5");
}

//! Execution tests for single-resource calls.
//!
//! Uses wiremock to mock the Cybsi API and test actual execution flow.

use cybsi::{
    Config, CybsiClient, CybsiError, Edit, EntityView, ForbiddenErrorCode, Get, List,
    ReplistCommonView, ReplistEditParams, ReplistView, SemanticErrorCode, Tag,
};
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPLIST: &str = "a5d2f13c-5a0f-4bc9-9b0c-6f1f0a4a2b4e";

async fn client_with_token(mock_server: &MockServer) -> CybsiClient {
    Mock::given(method("GET"))
        .and(path("/auth/token"))
        .and(query_param("apiKey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": "t1",
            "tokenType": "Bearer",
            "expiresIn": 3600
        })))
        .mount(mock_server)
        .await;

    let config = Config::new(&mock_server.uri(), "test-key").unwrap();
    CybsiClient::new(&config).unwrap()
}

fn replist_json() -> serde_json::Value {
    serde_json::json!({
        "uuid": REPLIST,
        "query": {"uuid": "0f7c6b1e-0e35-4d1c-9d0b-8d5f3b0b3b7d", "name": "domains"},
        "author": {"uuid": "5a0b7e8e-2d2c-4f5b-8a37-0a0e8f6b2b11"},
        "shareLevel": "Green",
        "isEnabled": true,
        "status": "Active",
        "updatedAt": "2024-03-01T10:00:00Z"
    })
}

#[tokio::test]
async fn test_get_replist_sends_api_headers() {
    let mock_server = MockServer::start().await;
    let client = client_with_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(format!("/replists/{REPLIST}")))
        .and(header("authorization", "Bearer t1"))
        .and(header("accept", "application/vnd.ptsecurity.app-v2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(replist_json())
                .insert_header("ETag", "\"42\""),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let replist = ReplistView::get(&client, REPLIST.parse().unwrap())
        .await
        .unwrap();

    assert_eq!(replist.query.name, "domains");
    assert_eq!(replist.tag, Tag::new("\"42\""));
}

#[tokio::test]
async fn test_edit_replist_sends_if_match() {
    let mock_server = MockServer::start().await;
    let client = client_with_token(&mock_server).await;

    Mock::given(method("PATCH"))
        .and(path(format!("/replists/{REPLIST}")))
        .and(header("if-match", "\"42\""))
        .and(body_json(serde_json::json!({"shareLevel": "Red"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let params = ReplistEditParams {
        share_level: Some(cybsi::ShareLevel::Red),
        ..Default::default()
    };
    ReplistView::edit(&client, REPLIST.parse().unwrap(), &Tag::new("\"42\""), &params)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_edit_with_stale_tag_is_resource_modified() {
    let mock_server = MockServer::start().await;
    let client = client_with_token(&mock_server).await;

    Mock::given(method("PATCH"))
        .and(path(format!("/replists/{REPLIST}")))
        .respond_with(ResponseTemplate::new(412))
        .mount(&mock_server)
        .await;

    let err = ReplistView::edit(
        &client,
        REPLIST.parse().unwrap(),
        &Tag::new("\"41\""),
        &ReplistEditParams::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CybsiError::ResourceModified(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_error_statuses_map_to_variants() {
    let mock_server = MockServer::start().await;
    let client = client_with_token(&mock_server).await;
    let missing = "9e3b5c2a-1f4d-4c8e-8a7b-3d2e1f0a9b8c";
    let forbidden = "7d3c2b1a-0f9e-4d8c-b7a6-5e4d3c2b1a0f";
    let broken = "1b2c3d4e-5f60-4718-8293-a4b5c6d7e8f9";

    Mock::given(method("GET"))
        .and(path(format!("/observable/entities/{missing}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/observable/entities/{forbidden}")))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "code": "MissingPermissions",
            "message": "Observable:r required"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/observable/entities/{broken}")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let err = EntityView::get(&client, missing.parse().unwrap()).await.unwrap_err();
    assert!(matches!(err, CybsiError::NotFound(_)));
    assert_eq!(err.status(), Some(404));

    let err = EntityView::get(&client, forbidden.parse().unwrap()).await.unwrap_err();
    match err {
        CybsiError::Forbidden { code, view } => {
            assert_eq!(code, ForbiddenErrorCode::MissingPermissions);
            assert_eq!(view.message.as_deref(), Some("Observable:r required"));
        }
        other => panic!("Expected Forbidden, got {other:?}"),
    }

    let err = EntityView::get(&client, broken.parse().unwrap()).await.unwrap_err();
    assert!(matches!(
        &err,
        CybsiError::UnexpectedStatus { status: 503, body } if body == "maintenance"
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unknown_semantic_code_is_preserved() {
    let mock_server = MockServer::start().await;
    let client = client_with_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(format!("/replists/{REPLIST}")))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "code": "BrandNewCode",
            "message": "something new"
        })))
        .mount(&mock_server)
        .await;

    let err = ReplistView::get(&client, REPLIST.parse().unwrap())
        .await
        .unwrap_err();
    assert_eq!(
        err.semantic_code(),
        Some(&SemanticErrorCode::Other("BrandNewCode".to_string()))
    );
    assert!(!err.is_cursor_out_of_range());
}

#[tokio::test]
async fn test_embed_object_url_is_sent() {
    let mock_server = MockServer::start().await;
    client_with_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(format!("/replists/{REPLIST}")))
        .and(query_param("embedObjectURL", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(replist_json()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::new(&mock_server.uri(), "test-key")
        .unwrap()
        .with_embed_object_url(true);
    let client = CybsiClient::new(&config).unwrap();

    ReplistView::get(&client, REPLIST.parse().unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_embed_object_url_is_not_repeated_on_followed_links() {
    let mock_server = MockServer::start().await;
    client_with_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/replists"))
        .and(query_param_is_missing("cursor"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([replist_json()]))
                .insert_header("Link", "<replists?cursor=p2&embedObjectURL=true>; rel=\"next\""),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/replists"))
        .and(query_param("cursor", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([replist_json()])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::new(&mock_server.uri(), "test-key")
        .unwrap()
        .with_embed_object_url(true);
    let client = CybsiClient::new(&config).unwrap();

    let all = ReplistCommonView::list_all(&client, &()).await.unwrap();
    assert_eq!(all.len(), 2);

    let requests = mock_server.received_requests().await.unwrap();
    let listings: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path() == "/replists")
        .collect();
    assert_eq!(listings.len(), 2);
    for request in listings {
        let embeds = request
            .url
            .query_pairs()
            .filter(|(name, _)| name == "embedObjectURL")
            .count();
        assert_eq!(embeds, 1, "in {}", request.url);
    }
}

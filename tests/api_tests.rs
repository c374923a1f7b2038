// tests/api_tests.rs

use std::{sync::Arc, time::Duration};

use article_comments::{
    config::{Config, StoreBackend},
    models::author::Identity,
    routes,
    service::CommentService,
    state::AppState,
    store::MemoryCommentStore,
    utils::jwt::sign_session,
};
use axum::{Json, Router, extract::Query, routing::get};
use serde_json::{Value, json};
use std::collections::HashMap;

const JWT_SECRET: &str = "test_secret_for_integration_tests";

fn test_config(article_search_url: &str) -> Config {
    Config {
        store_backend: StoreBackend::Memory,
        database_url: None,
        jwt_secret: JWT_SECRET.to_string(),
        moderator_name: "moderator".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        cors_origins: vec!["http://localhost:8000".to_string()],
        article_search_url: article_search_url.parse().unwrap(),
        article_api_key: Some("test-key".to_string()),
        io_timeout: Duration::from_secs(5),
        max_write_retries: 3,
        rust_log: "error".to_string(),
    }
}

/// Serves `app` on a random port and returns its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Helper function to spawn the app with an in-memory store.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app_with_upstream(article_search_url: &str) -> String {
    let config = test_config(article_search_url);
    let store = Arc::new(MemoryCommentStore::new());

    let state = AppState {
        service: Arc::new(CommentService::from_config(store, &config)),
        config,
        http: reqwest::Client::new(),
    };

    serve(routes::create_router(state)).await
}

async fn spawn_app() -> String {
    spawn_app_with_upstream("http://127.0.0.1:9/unused").await
}

fn bearer(name: &str, email: &str) -> String {
    let identity = Identity {
        email: Some(email.to_string()),
        name: Some(name.to_string()),
    };
    format!("Bearer {}", sign_session(&identity, JWT_SECRET, 600).unwrap())
}

fn unique_title() -> String {
    format!("article-{}", uuid::Uuid::new_v4())
}

async fn post_comment(client: &reqwest::Client, address: &str, title: &str, text: &str) -> Value {
    let response = client
        .post(format!("{}/api/comments", address))
        .json(&json!({ "articleTitle": title, "text": text }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn post_reply(client: &reqwest::Client, address: &str, target: &str, text: &str) -> Value {
    let response = client
        .post(format!("{}/api/comments/{}/reply", address, target))
        .json(&json!({ "text": text }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn list(client: &reqwest::Client, address: &str, title: &str) -> Vec<Value> {
    let response = client
        .get(format!("{}/api/comments/{}", address, title))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn unknown_path_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn health_check_works() {
    let address = spawn_app().await;

    let response = reqwest::get(format!("{}/health", address)).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn empty_article_lists_nothing() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    assert!(list(&client, &address, "No-Article").await.is_empty());
}

#[tokio::test]
async fn guest_comment_is_created_and_listed() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let title = unique_title();

    // Act
    let created = post_comment(&client, &address, &title, "Hello").await;

    // Assert
    assert_eq!(created["articleTitle"], title.as_str());
    assert_eq!(created["text"], "Hello");
    assert_eq!(created["authorEmail"], "Guest");
    assert_eq!(created["authorDisplayName"], "Anonymous");
    assert_eq!(created["replies"], json!([]));

    let listed = list(&client, &address, &title).await;
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn comments_keep_posting_order() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let title = unique_title();

    let first = post_comment(&client, &address, &title, "first").await;
    let second = post_comment(&client, &address, &title, "second").await;

    let listed = list(&client, &address, &title).await;
    assert_eq!(listed[0]["id"], first["id"]);
    assert_eq!(listed[1]["id"], second["id"]);
}

#[tokio::test]
async fn signed_in_author_is_recorded() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/comments", address))
        .header("Authorization", bearer("Ada", "ada@example.com"))
        .json(&json!({ "articleTitle": unique_title(), "text": "Signed" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["authorEmail"], "ada@example.com");
    assert_eq!(created["authorDisplayName"], "Ada");
}

#[tokio::test]
async fn invalid_session_token_is_401() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/comments", address))
        .header("Authorization", "Bearer not-a-token")
        .json(&json!({ "articleTitle": "T", "text": "x" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn invalid_session_token_reads_as_guest() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let title = unique_title();
    post_comment(&client, &address, &title, "hello").await;

    let response = client
        .get(format!("{}/api/comments/{}", address, title))
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let listed: Vec<Value> = response.json().await.unwrap();
    assert_eq!(listed.len(), 1);

    let session: Value = client
        .get(format!("{}/api/session", address))
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["authorEmail"], "Guest");
    assert_eq!(session["moderator"], false);
}

#[tokio::test]
async fn comment_text_comes_back_unchanged() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let title = unique_title();

    let root = post_comment(&client, &address, &title, "Tom & Jerry: 1 < 2").await;
    assert_eq!(root["text"], "Tom & Jerry: 1 < 2");

    let id = root["id"].as_str().unwrap();
    post_reply(&client, &address, id, "<b>bold</b> & \"quoted\"").await;

    let listed = list(&client, &address, &title).await;
    assert_eq!(listed[0]["text"], "Tom & Jerry: 1 < 2");
    assert_eq!(listed[0]["replies"][0]["text"], "<b>bold</b> & \"quoted\"");
}

#[tokio::test]
async fn missing_text_is_400() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/comments", address))
        .json(&json!({ "articleTitle": "T" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn nested_replies_build_a_tree() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let title = unique_title();

    let root = post_comment(&client, &address, &title, "root").await;
    let a = post_reply(&client, &address, root["id"].as_str().unwrap(), "A").await;
    let hi = post_reply(&client, &address, a["id"].as_str().unwrap(), "hi").await;

    assert_eq!(hi["text"], "hi");
    assert!(hi.get("articleTitle").is_none());

    let listed = list(&client, &address, &title).await;
    let nested = &listed[0]["replies"][0]["replies"];
    assert_eq!(nested.as_array().unwrap().len(), 1);
    assert_eq!(nested[0]["id"], hi["id"]);
}

#[tokio::test]
async fn reply_to_unknown_comment_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/comments/{}/reply", address, "does-not-exist"))
        .json(&json!({ "text": "hello?" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn delete_without_moderator_is_400() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let title = unique_title();
    let root = post_comment(&client, &address, &title, "keep me").await;
    let url = format!("{}/api/comments/{}", address, root["id"].as_str().unwrap());

    let anonymous = client.delete(&url).send().await.unwrap();
    assert_eq!(anonymous.status().as_u16(), 400);
    let body: Value = anonymous.json().await.unwrap();
    assert!(body.get("error").is_some());

    let reader = client
        .delete(&url)
        .header("Authorization", bearer("reader", "reader@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(reader.status().as_u16(), 400);

    assert_eq!(list(&client, &address, &title).await[0]["text"], "keep me");
}

#[tokio::test]
async fn moderator_redacts_nested_reply() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let title = unique_title();

    let root = post_comment(&client, &address, &title, "root").await;
    let child = post_reply(&client, &address, root["id"].as_str().unwrap(), "child").await;
    post_reply(&client, &address, child["id"].as_str().unwrap(), "grandchild").await;
    post_reply(&client, &address, root["id"].as_str().unwrap(), "sibling").await;

    let response = client
        .delete(format!("{}/api/comments/{}", address, child["id"].as_str().unwrap()))
        .header("Authorization", bearer("moderator", "mod@example.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "deleted");

    let listed = list(&client, &address, &title).await;
    let replies = listed[0]["replies"].as_array().unwrap();
    assert_eq!(listed[0]["text"], "root");
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["id"], child["id"]);
    assert_eq!(replies[0]["text"], "COMMENT REMOVED BY MODERATOR!");
    assert_eq!(replies[0]["replies"], json!([]));
    assert_eq!(replies[1]["text"], "sibling");
}

#[tokio::test]
async fn moderator_redacts_root() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let title = unique_title();

    let root = post_comment(&client, &address, &title, "root").await;
    post_reply(&client, &address, root["id"].as_str().unwrap(), "child").await;

    let response = client
        .delete(format!("{}/api/comments/{}", address, root["id"].as_str().unwrap()))
        .header("Authorization", bearer("moderator", "mod@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let listed = list(&client, &address, &title).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["text"], "COMMENT REMOVED BY MODERATOR!");
    assert_eq!(listed[0]["replies"], json!([]));
}

#[tokio::test]
async fn moderator_delete_of_unknown_id_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/api/comments/non-existent", address))
        .header("Authorization", bearer("moderator", "mod@example.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn session_reports_author_and_role() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let guest: Value = client
        .get(format!("{}/api/session", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(guest["authorEmail"], "Guest");
    assert_eq!(guest["moderator"], false);

    let moderator: Value = client
        .get(format!("{}/api/session", address))
        .header("Authorization", bearer("moderator", "mod@example.com"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(moderator["authorDisplayName"], "moderator");
    assert_eq!(moderator["moderator"], true);
}

/// Fake article search upstream: echoes the received query back as
/// `echo` and returns five docs.
async fn spawn_fake_upstream() -> String {
    let app = Router::new().route(
        "/search",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            let docs: Vec<Value> = (0..5).map(|i| json!({ "id": i })).collect();
            Json(json!({ "echo": params, "response": { "docs": docs } }))
        }),
    );
    format!("{}/search", serve(app).await)
}

#[tokio::test]
async fn article_search_truncates_docs() {
    let upstream = spawn_fake_upstream().await;
    let address = spawn_app_with_upstream(&upstream).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!(
            "{}/api/findArticle/Sacramento-Davis/20250101?pageSize=2&page=0",
            address
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["response"]["docs"].as_array().unwrap().len(), 2);

    let fq = body["echo"]["fq"].as_str().unwrap();
    assert!(fq.contains("Sacramento"));
    assert!(fq.contains("Davis"));
    assert_eq!(body["echo"]["page"], "0");
    assert_eq!(body["echo"]["pageSize"], "2");
    assert_eq!(body["echo"]["api-key"], "test-key");
}

#[tokio::test]
async fn article_search_upstream_failure_is_500() {
    let failing = Router::new().route(
        "/search",
        get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let upstream = format!("{}/search", serve(failing).await);
    let address = spawn_app_with_upstream(&upstream).await;

    let response = reqwest::get(format!(
        "{}/api/findArticle/Sacramento-Davis/20250101",
        address
    ))
    .await
    .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn article_search_rejects_bad_date() {
    let address = spawn_app().await;

    let response = reqwest::get(format!(
        "{}/api/findArticle/Sacramento-Davis/yesterday",
        address
    ))
    .await
    .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

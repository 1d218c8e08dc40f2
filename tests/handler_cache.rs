mod common;

use axum::http::StatusCode;
use common::{ADMIN_TOKEN, EDITOR_TOKEN, MemoryCache, bearer};
use serde_json::{Value, json};
use sqlx::PgPool;

#[sqlx::test]
async fn test_public_list_is_cached_and_served(pool: PgPool) {
    common::create_faq(&pool, "Open on Sundays?", Some("Visits")).await;
    let cache = MemoryCache::new();
    let (server, _) = common::create_test_server_with_cache(pool, cache.clone()).await;

    let response = server.get("/api/faqs").await;
    response.assert_status_ok();

    let cached = cache.wait_for_entry("faqs:list:0").await.unwrap();
    assert_eq!(cached, response.text());

    cache.insert("faqs:list:0", r#"[{"id":1,"question":"From cache?"}]"#);

    let response = server.get("/api/faqs").await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!([{ "id": 1, "question": "From cache?" }])
    );
}

#[sqlx::test]
async fn test_filtered_and_paginated_lists_skip_cache(pool: PgPool) {
    common::create_faq(&pool, "Q?", Some("General")).await;
    let cache = MemoryCache::new();
    let (server, _) = common::create_test_server_with_cache(pool, cache.clone()).await;

    server
        .get("/api/faqs?category=General")
        .await
        .assert_status_ok();
    server.get("/api/faqs?page=1").await.assert_status_ok();
    server.get("/api/faqs?page_size=5").await.assert_status_ok();

    assert!(cache.calls().is_empty(), "calls: {:?}", cache.calls());
}

#[sqlx::test]
async fn test_inbox_list_skips_cache(pool: PgPool) {
    let cache = MemoryCache::new();
    let (server, _) = common::create_test_server_with_cache(pool, cache.clone()).await;

    server
        .get("/api/contact_messages")
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .await
        .assert_status_ok();

    assert!(cache.calls().is_empty(), "calls: {:?}", cache.calls());
}

#[sqlx::test]
async fn test_write_invalidates_dependent_lists(pool: PgPool) {
    let cache = MemoryCache::new();
    let (server, _) = common::create_test_server_with_cache(pool, cache.clone()).await;

    server
        .post("/api/stats")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .json(&json!({ "label": "Kids", "value": "900" }))
        .await
        .assert_status(StatusCode::CREATED);

    let invalidated = cache.invalidated();
    assert!(invalidated.contains(&"stats".to_string()));
    assert!(invalidated.contains(&"heroes".to_string()));

    cache.clear_calls();

    server
        .post("/api/laboratories")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .json(&json!({ "name": "Optics" }))
        .await
        .assert_status(StatusCode::CREATED);

    let invalidated = cache.invalidated();
    assert!(invalidated.contains(&"laboratories".to_string()));
    assert!(invalidated.contains(&"centers".to_string()));
}

#[sqlx::test]
async fn test_failed_write_does_not_invalidate(pool: PgPool) {
    let cache = MemoryCache::new();
    let (server, _) = common::create_test_server_with_cache(pool, cache.clone()).await;

    server
        .post("/api/stats")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .json(&json!({ "label": "Kids" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert!(cache.invalidated().is_empty());
}

#[sqlx::test]
async fn test_list_cached_before_a_write_is_never_served(pool: PgPool) {
    let id = common::create_faq(&pool, "Old question?", None).await;
    let cache = MemoryCache::new();
    let (server, _) = common::create_test_server_with_cache(pool, cache.clone()).await;

    server.get("/api/faqs").await.assert_status_ok();
    let stale = cache.wait_for_entry("faqs:list:0").await.unwrap();

    server
        .patch(&format!("/api/faqs/{id}"))
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .json(&json!({ "question": "New question?" }))
        .await
        .assert_status_ok();

    // A read that started before the update stores its body late.
    cache.insert("faqs:list:0", &stale);

    let response = server.get("/api/faqs").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()[0]["question"], "New question?");

    let fresh = cache.wait_for_entry("faqs:list:1").await.unwrap();
    assert_eq!(fresh, response.text());
}

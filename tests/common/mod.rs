#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use stem_cms::api::routes::api_router;
use stem_cms::domain::entities::Role;
use stem_cms::infrastructure::cache::{CacheResult, CacheService, NullCache, generation_key};
use stem_cms::infrastructure::media::FilesystemMediaStore;
use stem_cms::state::AppState;
use stem_cms::utils::key_generator::generate_media_key;
use stem_cms::utils::token::hash_token;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const MEDIA_BASE_URL: &str = "/uploads";
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024;

pub const EDITOR_TOKEN: &str = "editor-token-0123456789";
pub const ADMIN_TOKEN: &str = "admin-token-0123456789";

/// A fresh upload directory under the system temp dir.
pub fn temp_upload_dir() -> PathBuf {
    std::env::temp_dir().join(format!("stem-cms-test-{}", generate_media_key().unwrap()))
}

/// In-memory cache that records every call it receives.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn entry(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Calls recorded so far, as `"<op> <key>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Resources invalidated so far, in call order.
    pub fn invalidated(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|call| call.strip_prefix("invalidate "))
            .map(str::to_string)
            .collect()
    }

    /// Waits for fire-and-forget writes spawned by a handler.
    pub async fn wait_for_entry(&self, key: &str) -> Option<String> {
        for _ in 0..1000 {
            if let Some(value) = self.entry(key) {
                return Some(value);
            }
            tokio::task::yield_now().await;
        }
        None
    }

    fn record(&self, op: &str, key: &str) {
        self.calls.lock().unwrap().push(format!("{op} {key}"));
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.record("get", key);
        Ok(self.entry(key))
    }

    async fn set(&self, key: &str, value: &str, _ttl_seconds: Option<u64>) -> CacheResult<()> {
        self.record("set", key);
        self.insert(key, value);
        Ok(())
    }

    async fn generation(&self, resource: &str) -> CacheResult<u64> {
        self.record("generation", resource);
        Ok(self
            .entry(&generation_key(resource))
            .and_then(|g| g.parse().ok())
            .unwrap_or(0))
    }

    async fn invalidate(&self, resource: &str) -> CacheResult<()> {
        self.record("invalidate", resource);
        let mut entries = self.entries.lock().unwrap();
        let key = generation_key(resource);
        let next = entries
            .get(&key)
            .and_then(|g| g.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        entries.insert(key, next.to_string());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

pub fn create_test_state(pool: PgPool) -> (AppState, PathBuf) {
    create_test_state_with_cache(pool, Arc::new(NullCache::new()))
}

pub fn create_test_state_with_cache(
    pool: PgPool,
    cache: Arc<dyn CacheService>,
) -> (AppState, PathBuf) {
    let upload_dir = temp_upload_dir();
    let media_store = FilesystemMediaStore::new(&upload_dir, MEDIA_BASE_URL);

    let state = AppState::new(
        Arc::new(pool),
        cache,
        media_store,
        SIGNING_SECRET.to_string(),
        MAX_UPLOAD_BYTES,
    );

    (state, upload_dir)
}

/// Test server over `/api` with editor and admin tokens registered.
pub async fn create_test_server(pool: PgPool) -> (TestServer, PathBuf) {
    create_test_server_with_cache(pool, Arc::new(NullCache::new())).await
}

pub async fn create_test_server_with_cache(
    pool: PgPool,
    cache: Arc<dyn CacheService>,
) -> (TestServer, PathBuf) {
    create_token(&pool, "editor", EDITOR_TOKEN, Role::Editor).await;
    create_token(&pool, "admin", ADMIN_TOKEN, Role::Admin).await;

    let (state, upload_dir) = create_test_state_with_cache(pool, cache);
    let app = Router::new()
        .nest("/api", api_router(state.clone()))
        .with_state(state);

    (TestServer::new(app).unwrap(), upload_dir)
}

pub async fn create_token(pool: &PgPool, name: &str, raw: &str, role: Role) -> i64 {
    sqlx::query_scalar("INSERT INTO api_tokens (name, token_hash, role) VALUES ($1, $2, $3) RETURNING id")
        .bind(name)
        .bind(hash_token(SIGNING_SECRET, raw))
        .bind(role.as_str())
        .fetch_one(pool)
        .await
        .unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub async fn create_center(pool: &PgPool, name: &str, slug: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO centers (name, slug) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(slug)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_laboratory(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO laboratories (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_hero(pool: &PgPool, title: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO heroes (title) VALUES ($1) RETURNING id")
        .bind(title)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_faq(pool: &PgPool, question: &str, category: Option<&str>) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO faqs (question, answer, category) VALUES ($1, 'Answer', $2) RETURNING id",
    )
    .bind(question)
    .bind(category)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn names(body: &Value, key: &str) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item[key].as_str().unwrap().to_string())
        .collect()
}

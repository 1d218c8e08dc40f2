use sqlx::PgPool;
use std::sync::Arc;
use stem_cms::AppError;
use stem_cms::domain::entities::Role;
use stem_cms::domain::repositories::TokenRepository;
use stem_cms::infrastructure::persistence::PgTokenRepository;

#[sqlx::test]
async fn test_create_token(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let token = repo
        .create_token("test-token", "hash123", Role::Editor)
        .await
        .unwrap();

    assert_eq!(token.name, "test-token");
    assert_eq!(token.token_hash, "hash123");
    assert_eq!(token.role, Role::Editor);
    assert!(token.revoked_at.is_none());
    assert!(token.last_used_at.is_none());
}

#[sqlx::test]
async fn test_create_token_duplicate_name(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    repo.create_token("dup", "hash-a", Role::Editor)
        .await
        .unwrap();
    let result = repo.create_token("dup", "hash-b", Role::Admin).await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
async fn test_validate_token_valid(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    repo.create_token("valid-token", "validhash", Role::Admin)
        .await
        .unwrap();

    let token = repo.validate_token("validhash").await.unwrap().unwrap();

    assert_eq!(token.name, "valid-token");
    assert_eq!(token.role, Role::Admin);
}

#[sqlx::test]
async fn test_validate_token_invalid(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let result = repo.validate_token("nonexistent").await.unwrap();

    assert!(result.is_none());
}

#[sqlx::test]
async fn test_validate_token_revoked(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let token = repo
        .create_token("revoked-token", "revokedhash", Role::Editor)
        .await
        .unwrap();
    repo.revoke_token(token.id).await.unwrap();

    let result = repo.validate_token("revokedhash").await.unwrap();

    assert!(result.is_none());
}

#[sqlx::test]
async fn test_update_last_used(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let token = repo
        .create_token("update-token", "updatehash", Role::Editor)
        .await
        .unwrap();

    repo.update_last_used("updatehash").await.unwrap();

    let reloaded = repo.find_by_id(token.id).await.unwrap().unwrap();
    assert!(reloaded.last_used_at.is_some());
}

#[sqlx::test]
async fn test_list_tokens(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    repo.create_token("token1", "hash1", Role::Editor)
        .await
        .unwrap();
    repo.create_token("token2", "hash2", Role::Admin)
        .await
        .unwrap();

    let tokens = repo.list_tokens().await.unwrap();

    assert_eq!(tokens.len(), 2);
}

#[sqlx::test]
async fn test_find_by_name(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    repo.create_token("unique-name", "namehash", Role::Editor)
        .await
        .unwrap();

    let token = repo.find_by_name("unique-name").await.unwrap();
    assert_eq!(token.unwrap().token_hash, "namehash");

    assert!(repo.find_by_name("missing").await.unwrap().is_none());
}

#[sqlx::test]
async fn test_revoke_already_revoked(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let token = repo
        .create_token("double-revoke", "doublehash", Role::Editor)
        .await
        .unwrap();

    repo.revoke_token(token.id).await.unwrap();
    let result = repo.revoke_token(token.id).await;

    assert!(matches!(result, Err(AppError::NotFound { .. })));
}

mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use common::{ADMIN_TOKEN, EDITOR_TOKEN, MAX_UPLOAD_BYTES, MEDIA_BASE_URL, bearer};
use serde_json::{Value, json};
use sqlx::PgPool;
use std::path::{Path, PathBuf};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

fn stored_path(upload_dir: &Path, url: &str) -> PathBuf {
    let key = url
        .strip_prefix(MEDIA_BASE_URL)
        .unwrap()
        .trim_start_matches('/');
    upload_dir.join(key)
}

fn png_part(file_name: &str) -> Part {
    Part::bytes(PNG_BYTES.to_vec())
        .file_name(file_name)
        .mime_type("image/png")
}

#[sqlx::test]
async fn test_multipart_create_stores_image(pool: PgPool) {
    let (server, upload_dir) = common::create_test_server(pool).await;

    let form = MultipartForm::new()
        .add_text("title", "Science fair")
        .add_text("category", "Events")
        .add_part("image", png_part("fair.png"));

    let response = server
        .post("/api/gallery_items")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(form)
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    let url = body["image"].as_str().unwrap();
    assert!(url.starts_with("/uploads/gallery_items/"));
    assert!(url.ends_with(".png"));

    let stored = std::fs::read(stored_path(&upload_dir, url)).unwrap();
    assert_eq!(stored, PNG_BYTES);
}

#[sqlx::test]
async fn test_multipart_text_fields_and_lists(pool: PgPool) {
    let (server, _) = common::create_test_server(pool).await;

    let form = MultipartForm::new()
        .add_text("title", "Robotics")
        .add_text("features[]", "Hands-on")
        .add_text("features[]", "Small groups");

    let response = server
        .post("/api/programs")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(form)
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["slug"], "robotics");
    assert_eq!(body["features"], json!(["Hands-on", "Small groups"]));
    assert!(body["image"].is_null());
}

#[sqlx::test]
async fn test_upload_unsupported_type(pool: PgPool) {
    let (server, _) = common::create_test_server(pool).await;

    let form = MultipartForm::new().add_text("title", "Doc").add_part(
        "image",
        Part::bytes(b"%PDF-1.7".to_vec())
            .file_name("doc.pdf")
            .mime_type("application/pdf"),
    );

    let response = server
        .post("/api/gallery_items")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(form)
        .await;

    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[sqlx::test]
async fn test_upload_too_large(pool: PgPool) {
    let (server, _) = common::create_test_server(pool).await;

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(vec![0u8; MAX_UPLOAD_BYTES + 1])
            .file_name("huge.png")
            .mime_type("image/png"),
    );

    let response = server
        .post("/api/gallery_items")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(form)
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[sqlx::test]
async fn test_file_for_non_image_field(pool: PgPool) {
    let (server, _) = common::create_test_server(pool).await;

    let form = MultipartForm::new()
        .add_text("answer", "A")
        .add_part("question", png_part("q.png"));

    let response = server
        .post("/api/faqs")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[sqlx::test]
async fn test_failed_create_releases_upload(pool: PgPool) {
    let (server, upload_dir) = common::create_test_server(pool).await;

    // `author` and `quote` are required, so the row is rejected after the
    // image was stored.
    let form = MultipartForm::new().add_part("image", png_part("face.png"));

    let response = server
        .post("/api/testimonials")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let dir = upload_dir.join("testimonials");
    let leftovers = std::fs::read_dir(&dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[sqlx::test]
async fn test_update_replaces_and_releases_image(pool: PgPool) {
    let (server, upload_dir) = common::create_test_server(pool).await;

    let created = server
        .post("/api/gallery_items")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(MultipartForm::new().add_part("image", png_part("one.png")))
        .await
        .json::<Value>();
    let id = created["id"].as_i64().unwrap();
    let old_url = created["image"].as_str().unwrap().to_string();

    let response = server
        .patch(&format!("/api/gallery_items/{id}"))
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(MultipartForm::new().add_part("image", png_part("two.png")))
        .await;

    response.assert_status_ok();
    let new_url = response.json::<Value>()["image"]
        .as_str()
        .unwrap()
        .to_string();

    assert_ne!(new_url, old_url);
    assert!(!stored_path(&upload_dir, &old_url).exists());
    assert!(stored_path(&upload_dir, &new_url).exists());
}

#[sqlx::test]
async fn test_external_image_url_is_kept(pool: PgPool) {
    let (server, _) = common::create_test_server(pool).await;

    let created = server
        .post("/api/partners")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .json(&json!({ "name": "Acme", "logo": "https://cdn.example.com/acme.png" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let id = created.json::<Value>()["id"].as_i64().unwrap();

    server
        .delete(&format!("/api/partners/{id}"))
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[sqlx::test]
async fn test_delete_releases_image(pool: PgPool) {
    let (server, upload_dir) = common::create_test_server(pool).await;

    let created = server
        .post("/api/gallery_items")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(MultipartForm::new().add_part("image", png_part("gone.png")))
        .await
        .json::<Value>();
    let id = created["id"].as_i64().unwrap();
    let path = stored_path(&upload_dir, created["image"].as_str().unwrap());
    assert!(path.exists());

    server
        .delete(&format!("/api/gallery_items/{id}"))
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert!(!path.exists());
}

#[sqlx::test]
async fn test_update_with_bad_links_keeps_previous_image(pool: PgPool) {
    let (server, upload_dir) = common::create_test_server(pool).await;

    let created = server
        .post("/api/centers")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(
            MultipartForm::new()
                .add_text("name", "North")
                .add_part("image", png_part("north.png")),
        )
        .await
        .json::<Value>();
    let id = created["id"].as_i64().unwrap();
    let old_url = created["image"].as_str().unwrap().to_string();

    let response = server
        .patch(&format!("/api/centers/{id}"))
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(
            MultipartForm::new()
                .add_text("laboratory_ids", "999")
                .add_part("image", png_part("south.png")),
        )
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let reloaded = server
        .get(&format!("/api/centers/{id}"))
        .await
        .json::<Value>();
    assert_eq!(reloaded["image"], old_url.as_str());
    assert_eq!(reloaded["laboratories"], json!([]));
    assert!(stored_path(&upload_dir, &old_url).exists());

    let files = std::fs::read_dir(upload_dir.join("centers")).unwrap().count();
    assert_eq!(files, 1);
}

#[sqlx::test]
async fn test_shared_image_survives_delete_of_one_record(pool: PgPool) {
    let (server, upload_dir) = common::create_test_server(pool).await;

    let first = server
        .post("/api/partners")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(
            MultipartForm::new()
                .add_text("name", "Acme")
                .add_part("logo", png_part("acme.png")),
        )
        .await
        .json::<Value>();
    let first_id = first["id"].as_i64().unwrap();
    let url = first["logo"].as_str().unwrap().to_string();
    let path = stored_path(&upload_dir, &url);

    let second = server
        .post("/api/partners")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .json(&json!({ "name": "Acme Labs", "logo": url }))
        .await;
    second.assert_status(StatusCode::CREATED);
    let second_id = second.json::<Value>()["id"].as_i64().unwrap();

    server
        .delete(&format!("/api/partners/{second_id}"))
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(path.exists());

    server
        .delete(&format!("/api/partners/{first_id}"))
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(!path.exists());
}

#[sqlx::test]
async fn test_shared_image_survives_replacement_on_one_record(pool: PgPool) {
    let (server, upload_dir) = common::create_test_server(pool).await;

    let hero = server
        .post("/api/heroes")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(
            MultipartForm::new()
                .add_text("title", "Welcome")
                .add_part("image", png_part("hero.png")),
        )
        .await
        .json::<Value>();
    let url = hero["image"].as_str().unwrap().to_string();

    let item = server
        .post("/api/gallery_items")
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .json(&json!({ "title": "Reused", "image": url }))
        .await;
    item.assert_status(StatusCode::CREATED);
    let item_id = item.json::<Value>()["id"].as_i64().unwrap();

    let response = server
        .patch(&format!("/api/gallery_items/{item_id}"))
        .add_header("Authorization", bearer(EDITOR_TOKEN))
        .multipart(MultipartForm::new().add_part("image", png_part("own.png")))
        .await;
    response.assert_status_ok();
    assert_ne!(response.json::<Value>()["image"], url.as_str());

    assert!(stored_path(&upload_dir, &url).exists());
}

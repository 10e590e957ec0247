//! End-to-end HTTP tests against a router backed by temporary directories.

use std::io::Cursor;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use filedrop_api::{AppState, create_router};
use filedrop_shared::AppConfig;
use http_body_util::BodyExt;
use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "filedrop-test-boundary";

struct TestApp {
    dir: TempDir,
    router: Router,
}

async fn test_app_with(max_upload_bytes: u64) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.storage.uploads_dir = dir.path().join("uploads");
    config.storage.thumbnails_dir = dir.path().join("thumbnails");
    config.storage.metadata_file = dir.path().join("data").join("files.json");
    config.storage.max_upload_bytes = max_upload_bytes;

    let state = AppState::from_config(&config).await.unwrap();
    TestApp {
        dir,
        router: create_router(state, None),
    }
}

async fn test_app() -> TestApp {
    test_app_with(10 * 1024 * 1024).await
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    RgbImage::from_pixel(width, height, Rgb([200, 100, 50]))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, headers, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, _, body) = self.get(uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn upload(&self, filename: &str, content: &[u8]) -> (StatusCode, Value) {
        let request = Request::post("/api/v1/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body("file", filename, content)))
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn delete(&self, key: &str) -> (StatusCode, Value) {
        let request = Request::delete(format!("/api/v1/files/{key}"))
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = app.get_json("/api/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_upload_list_download_delete_round_trip() {
    let app = test_app().await;

    let (status, uploaded) = app.upload("notes.txt", b"hello filedrop").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(uploaded["display_name"], "notes.txt");
    assert_eq!(uploaded["size_bytes"], 14);
    assert_eq!(uploaded["thumbnail"], "skipped");
    let key = uploaded["storage_key"].as_str().unwrap().to_string();
    assert!(app.dir.path().join("uploads").join(&key).exists());

    let (status, listed) = app.get_json("/api/v1/files").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["storage_key"], key.as_str());

    let (status, details) = app.get_json(&format!("/api/v1/files/{key}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["display_name"], "notes.txt");
    assert_eq!(details["uploaded_at"], details["modified_at"]);

    let (status, headers, body) = app.get(&format!("/api/v1/files/{key}/download")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"hello filedrop");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"notes.txt\""
    );

    let (status, deleted) = app.delete(&key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["display_name"], "notes.txt");
    assert!(!app.dir.path().join("uploads").join(&key).exists());

    let (_, listed) = app.get_json("/api/v1/files").await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, body) = app.delete(&key).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_uploads_get_suffixed_names() {
    let app = test_app().await;

    let (_, first) = app.upload("a.txt", b"one").await;
    let (_, second) = app.upload("a.txt", b"two").await;

    assert_eq!(first["display_name"], "a.txt");
    assert_eq!(second["display_name"], "a (1).txt");
    assert_ne!(first["storage_key"], second["storage_key"]);

    let (_, _, body) = app
        .get(&format!(
            "/api/v1/files/{}/download",
            first["storage_key"].as_str().unwrap()
        ))
        .await;
    assert_eq!(body, b"one");
}

#[tokio::test]
async fn test_percent_encoded_unicode_filename() {
    let app = test_app().await;

    let (status, uploaded) = app.upload("%E6%97%A5%E6%9C%AC.txt", b"x").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(uploaded["display_name"], "日本.txt");

    let key = uploaded["storage_key"].as_str().unwrap();
    let (_, headers, _) = app.get(&format!("/api/v1/files/{key}/download")).await;
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains("filename*=UTF-8''%E6%97%A5%E6%9C%AC.txt"));
}

#[tokio::test]
async fn test_image_thumbnail_is_cropped_to_box() {
    let app = test_app().await;

    let (status, uploaded) = app.upload("wide.png", &png_bytes(900, 300)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(uploaded["mime_type"], "image/png");
    assert_eq!(uploaded["thumbnail"], "done");

    let key = uploaded["storage_key"].as_str().unwrap();
    let (status, headers, body) = app.get(&format!("/api/v1/files/{key}/thumbnail")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers["x-preview-source"], "thumbnail");
    assert_eq!(image::load_from_memory(&body).unwrap().dimensions(), (300, 225));
    assert!(
        app.dir
            .path()
            .join("thumbnails")
            .join(format!("{key}.png"))
            .exists()
    );
}

#[tokio::test]
async fn test_thumbnail_of_text_is_unsupported() {
    let app = test_app().await;
    let (_, uploaded) = app.upload("notes.txt", b"words").await;
    let key = uploaded["storage_key"].as_str().unwrap();

    let (status, body) = app.get_json(&format!("/api/v1/files/{key}/thumbnail")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "UNSUPPORTED_MEDIA");
}

#[tokio::test]
async fn test_externally_deleted_payload_is_pruned_from_list() {
    let app = test_app().await;
    let (_, gone) = app.upload("gone.txt", b"1").await;
    let (_, kept) = app.upload("kept.txt", b"2").await;

    let gone_key = gone["storage_key"].as_str().unwrap();
    std::fs::remove_file(app.dir.path().join("uploads").join(gone_key)).unwrap();

    let (_, listed) = app.get_json("/api/v1/files").await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["storage_key"], kept["storage_key"]);

    let document = std::fs::read_to_string(app.dir.path().join("data").join("files.json")).unwrap();
    assert!(!document.contains(gone_key));
}

#[tokio::test]
async fn test_invalid_key_is_rejected() {
    let app = test_app().await;
    let (status, body) = app.get_json("/api/v1/files/..hidden").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_missing_file_field_is_rejected() {
    let app = test_app().await;
    let request = Request::post("/api/v1/files")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body("attachment", "a.txt", b"x")))
        .unwrap();

    let (status, _, body) = app.send(request).await;
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let app = test_app_with(8).await;
    let (status, body) = app.upload("big.bin", b"0123456789").await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "PAYLOAD_TOO_LARGE");

    let (_, listed) = app.get_json("/api/v1/files").await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_multipart_is_client_error() {
    let app = test_app().await;
    let request = Request::post("/api/v1/files")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from("no parts here"))
        .unwrap();

    let (status, _, body) = app.send(request).await;
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_only_first_file_part_is_stored() {
    let app = test_app().await;
    let mut body = multipart_body("file", "first.txt", b"one");
    // Drop the closing delimiter and append a second file part.
    body.truncate(body.len() - format!("--{BOUNDARY}--\r\n").len());
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"second.txt\"\r\n\r\ntwo\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );
    let request = Request::post("/api/v1/files")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, _, body) = app.send(request).await;
    let created: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["display_name"], "first.txt");
    assert_eq!(created["size_bytes"], 3);

    let (_, listed) = app.get_json("/api/v1/files").await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["display_name"], "first.txt");

    let key = created["storage_key"].as_str().unwrap();
    let (_, _, payload) = app.get(&format!("/api/v1/files/{key}/download")).await;
    assert_eq!(payload, b"one");
}

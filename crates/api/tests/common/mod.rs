#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use isoshelf_api::config::ServerConfig;
use isoshelf_api::router::build_app_router;
use isoshelf_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout and on-demand rescans of `iso_dir`.
pub fn test_config(iso_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        iso_dir: iso_dir.to_path_buf(),
        scan_workers: 2,
        refresh_interval_secs: 0,
    }
}

/// Build the full application router, with the production middleware
/// stack, over the images in `iso_dir`.
pub fn build_test_app(iso_dir: &Path) -> Router {
    build_test_app_with(test_config(iso_dir))
}

pub fn build_test_app_with(config: ServerConfig) -> Router {
    let state = AppState::new(config.clone());
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Synthetic images
// ---------------------------------------------------------------------------

const SECTOR: usize = 2048;
const PVD_START: usize = 16 * SECTOR;

/// Write a minimal ISO9660 image whose descriptor carries `label` and
/// `application_id`, padded with zeros to at least `size_bytes`.
pub fn write_iso(dir: &Path, file_name: &str, label: &str, size_bytes: u64) -> PathBuf {
    let mut sector = vec![0u8; SECTOR];
    sector[0] = 1;
    sector[1..6].copy_from_slice(b"CD001");
    sector[6] = 1;
    sector[8..72].fill(b' ');
    sector[40..40 + label.len()].copy_from_slice(label.as_bytes());
    sector[128..130].copy_from_slice(&2048u16.to_le_bytes());
    sector[130..132].copy_from_slice(&2048u16.to_be_bytes());
    sector[190..813].fill(b' ');
    sector[574..581].copy_from_slice(b"MKISOFS");
    sector[813..829].copy_from_slice(b"2024010112000000");
    sector[830..846].copy_from_slice(b"2024020112000000");
    sector[847..863].fill(b'0');
    sector[864..880].fill(b'0');

    let mut image = vec![0u8; PVD_START];
    image.extend_from_slice(&sector);

    let path = dir.join(file_name);
    std::fs::write(&path, &image).unwrap();
    if size_bytes > image.len() as u64 {
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(size_bytes).unwrap();
    }
    path
}

/// Write a file with the image extension that is not an ISO9660 image.
pub fn write_junk(dir: &Path, file_name: &str, size_bytes: u64) -> PathBuf {
    let path = dir.join(file_name);
    let file = std::fs::File::create(&path).unwrap();
    file.set_len(size_bytes).unwrap();
    path
}

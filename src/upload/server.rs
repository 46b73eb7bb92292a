// src/upload/server.rs
//! 远端接收服务：校验请求后原子落盘，只保留最新一张图。
//!
//! 无状态处理器：方法、令牌、文件字段、大小、类型逐项校验，
//! 任一不过立即返回带JSON错误体的状态码。

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::common::clock::unix_now;
use crate::common::error::{AppError, Result};
use crate::upload::token;

/// Multipart framing overhead allowed on top of the file itself.
const BODY_SLACK: usize = 64 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub api_key: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_token_max_age")]
    pub token_max_age_secs: i64,
    pub dest_path: PathBuf,
}

fn default_max_upload_bytes() -> usize {
    1024 * 1024
}

fn default_token_max_age() -> i64 {
    300
}

impl ServerConfig {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("cannot parse {}: {e}", path.display())))
    }
}

pub fn router(cfg: Arc<ServerConfig>) -> Router {
    let body_limit = cfg.max_upload_bytes + BODY_SLACK;
    Router::new()
        .route("/upload", post(handle_upload).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(cfg)
}

pub async fn run(cfg: ServerConfig) -> Result<()> {
    if let Some(dir) = cfg.dest_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    info!("upload server listening on {}", cfg.bind_addr);
    axum::serve(listener, router(Arc::new(cfg))).await?;
    Ok(())
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn method_not_allowed() -> Response {
    reject(StatusCode::METHOD_NOT_ALLOWED, "POST only")
}

async fn handle_upload(
    State(cfg): State<Arc<ServerConfig>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    // Token checks come before the body is touched.
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let Some(bearer) = bearer else {
        return reject(StatusCode::UNAUTHORIZED, "missing bearer token");
    };
    if let Err(e) = token::verify(&cfg.api_key, bearer, unix_now(), cfg.token_max_age_secs) {
        warn!("rejected upload token: {e}");
        return reject(StatusCode::UNAUTHORIZED, &e.to_string());
    }

    // First "file" field wins, other fields (e.g. note) are drained.
    let mut file: Option<(Vec<u8>, String)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    let _ = field.bytes().await;
                    continue;
                }
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_default();
                match field.bytes().await {
                    Ok(bytes) => {
                        file = Some((bytes.to_vec(), content_type));
                        break;
                    }
                    Err(e) => {
                        warn!("unreadable file field: {e}");
                        return reject(StatusCode::BAD_REQUEST, "file too large or unreadable");
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("malformed multipart body: {e}");
                return reject(StatusCode::BAD_REQUEST, "malformed multipart body");
            }
        }
    }

    let Some((bytes, content_type)) = file else {
        return reject(StatusCode::BAD_REQUEST, "missing file field");
    };
    if !content_type.starts_with("image/") {
        return reject(StatusCode::BAD_REQUEST, "only image uploads are accepted");
    }
    if bytes.is_empty() {
        return reject(StatusCode::BAD_REQUEST, "empty file");
    }
    if bytes.len() > cfg.max_upload_bytes {
        return reject(StatusCode::BAD_REQUEST, "file too large");
    }

    // Temp file plus rename keeps the destination always complete.
    let tmp = cfg.dest_path.with_extension("tmp");
    if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
        error!("writing {} failed: {e}", tmp.display());
        return reject(StatusCode::INTERNAL_SERVER_ERROR, "write failed");
    }
    if let Err(e) = tokio::fs::rename(&tmp, &cfg.dest_path).await {
        error!("renaming into {} failed: {e}", cfg.dest_path.display());
        return reject(StatusCode::INTERNAL_SERVER_ERROR, "write failed");
    }

    info!("stored {} bytes at {}", bytes.len(), cfg.dest_path.display());
    (
        StatusCode::OK,
        Json(json!({ "status": "success", "bytes": bytes.len() })),
    )
        .into_response()
}

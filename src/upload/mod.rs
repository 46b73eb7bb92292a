// src/upload/mod.rs

/// 上传链路
///
/// 客户端、令牌与远端接收服务。认证和校验失败对单次尝试是致命的，
/// 只有传输类错误才值得重试。
pub mod client;
pub mod server;
pub mod token;

use thiserror::Error;

pub use client::UploadClient;
pub use token::TokenError;

#[derive(Error, Debug)]
pub enum UploadError {
    /// Authentication rejected, retrying with the same material is pointless.
    #[error("upload auth rejected: {0}")]
    Auth(String),

    /// The server refused the payload (size, type, missing file).
    #[error("upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Network-level failure, worth a bounded retry.
    #[error("upload transport error: {0}")]
    Transport(String),
}

impl UploadError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, UploadError::Transport(_))
    }
}

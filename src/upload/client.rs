// src/upload/client.rs
//! 上传客户端：multipart POST，带符号令牌。
//!
//! 传输类错误按配置的次数退避重试，认证/校验类错误当次放弃。

use std::time::Duration;

use log::{info, warn};
use serde::Deserialize;

use crate::common::clock::unix_now;
use crate::common::config::UploadConfig;
use crate::common::error::{AppError, Result};
use crate::upload::UploadError;
use crate::upload::token;

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct UploadClient {
    http: reqwest::Client,
    cfg: UploadConfig,
}

impl UploadClient {
    pub fn new(cfg: UploadConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| AppError::ProviderFetch(format!("upload client: {e}")))?;
        Ok(Self { http, cfg })
    }

    /// Upload one frame, retrying transient failures with doubling backoff.
    pub async fn upload(&self, png: Vec<u8>, note: &str) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.try_upload(png.clone(), note).await {
                Ok(()) => {
                    info!("upload ok ({} bytes)", png.len());
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < self.cfg.max_retries => {
                    let delay = backoff_delay(attempt, self.cfg.backoff_base_secs);
                    warn!("upload attempt {} failed ({e}), retrying in {delay:?}", attempt + 1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(AppError::Upload(e)),
            }
        }
    }

    async fn try_upload(&self, png: Vec<u8>, note: &str) -> core::result::Result<(), UploadError> {
        // Tokens are single use, a fresh one per attempt.
        let bearer = token::issue(&self.cfg.api_key, unix_now());

        let part = reqwest::multipart::Part::bytes(png)
            .file_name("schedule.png")
            .mime_str("image/png")
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("note", note.to_string());

        let resp = self
            .http
            .post(&self.cfg.server_url)
            .header("Authorization", format!("Bearer {bearer}"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let message = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| status.to_string());

        if status == reqwest::StatusCode::UNAUTHORIZED {
            Err(UploadError::Auth(message))
        } else if status.is_client_error() {
            Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            })
        } else {
            // 5xx from the far side is worth another try.
            Err(UploadError::Transport(format!("{status}: {message}")))
        }
    }
}

fn backoff_delay(attempt: u32, base_secs: u64) -> Duration {
    Duration::from_secs(base_secs.saturating_mul(1u64 << attempt.min(6)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(0, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(1, 2), Duration::from_secs(4));
        assert_eq!(backoff_delay(2, 2), Duration::from_secs(8));
    }

    #[test]
    fn backoff_is_bounded() {
        assert_eq!(backoff_delay(40, 2), Duration::from_secs(128));
    }

    #[test]
    fn auth_errors_are_not_retryable() {
        assert!(!UploadError::Auth("bad signature".into()).is_retryable());
        assert!(
            !UploadError::Rejected {
                status: 400,
                message: "too large".into()
            }
            .is_retryable()
        );
        assert!(UploadError::Transport("timed out".into()).is_retryable());
    }
}

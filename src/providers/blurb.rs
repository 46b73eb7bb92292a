// src/providers/blurb.rs
//! 摘要文案源：调用chat completions端点生成一句页脚短语。
//!
//! 按刷新间隔缓存，失败时沿用上一条，不重复轰炸端点。

use std::time::Duration;

use jiff::civil::DateTime;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::common::clock::add_minutes;
use crate::common::config::BlurbConfig;
use crate::common::error::{AppError, Result};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

pub struct BlurbService {
    http: reqwest::Client,
    cfg: BlurbConfig,
    cache: Option<String>,
    next_fetch: Option<DateTime>,
}

impl BlurbService {
    pub fn new(cfg: BlurbConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| AppError::ProviderFetch(format!("blurb client: {e}")))?;
        Ok(Self {
            http,
            cfg,
            cache: None,
            next_fetch: None,
        })
    }

    /// Current blurb, refreshed on its own cadence.
    pub async fn current(&mut self, now: DateTime) -> Option<String> {
        let due = match self.next_fetch {
            None => true,
            Some(at) => now >= at,
        };
        if due {
            // Failed fetches also wait a full interval before retrying.
            self.next_fetch = Some(add_minutes(now, self.cfg.refresh_mins));
            match self.try_fetch().await {
                Ok(text) => {
                    info!("blurb refreshed: {text}");
                    self.cache = Some(text);
                }
                Err(e) => warn!("blurb fetch failed, keeping previous: {e}"),
            }
        }
        self.cache.clone()
    }

    async fn try_fetch(&self) -> Result<String> {
        let req = ChatRequest {
            model: &self.cfg.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &self.cfg.prompt,
            }],
            max_tokens: 120,
            temperature: 0.3,
        };
        let resp: ChatResponse = self
            .http
            .post(&self.cfg.url)
            .bearer_auth(&self.cfg.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| AppError::ProviderFetch(format!("blurb request: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::ProviderFetch(format!("blurb status: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::ProviderFetch(format!("blurb body: {e}")))?;

        let text = resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        let text = normalize(&text);
        if text.is_empty() {
            return Err(AppError::ProviderFetch("blurb response was empty".into()));
        }
        Ok(text)
    }
}

/// Single line, bounded length.
fn normalize(text: &str) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    line.chars().take(120).collect()
}

// src/common/config.rs
//! 静态配置：版式常量之外的所有可调参数都来自这里。
//!
//! 单个JSON文档描述调度节奏、显示设备、数据源与上传目标，
//! 守护进程启动时读取一次，之后不再变更。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::error::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub upload: Option<UploadConfig>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub tags: BTreeMap<String, TagConfig>,
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateConfig>,
    pub routines: RoutinesConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("cannot parse {}: {e}", path.display())))
    }
}

/// 调度节奏。按部署场景可调的参数全部落在这里。
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Two updates are never performed closer together than this.
    pub min_update_interval_mins: i64,
    /// Gap-filling cadence between task boundaries.
    pub periodic_interval_mins: i64,
    /// Hour at which the visible timeline panel pair shifts.
    pub panel_shift_hour: i8,
    /// Nightly window in which the panel is left alone. Uploads continue.
    pub silent_start_hour: i8,
    pub silent_end_hour: i8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_update_interval_mins: 3,
            periodic_interval_mins: 30,
            panel_shift_hour: 12,
            silent_start_hour: 1,
            silent_end_hour: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Minimum spacing between two hardware refreshes, for panel health.
    pub min_refresh_secs: i64,
    /// Where the preview panel writes its frame.
    pub preview_path: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            min_refresh_secs: 60,
            preview_path: PathBuf::from("output/schedule_preview.png"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    pub server_url: String,
    pub api_key: String,
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base")]
    pub backoff_base_secs: u64,
    /// Uploads keep their own cadence, decoupled from panel refreshes.
    #[serde(default)]
    pub min_upload_interval_secs: i64,
}

fn default_upload_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    2
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvidersConfig {
    pub calendar: Option<CalendarConfig>,
    pub blurb: Option<BlurbConfig>,
}

/// 日历源：返回JSON事件列表的任意HTTP端点。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarConfig {
    pub url: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

/// 摘要文案源：OpenAI风格的chat completions端点。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlurbConfig {
    pub url: String,
    pub api_key: String,
    pub model: String,
    pub prompt: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_blurb_refresh")]
    pub refresh_mins: i64,
}

fn default_provider_timeout() -> u64 {
    15
}

fn default_blurb_refresh() -> i64 {
    360
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagConfig {
    #[serde(default)]
    pub text_color: Option<[u8; 3]>,
    #[serde(default)]
    pub border_color: Option<[u8; 3]>,
    #[serde(default)]
    pub fill_color: Option<[u8; 3]>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    pub title: String,
    pub duration_minutes: i64,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub text_color: Option<[u8; 3]>,
    #[serde(default)]
    pub border_color: Option<[u8; 3]>,
    #[serde(default)]
    pub fill_color: Option<[u8; 3]>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutinesConfig {
    /// Fallback timetable used on dates without an override.
    pub default: RoutineConfig,
    /// Date-keyed overrides, "MMDD" form.
    #[serde(default)]
    pub by_date: BTreeMap<String, RoutineConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutineConfig {
    pub name: String,
    /// Compact plan syntax: "6:50 standup --7:10, 8:00 focus, 17:40 dine".
    pub plan: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{ "routines": { "default": { "name": "Workday", "plan": "8:00 focus" } } }"#,
        )
        .unwrap();
        assert_eq!(cfg.scheduler.min_update_interval_mins, 3);
        assert_eq!(cfg.scheduler.periodic_interval_mins, 30);
        assert_eq!(cfg.display.min_refresh_secs, 60);
        assert!(cfg.upload.is_none());
        assert!(cfg.providers.calendar.is_none());
        assert_eq!(cfg.routines.default.name, "Workday");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let out = serde_json::from_str::<AppConfig>(
            r#"{ "routines": { "default": { "name": "W", "plan": "" } }, "typo": 1 }"#,
        );
        assert!(out.is_err());
    }
}

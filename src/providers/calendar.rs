// src/providers/calendar.rs
//! 日历源：从HTTP端点拉取JSON事件列表并转换成当日任务。
//!
//! 拉取失败时退回上一次成功的快照，网络抖动不影响出帧。

use std::time::Duration;

use jiff::civil::{Date, DateTime};
use log::{debug, warn};
use serde::Deserialize;

use crate::common::config::CalendarConfig;
use crate::common::error::{AppError, Result};
use crate::render::style;
use crate::schedule::task::{Task, TaskSource};

#[derive(Debug, Deserialize)]
struct EventDto {
    title: String,
    /// ISO civil datetime, e.g. "2026-08-05T14:00:00".
    start: String,
    #[serde(default)]
    end: Option<String>,
}

pub struct CalendarService {
    http: reqwest::Client,
    cfg: CalendarConfig,
    last_good: Vec<Task>,
}

impl CalendarService {
    pub fn new(cfg: CalendarConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| AppError::ProviderFetch(format!("calendar client: {e}")))?;
        Ok(Self {
            http,
            cfg,
            last_good: Vec::new(),
        })
    }

    /// Today's calendar tasks, cached copy on fetch failure.
    pub async fn fetch_for_date(&mut self, date: Date) -> Vec<Task> {
        match self.try_fetch(date).await {
            Ok(tasks) => {
                debug!("calendar: {} event(s) for {date}", tasks.len());
                self.last_good = tasks.clone();
                tasks
            }
            Err(e) => {
                warn!("calendar fetch failed, serving cached events: {e}");
                self.last_good
                    .iter()
                    .filter(|t| t.start.date() == date)
                    .cloned()
                    .collect()
            }
        }
    }

    async fn try_fetch(&self, date: Date) -> Result<Vec<Task>> {
        let events: Vec<EventDto> = self
            .http
            .get(&self.cfg.url)
            .send()
            .await
            .map_err(|e| AppError::ProviderFetch(format!("calendar request: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::ProviderFetch(format!("calendar status: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::ProviderFetch(format!("calendar body: {e}")))?;

        Ok(convert_events(events, date))
    }
}

fn convert_events(events: Vec<EventDto>, date: Date) -> Vec<Task> {
    let mut out = Vec::new();
    for ev in events {
        let Ok(start) = ev.start.parse::<DateTime>() else {
            warn!("calendar event '{}' has a bad start time", ev.title);
            continue;
        };
        if start.date() != date {
            continue;
        }
        let duration_minutes = match &ev.end {
            Some(end) => match end.parse::<DateTime>() {
                Ok(end) if end > start => start.duration_until(end).as_secs() / 60,
                _ => {
                    warn!("calendar event '{}' has a bad end time", ev.title);
                    60
                }
            },
            None => 60,
        };
        out.push(Task {
            title: ev.title,
            start,
            duration_minutes,
            text_color: style::BLACK,
            border_color: style::calendar_border(),
            fill_color: style::calendar_fill(),
            source: TaskSource::Calendar,
        });
    }
    out.sort_by_key(|t| t.start);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn dto(title: &str, start: &str, end: Option<&str>) -> EventDto {
        EventDto {
            title: title.to_string(),
            start: start.to_string(),
            end: end.map(|s| s.to_string()),
        }
    }

    #[test]
    fn events_convert_with_durations() {
        let events = vec![
            dto("review", "2026-08-05T14:00:00", Some("2026-08-05T15:30:00")),
            dto("call", "2026-08-05T16:00:00", None),
        ];
        let tasks = convert_events(events, date(2026, 8, 5));
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].duration_minutes, 90);
        assert_eq!(tasks[1].duration_minutes, 60);
        assert_eq!(tasks[0].source, TaskSource::Calendar);
    }

    #[test]
    fn other_days_and_bad_times_are_dropped() {
        let events = vec![
            dto("tomorrow", "2026-08-06T09:00:00", None),
            dto("garbled", "not a time", None),
            dto("today", "2026-08-05T09:00:00", None),
        ];
        let tasks = convert_events(events, date(2026, 8, 5));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "today");
    }

    #[test]
    fn end_before_start_falls_back_to_an_hour() {
        let events = vec![dto(
            "weird",
            "2026-08-05T14:00:00",
            Some("2026-08-05T13:00:00"),
        )];
        let tasks = convert_events(events, date(2026, 8, 5));
        assert_eq!(tasks[0].duration_minutes, 60);
    }
}

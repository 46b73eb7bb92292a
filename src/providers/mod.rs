// src/providers/mod.rs

/// 数据源
///
/// 每个数据源只暴露"取当前值"一个操作，失败时退回缓存或默认值，
/// 渲染永远拿得到一份快照。
pub mod blurb;
pub mod calendar;
pub mod lunar;

use jiff::civil::DateTime;
use log::warn;

use crate::common::config::ProvidersConfig;
use crate::common::error::Result;
use crate::schedule::task::Task;

pub use blurb::BlurbService;
pub use calendar::CalendarService;
pub use lunar::LunarDate;

/// Provider values captured for one render cycle.
#[derive(Debug, Clone, Default)]
pub struct ProviderSnapshot {
    pub lunar: Option<LunarDate>,
    pub calendar: Vec<Task>,
    pub blurb: Option<String>,
}

/// All configured providers behind one snapshot call.
pub struct ProviderSet {
    calendar: Option<CalendarService>,
    blurb: Option<BlurbService>,
}

impl ProviderSet {
    pub fn from_config(cfg: &ProvidersConfig) -> Result<Self> {
        let calendar = match &cfg.calendar {
            Some(c) => Some(CalendarService::new(c.clone())?),
            None => None,
        };
        let blurb = match &cfg.blurb {
            Some(c) => Some(BlurbService::new(c.clone())?),
            None => None,
        };
        Ok(Self { calendar, blurb })
    }

    /// Never fails; every section degrades independently.
    pub async fn snapshot(&mut self, now: DateTime) -> ProviderSnapshot {
        let calendar = match &mut self.calendar {
            Some(svc) => svc.fetch_for_date(now.date()).await,
            None => Vec::new(),
        };
        let blurb = match &mut self.blurb {
            Some(svc) => svc.current(now).await,
            None => None,
        };
        if calendar.is_empty() && self.calendar.is_some() {
            warn!("calendar snapshot is empty");
        }
        ProviderSnapshot {
            lunar: Some(lunar::convert(now.date())),
            calendar,
            blurb,
        }
    }
}

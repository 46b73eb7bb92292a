// src/display/mod.rs

/// 显示适配器
///
/// Panel抽象物理设备；DisplayService在其上强制最小硬件刷新间隔，
/// 过早到达的刷新请求被推迟合并，不会丢弃。
pub mod preview;

use jiff::civil::DateTime;
use log::{debug, info};

use crate::common::clock::add_seconds;
use crate::common::error::Result;
use crate::render::frame::Frame;

pub use preview::PreviewPanel;

/// A device that can take a finished frame and physically refresh.
pub trait Panel {
    fn show(&mut self, frame: &Frame) -> Result<()>;
}

/// Outcome of a show request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    Refreshed,
    /// Too soon after the previous refresh, retry at the given time.
    Deferred(DateTime),
}

pub struct DisplayService {
    panel: Box<dyn Panel>,
    min_refresh_secs: i64,
    last_refresh: Option<DateTime>,
}

impl DisplayService {
    pub fn new(panel: Box<dyn Panel>, min_refresh_secs: i64) -> Self {
        Self {
            panel,
            min_refresh_secs,
            last_refresh: None,
        }
    }

    /// Write a frame to the panel, honoring the minimum refresh spacing.
    pub fn show(&mut self, frame: &Frame, now: DateTime) -> Result<ShowOutcome> {
        if let Some(last) = self.last_refresh {
            let allowed = add_seconds(last, self.min_refresh_secs);
            if now < allowed {
                debug!("panel refresh deferred until {allowed}");
                return Ok(ShowOutcome::Deferred(allowed));
            }
        }
        self.panel.show(frame)?;
        self.last_refresh = Some(now);
        info!("panel refreshed ({})", frame.fingerprint());
        Ok(ShowOutcome::Refreshed)
    }

    pub fn last_refresh(&self) -> Option<DateTime> {
        self.last_refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::frame::FrameBuffer;
    use jiff::civil::date;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingPanel {
        refreshes: Rc<Cell<u32>>,
    }

    impl Panel for CountingPanel {
        fn show(&mut self, _frame: &Frame) -> Result<()> {
            self.refreshes.set(self.refreshes.get() + 1);
            Ok(())
        }
    }

    fn service(min_secs: i64) -> (DisplayService, Rc<Cell<u32>>) {
        let refreshes = Rc::new(Cell::new(0));
        let panel = CountingPanel {
            refreshes: refreshes.clone(),
        };
        (DisplayService::new(Box::new(panel), min_secs), refreshes)
    }

    #[test]
    fn refreshes_within_min_interval_are_deferred() {
        let (mut svc, refreshes) = service(180);
        let frame = Frame::new(FrameBuffer::new());
        let d = date(2026, 8, 5);

        let first = svc.show(&frame, d.at(9, 0, 0, 0)).unwrap();
        assert_eq!(first, ShowOutcome::Refreshed);

        let second = svc.show(&frame, d.at(9, 1, 0, 0)).unwrap();
        assert_eq!(second, ShowOutcome::Deferred(d.at(9, 3, 0, 0)));
        assert_eq!(refreshes.get(), 1);

        let third = svc.show(&frame, d.at(9, 3, 0, 0)).unwrap();
        assert_eq!(third, ShowOutcome::Refreshed);
        assert_eq!(refreshes.get(), 2);
    }

    #[test]
    fn deferral_points_exactly_at_the_allowed_time() {
        let (mut svc, _) = service(60);
        let frame = Frame::new(FrameBuffer::new());
        let d = date(2026, 8, 5);
        svc.show(&frame, d.at(12, 0, 0, 0)).unwrap();
        match svc.show(&frame, d.at(12, 0, 30, 0)).unwrap() {
            ShowOutcome::Deferred(at) => assert_eq!(at, d.at(12, 1, 0, 0)),
            other => panic!("expected deferral, got {other:?}"),
        }
    }
}

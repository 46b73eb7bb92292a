// src/scheduler/mod.rs

/// 调度器
///
/// 长驻守护循环：到点构建渲染上下文，出帧、比对指纹、写面板、上传，
/// 任何一步失败都只影响本周期。
pub mod queue;

use jiff::civil::DateTime;
use log::{debug, info, warn};

use crate::common::clock::{add_minutes, fmt_hms, now_local, seconds_until};
use crate::common::config::AppConfig;
use crate::common::error::Result;
use crate::display::{DisplayService, ShowOutcome};
use crate::providers::ProviderSet;
use crate::render::frame::Fingerprint;
use crate::render::{RenderContext, Renderer};
use crate::schedule::routine::RoutineSet;
use crate::schedule::task::DayPlan;
use crate::schedule::templates::TemplateRegistry;
use crate::upload::UploadClient;

pub use queue::{Trigger, UpdateQueue};

/// Where the loop currently is. Purely observational, one cycle runs each
/// stage to completion in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    Idle,
    Rendering,
    Displaying,
    Uploading,
    Sleeping,
}

pub struct Daemon {
    cfg: AppConfig,
    registry: TemplateRegistry,
    routines: RoutineSet,
    providers: ProviderSet,
    renderer: Renderer,
    display: DisplayService,
    uploader: Option<UploadClient>,
    state: DaemonState,
    queue: UpdateQueue,
    plan: DayPlan,
    routine_name: String,
    last_update: Option<DateTime>,
    last_displayed: Option<Fingerprint>,
    last_upload: Option<DateTime>,
    status_line: String,
}

impl Daemon {
    pub fn new(
        cfg: AppConfig,
        display: DisplayService,
        uploader: Option<UploadClient>,
        providers: ProviderSet,
    ) -> Result<Self> {
        let registry = TemplateRegistry::from_config(&cfg.templates, &cfg.tags)?;
        let routines = RoutineSet::from_config(&cfg.routines, &registry)?;
        let now = now_local();
        let spec = routines.for_date(now.date());
        let plan = spec.resolve(now.date(), &registry);
        let routine_name = spec.name.clone();
        Ok(Self {
            cfg,
            registry,
            routines,
            providers,
            renderer: Renderer::new(),
            display,
            uploader,
            state: DaemonState::Idle,
            queue: UpdateQueue::new(),
            plan,
            routine_name,
            last_update: None,
            last_displayed: None,
            last_upload: None,
            status_line: String::new(),
        })
    }

    fn set_state(&mut self, state: DaemonState) {
        if self.state != state {
            debug!("state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Resolve today's routine and precompute the day's update queue.
    fn start_day(&mut self, now: DateTime) {
        let spec = self.routines.for_date(now.date());
        self.routine_name = spec.name.clone();
        self.plan = spec.resolve(now.date(), &self.registry);
        self.queue = UpdateQueue::build_for_day(
            &self.plan,
            now,
            self.cfg.scheduler.periodic_interval_mins,
            self.cfg.scheduler.panel_shift_hour,
        );
        info!(
            "routine '{}' for {}: {} task(s), {} queued update(s)",
            self.routine_name,
            now.date(),
            self.plan.tasks().len(),
            self.queue.len(),
        );
    }

    /// Run forever. Only process shutdown ends the loop.
    pub async fn run(mut self) -> Result<()> {
        let now = now_local();
        info!("schedule daemon started");
        self.start_day(now);
        self.run_cycle(now, Trigger::Periodic).await;

        loop {
            let now = now_local();
            let earliest_allowed = match self.last_update {
                Some(last) => add_minutes(last, self.cfg.scheduler.min_update_interval_mins),
                None => now,
            };

            match self.queue.next_due(now, earliest_allowed) {
                Some((at, trigger)) => {
                    let decoupled = if self.in_silent_hours(at) { " [decoupled]" } else { "" };
                    self.status_line =
                        format!("next update {} ({trigger}){decoupled}", fmt_hms(at));
                    info!("{}", self.status_line);
                    self.sleep_until(at).await;
                    self.run_cycle(now_local(), trigger).await;
                }
                None => {
                    let tomorrow = match now.date().tomorrow() {
                        Ok(d) => d.at(0, 1, 0, 0),
                        Err(e) => {
                            warn!("no tomorrow ({e}), holding for an hour");
                            add_minutes(now, 60)
                        }
                    };
                    self.status_line =
                        format!("no more updates today, resuming {}", fmt_hms(tomorrow));
                    info!("{}", self.status_line);
                    self.sleep_until(tomorrow).await;
                    let now = now_local();
                    self.start_day(now);
                    self.run_cycle(now, Trigger::DayRollover).await;
                }
            }
        }
    }

    async fn sleep_until(&mut self, at: DateTime) {
        self.set_state(DaemonState::Sleeping);
        let secs = seconds_until(now_local(), at).saturating_add(1);
        tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
    }

    /// One full update cycle. Every stage failure is contained here.
    pub(crate) async fn run_cycle(&mut self, now: DateTime, trigger: Trigger) {
        info!("update triggered: {trigger}");
        if now.date() != self.plan.date {
            self.start_day(now);
        }

        self.set_state(DaemonState::Rendering);
        let snapshot = self.providers.snapshot(now).await;
        let ctx = RenderContext {
            now,
            plan: self.plan.clone(),
            routine_name: self.routine_name.clone(),
            snapshot,
        };
        let frame = self.renderer.render(&ctx);

        self.set_state(DaemonState::Displaying);
        if self.last_displayed == Some(frame.fingerprint()) {
            info!("frame unchanged ({}), skipping panel write", frame.fingerprint());
        } else if self.in_silent_hours(now) {
            info!("silent hours, leaving the panel alone");
        } else {
            match self.display.show(&frame, now) {
                Ok(ShowOutcome::Refreshed) => {
                    self.last_displayed = Some(frame.fingerprint());
                }
                Ok(ShowOutcome::Deferred(at)) => {
                    info!("panel refresh coalesced to {}", fmt_hms(at));
                    self.queue.push(at, Trigger::Periodic);
                }
                Err(e) => warn!("display write failed, retrying next cycle: {e}"),
            }
        }

        self.set_state(DaemonState::Uploading);
        if self.upload_due(now) {
            // Uploads stay decoupled from the panel state on purpose.
            if let Some(uploader) = &self.uploader {
                match frame.encode_png() {
                    Ok(png) => match uploader.upload(png, &self.status_line).await {
                        Ok(()) => self.last_upload = Some(now),
                        Err(e) => warn!("upload failed: {e}"),
                    },
                    Err(e) => warn!("png encode failed: {e}"),
                }
            }
        }

        self.last_update = Some(now);
        self.set_state(DaemonState::Idle);
    }

    fn upload_due(&self, now: DateTime) -> bool {
        if self.uploader.is_none() {
            return false;
        }
        let min_interval = self
            .cfg
            .upload
            .as_ref()
            .map(|u| u.min_upload_interval_secs)
            .unwrap_or(0);
        match self.last_upload {
            None => true,
            Some(last) => seconds_until(last, now) as i64 >= min_interval,
        }
    }

    fn in_silent_hours(&self, at: DateTime) -> bool {
        in_silent_hours(
            at.hour(),
            self.cfg.scheduler.silent_start_hour,
            self.cfg.scheduler.silent_end_hour,
        )
    }

    pub fn state(&self) -> DaemonState {
        self.state
    }
}

/// Nightly quiet window, possibly wrapping midnight.
fn in_silent_hours(hour: i8, start: i8, end: i8) -> bool {
    if start < end {
        (start..end).contains(&hour)
    } else {
        hour >= start || hour < end
    }
}

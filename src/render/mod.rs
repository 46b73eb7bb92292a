// src/render/mod.rs

/// 渲染器
///
/// 输入一个RenderContext，输出一帧完整的位图。无状态，
/// 同样的上下文总是得到同样的像素。
pub mod frame;
pub mod style;
pub mod text;
pub mod timeline;

use core::convert::Infallible;

use embedded_graphics::geometry::Point;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use jiff::civil::DateTime;

use crate::common::clock::fmt_hm;
use crate::providers::ProviderSnapshot;
use crate::render::frame::{Frame, FrameBuffer};
use crate::render::style::{StyleId, coords};
use crate::render::text::{draw_styled, text_width, truncate_to_width};
use crate::render::timeline::TimelinePanel;
use crate::schedule::task::DayPlan;

pub use frame::Fingerprint;

/// Letter drawn in the corner to tell layout generations apart on the panel.
const LAYOUT_IDENT: &str = "R";

/// Everything one render cycle needs, captured up front.
pub struct RenderContext {
    pub now: DateTime,
    pub plan: DayPlan,
    pub routine_name: String,
    pub snapshot: ProviderSnapshot,
}

/// Which 6-hour windows the two panels show for a given time. The night
/// panel (0-6) is skipped in favor of the working day unless the day is
/// almost over.
pub fn panel_ranges(now: DateTime) -> ((i32, i32), (i32, i32)) {
    const PANEL_HOURS: i32 = 6;
    const PANELS_PER_DAY: i32 = 4;

    let current = now.hour() as i32 / PANEL_HOURS;
    let (left, right) = if current == 0 {
        (1, 2)
    } else if current >= PANELS_PER_DAY - 1 {
        (PANELS_PER_DAY - 2, PANELS_PER_DAY - 1)
    } else {
        (current, current + 1)
    };
    (
        (left * PANEL_HOURS, (left + 1) * PANEL_HOURS),
        (right * PANEL_HOURS, (right + 1) * PANEL_HOURS),
    )
}

#[derive(Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, ctx: &RenderContext) -> Frame {
        let mut fb = FrameBuffer::new();
        match self.paint(&mut fb, ctx) {
            Ok(()) => {}
            Err(e) => match e {},
        }
        Frame::new(fb)
    }

    fn paint(&self, fb: &mut FrameBuffer, ctx: &RenderContext) -> Result<(), Infallible> {
        // Calendar events render alongside the routine.
        let mut plan = ctx.plan.clone();
        plan.merge_calendar(ctx.snapshot.calendar.clone());

        self.draw_header(fb, ctx, &plan)?;
        self.draw_task_now(fb, ctx, &plan)?;

        let (rng_left, rng_right) = panel_ranges(ctx.now);
        let tasks: Vec<_> = plan.tasks().iter().collect();
        TimelinePanel::new(style::TIMELINE_LEFT, rng_left).draw(fb, &tasks, ctx.now)?;
        TimelinePanel::new(style::TIMELINE_RIGHT, rng_right).draw(fb, &tasks, ctx.now)?;

        self.draw_footer(fb, ctx)?;
        Ok(())
    }

    fn draw_header(
        &self,
        fb: &mut FrameBuffer,
        ctx: &RenderContext,
        plan: &DayPlan,
    ) -> Result<(), Infallible> {
        draw_styled(
            fb,
            &format!("updated {}", fmt_hm(ctx.now)),
            coords::UPDATED_TIME,
            StyleId::UpdatedTime,
        )?;
        draw_styled(fb, LAYOUT_IDENT, coords::VER_IDENT, StyleId::VerIdent)?;
        draw_styled(fb, &ctx.routine_name, coords::ROUTINE_IDENT, StyleId::UpdatedTime)?;

        for (top, bottom) in [
            (coords::DIVIDER_1_TOP, coords::DIVIDER_1_BOTTOM),
            (coords::DIVIDER_2_TOP, coords::DIVIDER_2_BOTTOM),
        ] {
            Line::new(top, bottom)
                .into_styled(PrimitiveStyle::with_stroke(style::divider_line(), 2))
                .draw(fb)?;
        }

        // Next task block.
        let next = plan.next_task(ctx.now);
        draw_styled(fb, "next", coords::HINT_NEXT, StyleId::HintNext)?;
        let next_time = next.map(|t| fmt_hm(t.start)).unwrap_or_else(|| "--".into());
        draw_styled(fb, &next_time, coords::TIME_NEXT, StyleId::TimeNext)?;
        let next_title = match next {
            Some(t) => {
                let font = style::text_style(StyleId::NextTask).font;
                truncate_to_width(&t.title, 200, font)
            }
            None => "--".into(),
        };
        draw_styled(fb, &next_title, coords::NEXT_TASK, StyleId::NextTask)?;

        // Date block on the right, under a red rule.
        Line::new(coords::LINE_TITLE_LEFT, coords::LINE_TITLE_RIGHT)
            .into_styled(PrimitiveStyle::with_stroke(style::RED, 3))
            .draw(fb)?;
        let date_str = ctx.now.strftime("%a %b %d, %Y").to_string();
        draw_styled(fb, &date_str, coords::DATE, StyleId::Date)?;
        if let Some(lunar) = &ctx.snapshot.lunar {
            draw_styled(fb, &lunar.display_string(), coords::GANZHI, StyleId::Ganzhi)?;
        }
        Ok(())
    }

    fn draw_task_now(
        &self,
        fb: &mut FrameBuffer,
        ctx: &RenderContext,
        plan: &DayPlan,
    ) -> Result<(), Infallible> {
        draw_styled(fb, "Right now..", coords::TASK_NOW_HINT, StyleId::TaskNowHint)?;

        let hour = ctx.now.hour();
        let fallback = if (0..6).contains(&hour) {
            "Sleep time"
        } else {
            "Nothing planned. Go draw?"
        };
        let title = plan
            .current_task(ctx.now)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| fallback.to_string());

        // Smaller face when the caption would not fit the banner.
        let wide = text_width(&title, style::text_style(StyleId::TaskNow).font) > 300;
        let style_id = if wide { StyleId::TaskNowSmall } else { StyleId::TaskNow };
        let width = text_width(&title, style::text_style(style_id).font);

        let anchor = coords::TASK_NOW;
        let banner = Rectangle::with_corners(
            Point::new(anchor.x - width / 2, anchor.y - 23),
            Point::new(anchor.x + width / 2, anchor.y - 3),
        );
        banner
            .into_styled(PrimitiveStyle::with_fill(style::now_banner_fill()))
            .draw(fb)?;
        draw_styled(fb, &title, anchor, style_id)?;
        Ok(())
    }

    fn draw_footer(&self, fb: &mut FrameBuffer, ctx: &RenderContext) -> Result<(), Infallible> {
        if let Some(blurb) = &ctx.snapshot.blurb {
            let font = style::text_style(StyleId::Footer).font;
            let line = truncate_to_width(blurb, 280, font);
            draw_styled(fb, &line, coords::FOOTER, StyleId::Footer)?;
        }
        Ok(())
    }
}

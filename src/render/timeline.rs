// src/render/timeline.rs
//! 垂直时间轴面板：一列6小时，自适应任务布局。
//!
//! 任务矩形按重叠密度分道，高度不足时降级为紧凑模式或单线模式，
//! 当前时刻画红色扫描线。

use core::convert::Infallible;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Circle, Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, RoundedRectangle, Triangle,
};
use jiff::civil::DateTime;

use crate::common::clock::fmt_hm;
use crate::render::style::{self, PanelGeometry, StyleId};
use crate::render::text::{draw_styled_in, line_height, text_width, truncate_to_width, wrap_text};
use crate::schedule::task::Task;

/// Task rect corner radius.
const CORNER_RADIUS: u32 = 4;
/// Below this pixel height a task collapses to a single line.
const LINE_MODE_MAX: i32 = 15;
/// Below this pixel height a task uses the compact layout.
const COMPACT_MODE_MAX: i32 = 40;

pub struct TimelinePanel {
    geom: PanelGeometry,
    hour_start: i32,
    hour_end: i32,
}

struct VisibleTask<'a> {
    task: &'a Task,
    start_min: i32,
    end_min: i32,
    /// Captions only show in the panel where the task starts.
    caption: bool,
}

struct LaneSlot {
    lane: i32,
    local_lanes: i32,
}

fn lerp(a: i32, b: i32, num: i32, den: i32) -> i32 {
    a + (b - a) * num / den
}

impl TimelinePanel {
    pub fn new(geom: PanelGeometry, hour_range: (i32, i32)) -> Self {
        Self {
            geom,
            hour_start: hour_range.0,
            hour_end: hour_range.1,
        }
    }

    pub fn draw<D>(&self, target: &mut D, tasks: &[&Task], now: DateTime) -> Result<(), Infallible>
    where
        D: DrawTarget<Color = Rgb888, Error = Infallible>,
    {
        self.draw_background(target)?;
        self.draw_tasks(target, tasks)?;
        self.draw_now_overlay(target, now)?;
        Ok(())
    }

    fn window_minutes(&self) -> (i32, i32) {
        (self.hour_start * 60, self.hour_end * 60)
    }

    /// Minutes from midnight to a y coordinate on the panel grid.
    fn min_to_y(&self, minute: i32) -> i32 {
        let (ws, we) = self.window_minutes();
        lerp(self.geom.grid_lt.y, self.geom.grid_rb.y, minute - ws, we - ws)
    }

    fn draw_background<D>(&self, target: &mut D) -> Result<(), Infallible>
    where
        D: DrawTarget<Color = Rgb888, Error = Infallible>,
    {
        let g = &self.geom;

        // Quarter-hour grid.
        let splits = (self.hour_end - self.hour_start) * 4;
        for i in 0..=splits {
            let y = lerp(g.grid_lt.y, g.grid_rb.y, i, splits);
            Line::new(Point::new(g.grid_lt.x, y), Point::new(g.grid_rb.x, y))
                .into_styled(PrimitiveStyle::with_stroke(style::grid_line(), 1))
                .draw(target)?;
        }

        // Hour ticks and labels along the axis, bottom edge unlabeled.
        let hours = self.hour_end - self.hour_start;
        for i in 0..hours {
            let y = lerp(g.tick_top.y, g.tick_bottom.y, i, hours);
            Line::new(Point::new(g.tick_bottom.x, y), Point::new(g.tick_top.x, y))
                .into_styled(PrimitiveStyle::with_stroke(style::tick_line(), 2))
                .draw(target)?;
            let label = format!("{}", self.hour_start + i);
            draw_styled_in(
                target,
                &label,
                Point::new(g.tick_top.x - 5, y + 1),
                StyleId::TimeTick,
                style::BLACK,
            )?;
        }

        // The axis itself, with rounded caps.
        rounded_line(target, g.line_top, g.line_bottom, style::axis_line(), 3)?;
        Ok(())
    }

    fn visible_tasks<'a>(&self, tasks: &[&'a Task]) -> Vec<VisibleTask<'a>> {
        let (ws, we) = self.window_minutes();
        let mut out = Vec::new();
        for &task in tasks {
            let start = (task.start.hour() as i32) * 60 + task.start.minute() as i32;
            let end = start + task.duration_minutes as i32;
            if end <= ws || start >= we {
                continue;
            }
            out.push(VisibleTask {
                task,
                start_min: start.max(ws),
                end_min: end.min(we),
                caption: start >= ws,
            });
        }
        out.sort_by_key(|v| v.start_min);
        out
    }

    /// Lane assignment by local overlap density: each task gets the first
    /// free lane among its overlap group, and its width is divided by the
    /// group size.
    fn assign_lanes(&self, visible: &[VisibleTask<'_>]) -> Vec<LaneSlot> {
        let mut slots: Vec<LaneSlot> = Vec::with_capacity(visible.len());
        for (i, v) in visible.iter().enumerate() {
            let overlapping: Vec<usize> = visible
                .iter()
                .enumerate()
                .filter(|(_, o)| !(v.end_min <= o.start_min || v.start_min >= o.end_min))
                .map(|(j, _)| j)
                .collect();

            let mut lane = 0;
            loop {
                let taken = overlapping
                    .iter()
                    .filter(|&&j| j < i)
                    .any(|&j| slots[j].lane == lane);
                if !taken {
                    break;
                }
                lane += 1;
            }

            slots.push(LaneSlot {
                lane,
                local_lanes: overlapping.len().max(1) as i32,
            });
        }
        slots
    }

    fn task_rect(&self, v: &VisibleTask<'_>, slot: &LaneSlot) -> Rectangle {
        let g = &self.geom;
        let lane_width = (g.grid_rb.x - g.grid_lt.x) / slot.local_lanes;
        // Shifted off the axis so rects never touch the time line.
        let x1 = g.grid_lt.x + slot.lane * lane_width + 2 + 5;
        let x2 = g.grid_lt.x + (slot.lane + 1) * lane_width - 4;
        let y1 = self.min_to_y(v.start_min);
        let y2 = self.min_to_y(v.end_min);
        Rectangle::with_corners(Point::new(x1, y1), Point::new(x2.max(x1 + 1), y2.max(y1)))
    }

    fn draw_tasks<D>(&self, target: &mut D, tasks: &[&Task]) -> Result<(), Infallible>
    where
        D: DrawTarget<Color = Rgb888, Error = Infallible>,
    {
        let visible = self.visible_tasks(tasks);
        let slots = self.assign_lanes(&visible);

        for (v, slot) in visible.iter().zip(&slots) {
            let rect = self.task_rect(v, slot);
            let height = rect.size.height as i32;
            if height < LINE_MODE_MAX {
                self.render_line_mode(target, v, &rect)?;
            } else {
                let rr_style = PrimitiveStyleBuilder::new()
                    .fill_color(v.task.fill_color)
                    .stroke_color(v.task.border_color)
                    .stroke_width(2)
                    .build();
                RoundedRectangle::with_equal_corners(
                    rect,
                    Size::new(CORNER_RADIUS, CORNER_RADIUS),
                )
                .into_styled(rr_style)
                .draw(target)?;

                if height < COMPACT_MODE_MAX {
                    self.render_compact_mode(target, v, &rect)?;
                } else {
                    self.render_full_mode(target, v, &rect)?;
                }
            }
        }

        // Start-time spans from the axis across each task.
        for (v, slot) in visible.iter().zip(&slots) {
            if !v.caption {
                continue;
            }
            let rect = self.task_rect(v, slot);
            let y = self.min_to_y(v.start_min);
            let x_end = rect.top_left.x + rect.size.width as i32 - 3;
            Line::new(Point::new(self.geom.line_top.x, y), Point::new(x_end, y))
                .into_styled(PrimitiveStyle::with_stroke(v.task.border_color, 3))
                .draw(target)?;
        }

        // Start-time dots on the axis.
        for v in &visible {
            if !v.caption {
                continue;
            }
            let center = Point::new(self.geom.line_top.x, self.min_to_y(v.start_min));
            Circle::with_center(center, 9)
                .into_styled(PrimitiveStyle::with_fill(style::WHITE))
                .draw(target)?;
            Circle::with_center(center, 7)
                .into_styled(PrimitiveStyle::with_fill(v.task.border_color))
                .draw(target)?;
        }
        Ok(())
    }

    fn render_line_mode<D>(
        &self,
        target: &mut D,
        v: &VisibleTask<'_>,
        rect: &Rectangle,
    ) -> Result<(), Infallible>
    where
        D: DrawTarget<Color = Rgb888, Error = Infallible>,
    {
        let x1 = rect.top_left.x;
        let x2 = x1 + rect.size.width as i32;
        let y = rect.top_left.y;
        Line::new(Point::new(x1 + 4, y), Point::new(x2 - 4, y))
            .into_styled(PrimitiveStyle::with_stroke(v.task.border_color, 3))
            .draw(target)?;

        if v.caption {
            let font = style::text_style(StyleId::TaskLine).font;
            let title = truncate_to_width(&v.task.title, (x2 - x1 - 16).max(6), font);
            let center_y = y + rect.size.height as i32 / 2;
            draw_styled_in(
                target,
                &title,
                Point::new(x1 + 8, center_y),
                StyleId::TaskLine,
                v.task.text_color,
            )?;
        }
        Ok(())
    }

    fn render_compact_mode<D>(
        &self,
        target: &mut D,
        v: &VisibleTask<'_>,
        rect: &Rectangle,
    ) -> Result<(), Infallible>
    where
        D: DrawTarget<Color = Rgb888, Error = Infallible>,
    {
        if !v.caption {
            return Ok(());
        }
        let font = style::text_style(StyleId::TaskSmall).font;
        let center_x = rect.top_left.x + rect.size.width as i32 / 2;
        let title = truncate_to_width(&v.task.title, rect.size.width as i32 - 8, font);
        draw_styled_in(
            target,
            &title,
            Point::new(center_x, rect.top_left.y + 2),
            StyleId::TaskSmall,
            v.task.text_color,
        )?;
        if rect.size.height as i32 > 20 {
            draw_styled_in(
                target,
                &fmt_hm(v.task.start),
                Point::new(center_x, rect.top_left.y + rect.size.height as i32 - 12),
                StyleId::TaskSmall,
                v.task.text_color,
            )?;
        }
        Ok(())
    }

    fn render_full_mode<D>(
        &self,
        target: &mut D,
        v: &VisibleTask<'_>,
        rect: &Rectangle,
    ) -> Result<(), Infallible>
    where
        D: DrawTarget<Color = Rgb888, Error = Infallible>,
    {
        if !v.caption {
            return Ok(());
        }
        let font = style::text_style(StyleId::Task).font;
        let lh = line_height(font);
        let width = rect.size.width as i32;
        let height = rect.size.height as i32;

        let mut lines = wrap_text(&v.task.title, width - 8, font, 2);

        // Title first, then the time range if a line still fits.
        let time_both = format!("{}-{}", fmt_hm(v.task.start), fmt_hm(v.task.end()));
        let remaining = height - (lines.len() as i32) * lh - 8;
        if remaining >= lh {
            if text_width(&time_both, font) <= width - 8 {
                lines.push(time_both);
            } else {
                lines.push(fmt_hm(v.task.start));
            }
        }

        let total = (lines.len() as i32) * lh;
        let center_x = rect.top_left.x + width / 2;
        let mut y = rect.top_left.y + (height - total) / 2;
        for line in &lines {
            draw_styled_in(target, line, Point::new(center_x, y), StyleId::Task, v.task.text_color)?;
            y += lh;
        }
        Ok(())
    }

    fn draw_now_overlay<D>(&self, target: &mut D, now: DateTime) -> Result<(), Infallible>
    where
        D: DrawTarget<Color = Rgb888, Error = Infallible>,
    {
        let minute = (now.hour() as i32) * 60 + now.minute() as i32;
        let (ws, we) = self.window_minutes();
        if minute < ws || minute > we {
            return Ok(());
        }

        let y = self.min_to_y(minute);
        let axis_x = self.geom.line_top.x;

        // Downward triangle marker on the axis, white outline under it.
        let size = 6;
        let outer = size + 1;
        Triangle::new(
            Point::new(axis_x, y + (outer * 173) / 100),
            Point::new(axis_x - outer, y - 1),
            Point::new(axis_x + outer, y - 1),
        )
        .into_styled(PrimitiveStyle::with_fill(style::WHITE))
        .draw(target)?;
        Triangle::new(
            Point::new(axis_x, y + (size * 173) / 100),
            Point::new(axis_x - size, y),
            Point::new(axis_x + size, y),
        )
        .into_styled(PrimitiveStyle::with_fill(style::RED))
        .draw(target)?;

        Line::new(Point::new(axis_x, y), Point::new(self.geom.grid_rb.x, y))
            .into_styled(PrimitiveStyle::with_stroke(style::RED, 2))
            .draw(target)?;
        Ok(())
    }
}

/// Line with round end caps.
fn rounded_line<D>(
    target: &mut D,
    start: Point,
    end: Point,
    color: Rgb888,
    width: u32,
) -> Result<(), Infallible>
where
    D: DrawTarget<Color = Rgb888, Error = Infallible>,
{
    Line::new(start, end)
        .into_styled(PrimitiveStyle::with_stroke(color, width))
        .draw(target)?;
    for p in [start, end] {
        Circle::with_center(p, width + 1)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(target)?;
    }
    Ok(())
}

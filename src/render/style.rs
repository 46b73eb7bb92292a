// src/render/style.rs
//! 版式常量：颜色、字体、锚点与布局坐标。
//!
//! 所有坐标针对800x480的面板，锚点语义与文本样式一起定义，
//! 渲染代码只引用命名样式，不出现裸数字字体。

use embedded_graphics::geometry::Point;
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::ascii::{
    FONT_5X8, FONT_6X10, FONT_6X13, FONT_9X15_BOLD, FONT_10X20,
};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 480;

/// Panel palette. RED matches the muted red the panel actually shows.
pub const WHITE: Rgb888 = Rgb888::new(255, 255, 255);
pub const BLACK: Rgb888 = Rgb888::new(0, 0, 0);
pub const RED: Rgb888 = Rgb888::new(196, 85, 49);
pub const YELLOW: Rgb888 = Rgb888::new(255, 255, 0);
pub const GREEN: Rgb888 = Rgb888::new(0, 255, 0);
pub const BLUE: Rgb888 = Rgb888::new(0, 0, 255);

/// Weighted mix of palette colors, weights need not be normalized.
pub fn mix_colors(weights: &[(Rgb888, u32)]) -> Rgb888 {
    let total: u32 = weights.iter().map(|(_, w)| *w).sum();
    if total == 0 {
        return BLACK;
    }
    let mut acc = [0u32; 3];
    for (c, w) in weights {
        acc[0] += c.r() as u32 * w;
        acc[1] += c.g() as u32 * w;
        acc[2] += c.b() as u32 * w;
    }
    Rgb888::new(
        (acc[0] / total) as u8,
        (acc[1] / total) as u8,
        (acc[2] / total) as u8,
    )
}

pub fn grid_line() -> Rgb888 {
    mix_colors(&[(WHITE, 18), (BLACK, 5)])
}

pub fn axis_line() -> Rgb888 {
    mix_colors(&[(WHITE, 1), (BLACK, 1)])
}

pub fn tick_line() -> Rgb888 {
    mix_colors(&[(WHITE, 4), (BLACK, 5)])
}

pub fn divider_line() -> Rgb888 {
    mix_colors(&[(BLACK, 5), (WHITE, 8)])
}

pub fn task_border() -> Rgb888 {
    mix_colors(&[(RED, 5), (WHITE, 18)])
}

pub fn task_default_fill() -> Rgb888 {
    mix_colors(&[(BLUE, 3), (GREEN, 3), (WHITE, 20)])
}

pub fn calendar_fill() -> Rgb888 {
    mix_colors(&[(BLUE, 3), (GREEN, 3), (WHITE, 20)])
}

pub fn calendar_border() -> Rgb888 {
    mix_colors(&[(BLUE, 3), (GREEN, 3), (WHITE, 10)])
}

pub fn now_banner_fill() -> Rgb888 {
    mix_colors(&[(RED, 5), (WHITE, 20)])
}

/// Text anchor, combining horizontal alignment and vertical baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    LeftTop,
    LeftMiddle,
    LeftBottom,
    MiddleTop,
    MiddleMiddle,
    MiddleBottom,
    RightTop,
    RightBottom,
}

#[derive(Clone, Copy)]
pub struct TextStyle {
    pub font: &'static MonoFont<'static>,
    pub color: Rgb888,
    pub anchor: Anchor,
}

/// Named text styles used across the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleId {
    Header,
    UpdatedTime,
    VerIdent,
    HintNext,
    TimeNext,
    NextTask,
    TaskNowHint,
    TaskNow,
    TaskNowSmall,
    Date,
    Ganzhi,
    Task,
    TaskSmall,
    TaskLine,
    TimeTick,
    Footer,
}

pub fn text_style(id: StyleId) -> TextStyle {
    use Anchor::*;
    use StyleId::*;
    match id {
        Header => TextStyle { font: &FONT_10X20, color: BLACK, anchor: LeftTop },
        UpdatedTime => TextStyle { font: &FONT_6X13, color: BLACK, anchor: LeftBottom },
        VerIdent => TextStyle { font: &FONT_6X10, color: BLACK, anchor: LeftBottom },
        HintNext => TextStyle { font: &FONT_6X13, color: BLACK, anchor: LeftBottom },
        TimeNext => TextStyle { font: &FONT_6X13, color: BLACK, anchor: LeftBottom },
        NextTask => TextStyle { font: &FONT_9X15_BOLD, color: BLACK, anchor: MiddleMiddle },
        TaskNowHint => TextStyle { font: &FONT_10X20, color: BLACK, anchor: LeftBottom },
        TaskNow => TextStyle { font: &FONT_10X20, color: RED, anchor: MiddleBottom },
        TaskNowSmall => TextStyle { font: &FONT_9X15_BOLD, color: RED, anchor: MiddleBottom },
        Date => TextStyle { font: &FONT_10X20, color: BLACK, anchor: RightBottom },
        Ganzhi => TextStyle { font: &FONT_6X13, color: BLACK, anchor: RightBottom },
        Task => TextStyle { font: &FONT_6X13, color: BLACK, anchor: MiddleTop },
        TaskSmall => TextStyle { font: &FONT_6X10, color: BLACK, anchor: MiddleTop },
        TaskLine => TextStyle { font: &FONT_6X10, color: BLACK, anchor: LeftMiddle },
        TimeTick => TextStyle { font: &FONT_5X8, color: BLACK, anchor: RightTop },
        Footer => TextStyle { font: &FONT_6X13, color: BLACK, anchor: LeftBottom },
    }
}

/// Header and banner coordinates.
pub mod coords {
    use super::Point;

    pub const UPDATED_TIME: Point = Point::new(36, 27);
    pub const VER_IDENT: Point = Point::new(25, 31);
    pub const ROUTINE_IDENT: Point = Point::new(36, 49);

    pub const HINT_NEXT: Point = Point::new(315, 27);
    pub const TIME_NEXT: Point = Point::new(315, 49);
    pub const NEXT_TASK: Point = Point::new(421, 29);

    pub const TASK_NOW_HINT: Point = Point::new(25, 121);
    pub const TASK_NOW: Point = Point::new(150, 184);

    pub const DATE: Point = Point::new(795, 43);
    pub const GANZHI: Point = Point::new(783, 71);
    pub const LINE_TITLE_LEFT: Point = Point::new(482, 48);
    pub const LINE_TITLE_RIGHT: Point = Point::new(782, 48);

    pub const DIVIDER_1_TOP: Point = Point::new(139, 10);
    pub const DIVIDER_1_BOTTOM: Point = Point::new(139, 52);
    pub const DIVIDER_2_TOP: Point = Point::new(301, 10);
    pub const DIVIDER_2_BOTTOM: Point = Point::new(301, 52);

    pub const FOOTER: Point = Point::new(8, 478);
}

/// Geometry of one vertical timeline panel.
#[derive(Debug, Clone, Copy)]
pub struct PanelGeometry {
    pub line_top: Point,
    pub line_bottom: Point,
    pub grid_lt: Point,
    pub grid_rb: Point,
    pub tick_top: Point,
    pub tick_bottom: Point,
}

pub const TIMELINE_LEFT: PanelGeometry = PanelGeometry {
    line_top: Point::new(315, 86),
    line_bottom: Point::new(315, 468),
    grid_lt: Point::new(315, 92),
    grid_rb: Point::new(538, 464),
    tick_top: Point::new(316, 93),
    tick_bottom: Point::new(312, 465),
};

pub const TIMELINE_RIGHT: PanelGeometry = PanelGeometry {
    line_top: Point::new(558, 86),
    line_bottom: Point::new(558, 468),
    grid_lt: Point::new(558, 92),
    grid_rb: Point::new(782, 464),
    tick_top: Point::new(559, 93),
    tick_bottom: Point::new(555, 465),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_is_weighted_average() {
        let c = mix_colors(&[(WHITE, 1), (BLACK, 1)]);
        assert_eq!(c, Rgb888::new(127, 127, 127));
    }

    #[test]
    fn mix_single_color_is_identity() {
        assert_eq!(mix_colors(&[(RED, 7)]), RED);
    }

    #[test]
    fn mix_empty_does_not_divide_by_zero() {
        assert_eq!(mix_colors(&[]), BLACK);
    }
}

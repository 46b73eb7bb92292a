// src/render/text.rs
//! 文本测量、锚点绘制与折行。

use core::convert::Infallible;

use embedded_graphics::Drawable;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::Point;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::render::style::{Anchor, StyleId, TextStyle, text_style};

/// Pixel width of a string in a monospaced font.
pub fn text_width(s: &str, font: &MonoFont<'_>) -> i32 {
    let n = s.chars().count() as u32;
    if n == 0 {
        return 0;
    }
    (n * (font.character_size.width + font.character_spacing) - font.character_spacing) as i32
}

pub fn line_height(font: &MonoFont<'_>) -> i32 {
    font.character_size.height as i32 + 2
}

fn to_alignment(anchor: Anchor) -> (Alignment, Baseline) {
    match anchor {
        Anchor::LeftTop => (Alignment::Left, Baseline::Top),
        Anchor::LeftMiddle => (Alignment::Left, Baseline::Middle),
        Anchor::LeftBottom => (Alignment::Left, Baseline::Bottom),
        Anchor::MiddleTop => (Alignment::Center, Baseline::Top),
        Anchor::MiddleMiddle => (Alignment::Center, Baseline::Middle),
        Anchor::MiddleBottom => (Alignment::Center, Baseline::Bottom),
        Anchor::RightTop => (Alignment::Right, Baseline::Top),
        Anchor::RightBottom => (Alignment::Right, Baseline::Bottom),
    }
}

/// Draw text in a named style at its anchor point.
pub fn draw_styled<D>(target: &mut D, s: &str, pos: Point, id: StyleId) -> Result<(), Infallible>
where
    D: DrawTarget<Color = Rgb888, Error = Infallible>,
{
    draw_with(target, s, pos, text_style(id))
}

/// Same, with an explicit color override.
pub fn draw_styled_in<D>(
    target: &mut D,
    s: &str,
    pos: Point,
    id: StyleId,
    color: Rgb888,
) -> Result<(), Infallible>
where
    D: DrawTarget<Color = Rgb888, Error = Infallible>,
{
    let mut style = text_style(id);
    style.color = color;
    draw_with(target, s, pos, style)
}

fn draw_with<D>(target: &mut D, s: &str, pos: Point, style: TextStyle) -> Result<(), Infallible>
where
    D: DrawTarget<Color = Rgb888, Error = Infallible>,
{
    let (alignment, baseline) = to_alignment(style.anchor);
    let ts = TextStyleBuilder::new()
        .alignment(alignment)
        .baseline(baseline)
        .build();
    Text::with_text_style(s, pos, MonoTextStyle::new(style.font, style.color), ts)
        .draw(target)?;
    Ok(())
}

/// Word wrap to a pixel width with a line limit. A single word wider than the
/// line is emitted on its own line rather than dropped.
pub fn wrap_text(text: &str, max_width: i32, font: &MonoFont<'_>, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font) <= max_width {
            current = candidate;
        } else {
            if current.is_empty() {
                lines.push(word.to_string());
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
            if lines.len() >= max_lines {
                return lines.into_iter().take(max_lines).collect();
            }
        }
    }
    if !current.is_empty() && lines.len() < max_lines {
        lines.push(current);
    }
    lines.into_iter().take(max_lines).collect()
}

/// Truncate to a pixel width, marking the cut with "..".
pub fn truncate_to_width(text: &str, max_width: i32, font: &MonoFont<'_>) -> String {
    if text_width(text, font) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        let mut candidate = out.clone();
        candidate.push(c);
        candidate.push_str("..");
        if text_width(&candidate, font) > max_width {
            break;
        }
        out.push(c);
    }
    out.push_str("..");
    out
}

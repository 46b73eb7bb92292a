// src/render/frame.rs
//! 帧缓冲区管理（RGB888全彩，离屏合成后量化交给驱动）。

use core::convert::Infallible;
use std::fmt;

use embedded_graphics::Pixel;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use sha2::{Digest, Sha256};

use crate::common::error::{AppError, Result};
use crate::render::style::{HEIGHT, WIDTH};

/// 帧缓冲区
pub struct FrameBuffer {
    data: Vec<u8>,
}

impl FrameBuffer {
    /// 创建新的帧缓冲区（填充白色）
    pub fn new() -> Self {
        Self {
            data: vec![0xff; (WIDTH * HEIGHT * 3) as usize],
        }
    }

    /// 设置指定位置的像素颜色，越界坐标直接忽略
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb888) {
        if x < 0 || y < 0 || x >= WIDTH as i32 || y >= HEIGHT as i32 {
            return;
        }
        let idx = ((y as u32 * WIDTH + x as u32) * 3) as usize;
        self.data[idx] = color.r();
        self.data[idx + 1] = color.g();
        self.data[idx + 2] = color.b();
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }
}

/// 帧内容指纹，用来判断"自上次刷新以来没有变化"。
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self(digest.into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..8] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

/// 渲染完成的一帧：像素加指纹，显示与上传消费后即丢弃。
pub struct Frame {
    buffer: FrameBuffer,
    fingerprint: Fingerprint,
}

impl Frame {
    pub fn new(buffer: FrameBuffer) -> Self {
        let fingerprint = Fingerprint::of(buffer.as_raw());
        Self {
            buffer,
            fingerprint,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    pub fn width(&self) -> u32 {
        WIDTH
    }

    pub fn height(&self) -> u32 {
        HEIGHT
    }

    /// PNG编码，供预览输出与上传使用。
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(self.buffer.as_raw(), WIDTH, HEIGHT, ExtendedColorType::Rgb8)
            .map_err(|e| AppError::Render(format!("png encode: {e}")))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::style;

    #[test]
    fn new_buffer_is_white() {
        let fb = FrameBuffer::new();
        assert!(fb.as_raw().iter().all(|&b| b == 0xff));
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut fb = FrameBuffer::new();
        fb.set_pixel(-1, 0, style::BLACK);
        fb.set_pixel(WIDTH as i32, 0, style::BLACK);
        fb.set_pixel(0, HEIGHT as i32, style::BLACK);
        assert!(fb.as_raw().iter().all(|&b| b == 0xff));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Frame::new(FrameBuffer::new());
        let b = Frame::new(FrameBuffer::new());
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut fb = FrameBuffer::new();
        fb.set_pixel(10, 10, style::RED);
        let c = Frame::new(fb);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn png_encoding_round_trips_dimensions() {
        let frame = Frame::new(FrameBuffer::new());
        let png = frame.encode_png().unwrap();
        // PNG magic
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }
}

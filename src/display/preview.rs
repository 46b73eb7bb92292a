// src/display/preview.rs
//! 预览面板：把帧落成PNG文件，没接硬件时的默认设备。

use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::common::error::{AppError, Result};
use crate::display::Panel;
use crate::render::frame::Frame;

pub struct PreviewPanel {
    path: PathBuf,
}

impl PreviewPanel {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Panel for PreviewPanel {
    fn show(&mut self, frame: &Frame) -> Result<()> {
        let png = frame.encode_png()?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|e| {
                    AppError::DisplayWrite(format!("create {}: {e}", dir.display()))
                })?;
            }
        }
        fs::write(&self.path, &png)
            .map_err(|e| AppError::DisplayWrite(format!("write {}: {e}", self.path.display())))?;
        debug!("preview written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::frame::FrameBuffer;

    #[test]
    fn preview_writes_a_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preview.png");
        let mut panel = PreviewPanel::new(path.clone());
        panel.show(&Frame::new(FrameBuffer::new())).unwrap();
        let data = fs::read(path).unwrap();
        assert_eq!(&data[1..4], b"PNG");
    }
}

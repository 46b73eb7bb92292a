// src/common/error.rs
use thiserror::Error;

/// 系统错误分类
///
/// 除配置错误外，所有错误都按更新周期收敛：记录日志后等待下一次触发。
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("provider fetch failed: {0}")]
    ProviderFetch(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("display write failed: {0}")]
    DisplayWrite(String),

    #[error(transparent)]
    Upload(#[from] crate::upload::UploadError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, AppError>;

//! 守护进程入口：读配置，装配服务，进调度循环。

use std::path::PathBuf;

use anyhow::Context;
use log::info;

use epd_timetable::common::config::AppConfig;
use epd_timetable::display::{DisplayService, PreviewPanel};
use epd_timetable::providers::ProviderSet;
use epd_timetable::scheduler::Daemon;
use epd_timetable::upload::UploadClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("cfg/config.json"));
    info!("loading configuration from {}", config_path.display());
    let cfg = AppConfig::load(&config_path).context("loading configuration")?;

    let panel = PreviewPanel::new(cfg.display.preview_path.clone());
    let display = DisplayService::new(Box::new(panel), cfg.display.min_refresh_secs);

    let uploader = match &cfg.upload {
        Some(upload_cfg) => Some(UploadClient::new(upload_cfg.clone()).context("upload client")?),
        None => None,
    };
    let providers = ProviderSet::from_config(&cfg.providers).context("providers")?;

    let daemon = Daemon::new(cfg, display, uploader, providers).context("daemon setup")?;
    daemon.run().await.context("daemon loop")?;
    Ok(())
}

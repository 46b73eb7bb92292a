//! 上传接收端入口：校验并保存最新一帧。

use std::path::PathBuf;

use anyhow::Context;

use epd_timetable::upload::server::{self, ServerConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("cfg/server_config.json"));
    let cfg = ServerConfig::load(&config_path).context("loading server configuration")?;

    server::run(cfg).await.context("upload server")?;
    Ok(())
}

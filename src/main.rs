use anyhow::Context;
use rask_log_bridge::app::{self, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    app::tracing::init_tracing(config.log_level, config.log_format);

    app::run(config, app::shutdown_signal())
        .await
        .context("rask-log-bridge failed")
}

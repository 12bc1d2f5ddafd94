use anyhow::Context;

use workstream_api::app::build_app;
use workstream_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;
    workstream_observability::init_with(config.log_format);
    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using the development secret");
    }

    let app = build_app(&config).await.context("starting services")?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}

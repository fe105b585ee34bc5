use anyhow::Context;

use staffroom_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    staffroom_observability::init(AppConfig::log_format_from_env());

    let config = AppConfig::from_env();
    let app = staffroom_api::app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, scope = ?config.session_scope, "listening");

    axum::serve(listener, app).await.context("server terminated")?;
    Ok(())
}

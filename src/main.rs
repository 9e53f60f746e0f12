use axum::Router;
use please_do::{
    application::todo_service::TodoServiceImpl,
    config::Config,
    http::routing::{self, analytics, todos},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(storage = ?config.storage, "opening storage");
    let repo = config.storage.open().await?;
    let service = TodoServiceImpl::open(repo).await;
    let state = todos::AppState { service };
    let router: Router = routing::app(todos::router(state.clone()).merge(analytics::router(state)));

    tracing::info!(addr = %config.addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(config.addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}

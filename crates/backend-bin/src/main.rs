use chatroom_backend_lib::{config::Settings, spawn_hub, ws_router};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    let handle = spawn_hub(&settings);
    let app = ws_router::create_router(handle);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    info!("listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Oncoscope Web Server
//!
//! Run with: cargo run -p oncoscope-web

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = oncoscope_web::state::AppConfig::from_env()?;
    let addr = config.bind_addr;
    match &config.backend_url {
        Some(url) => info!(backend = %url, "external prediction backend configured"),
        None => info!("no external backend configured, serving local predictions only"),
    }

    let state = oncoscope_web::state::AppState::new(config)?;
    let app = oncoscope_web::router::build_router(state);

    info!("Server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

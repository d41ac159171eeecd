use backend::config::Config;
use backend::telemetry::init_tracing;
use backend::{app, cors_layer, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let state = match &config.persist_path {
        Some(path) => AppState::with_persistence(path.clone(), config.users_limits).await?,
        None => AppState::from_store(Default::default(), config.users_limits),
    };
    let app = app(state).layer(cors_layer(config.cors_origin.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, persist = ?config.persist_path, "starting server");
    axum::serve(listener, app).await?;
    Ok(())
}

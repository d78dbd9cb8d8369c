use std::sync::Arc;

use reenks::{AppState, auth::AccountStore, config::Config, engine::Engine, seed, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init(config.log_format);

    let accounts = Arc::new(AccountStore::new(config.bcrypt_cost));
    let engine = Arc::new(Engine::new(&config, accounts));
    if config.seed_demo {
        seed::demo(&engine).await?;
    }

    let app = reenks::app(AppState { engine });
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "REENKS listening");
    axum::serve(listener, app).await?;
    Ok(())
}

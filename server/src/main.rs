use std::sync::Arc;

use anyhow::Context;
use todo_core::{InMemoryTodoRepository, PostgresTodoRepository, TodoRepository};
use todo_server::{app, run, shutdown_signal, telemetry, AppState, Config};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    telemetry::init(&config);

    let repository: Arc<dyn TodoRepository> = match &config.database_url {
        Some(url) => {
            let store = PostgresTodoRepository::connect(url)
                .await
                .context("failed to connect to postgres")?;
            store
                .ensure_schema()
                .await
                .context("failed to prepare schema")?;
            tracing::info!("using postgres store");
            Arc::new(store)
        }
        None => {
            tracing::info!("DB_DSN not set, using in-memory store");
            Arc::new(InMemoryTodoRepository::new())
        }
    };

    let state = AppState::new(repository).with_store_timeout(config.store_timeout);
    let router = app(state, &config.allowed_origins);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, env = ?config.environment, "listening");

    run(listener, router, shutdown_signal(), config.shutdown_grace).await?;
    tracing::info!("server stopped");
    Ok(())
}

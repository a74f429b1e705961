use std::sync::Arc;

use configs::{AppConfig, ServerConfig};
use migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::{self, auth};
use service::auth::{repo::seaorm::SeaOrmCredentialStore, repository::CredentialStore, AuthService};

/// Public entry: connect storage, build the app and serve until Ctrl+C
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    if cfg.database.run_migrations {
        migration::Migrator::up(&db, None).await?;
        info!("database migrations applied");
    }

    let store: Arc<dyn CredentialStore> = Arc::new(SeaOrmCredentialStore { db });
    let auth = AuthService::new(store, &cfg.auth)?;
    let app = routes::build_router(auth::ServerState::new(auth));

    let listener = bind(&cfg.server).await?;
    info!(addr = %listener.local_addr()?, host = %cfg.server.host, "auth server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("auth server stopped");
    Ok(())
}

/// Bind `host:port`; a hostname such as `localhost` is resolved first.
async fn bind(server: &ServerConfig) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind((server.host.as_str(), server.port))
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind {}:{}: {e}", server.host, server.port))?;
    Ok(listener)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("received Ctrl+C, draining connections");
    }
}

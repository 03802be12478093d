use anyhow::Context;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

use user_api::{
    build_router,
    infrastructure::{
        config::{load_config, Config},
        logger::Logger,
        store::{MemoryUserStore, UserStore},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let _log_guard = Logger::init(&config.logging).context("failed to initialize logging")?;

    info!(environment = ?config.environment, "starting user api");

    // 先建立存储连接再开始服务，退出时关闭
    let store = open_store(&config).await?;
    let app = build_router(Arc::clone(&store), config.environment);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("🚀 Server running on http://{}", listener.local_addr()?);
    info!("   GET    /api/users      - List users");
    info!("   POST   /api/users      - Create user");
    info!("   GET    /api/users/:id  - Get user");
    info!("   PUT    /api/users/:id  - Update user");
    info!("   DELETE /api/users/:id  - Delete user");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // 无论服务是否出错都要关闭存储
    store.close().await;
    served.context("server error")?;
    info!("server stopped");
    Ok(())
}

#[cfg(feature = "database")]
async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn UserStore>> {
    use user_api::infrastructure::{database::DatabaseManager, store::PgUserStore};

    match config.database.url.as_deref() {
        Some(url) => {
            let manager = DatabaseManager::connect(&config.database, url)
                .await
                .context("failed to connect to database")?;
            info!("database connected");
            Ok(Arc::new(PgUserStore::new(manager.into_pool())))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store");
            Ok(Arc::new(MemoryUserStore::new()))
        }
    }
}

#[cfg(not(feature = "database"))]
async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn UserStore>> {
    if config.database.url.is_some() {
        warn!("built without the `database` feature, ignoring DATABASE_URL");
    }
    Ok(Arc::new(MemoryUserStore::new()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}

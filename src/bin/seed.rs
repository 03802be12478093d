//! 填充示例用户：清空 users 表后写入三条记录

use anyhow::{bail, Context};
use tracing::info;

use user_api::{
    app::users::model::UserFields,
    infrastructure::{
        config::load_config,
        database::DatabaseManager,
        logger::Logger,
        store::{PgUserStore, UserStore},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let _log_guard = Logger::init(&config.logging).context("failed to initialize logging")?;

    let Some(url) = config.database.url.as_deref() else {
        bail!("DATABASE_URL is required for seeding");
    };

    let manager = DatabaseManager::connect(&config.database, url)
        .await
        .context("failed to connect to database")?;
    let store = PgUserStore::new(manager.into_pool());
    info!("database connected for seeding");

    let removed = store.delete_all().await?;
    info!(removed, "existing users cleared");

    let users = [
        UserFields::new("John Doe", "john@example.com", 30),
        UserFields::new("Jane Smith", "jane@example.com", 25),
        UserFields::new("Bob Johnson", "bob@example.com", 35),
    ];
    for fields in users {
        let user = store.create(fields).await?;
        info!(id = %user.id, email = %user.email, "inserted");
    }

    info!("dummy users inserted");
    store.close().await;
    Ok(())
}

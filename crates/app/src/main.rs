use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "quaderno={level},telegram_bot={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    tracing::info!("Connecting database...");
    let database = connect_database(&settings.database).await?;
    let engine = engine::Engine::new(database);

    let bot = telegram_bot::Bot::builder()
        .token(&settings.telegram.token)
        .allowed_users(settings.telegram.allowed_users.clone())
        .engine(engine)
        .grace_seconds(settings.telegram.undo_grace_seconds)
        .build()?;

    bot.run().await;

    Ok(())
}

async fn connect_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match &config.sqlite {
        Some(path) => format!("sqlite:{path}?mode=rwc"),
        None => String::from("sqlite::memory:"),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

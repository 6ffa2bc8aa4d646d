pub mod db_check;
pub mod permissions;
pub mod users;

use sqlx::{postgres::PgPoolOptions, PgPool};

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("no database url: pass --database-url or set {DATABASE_URL_ENV}")]
    MissingDatabaseUrl,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// 命令行参数优先，其次读取环境变量
pub fn database_url(explicit: Option<String>) -> Result<String, CommandError> {
    explicit
        .or_else(|| std::env::var(DATABASE_URL_ENV).ok())
        .filter(|url| !url.trim().is_empty())
        .ok_or(CommandError::MissingDatabaseUrl)
}

pub async fn connect(explicit: Option<String>) -> Result<PgPool, CommandError> {
    let url = database_url(explicit)?;
    tracing::info!("connecting to database");
    Ok(PgPoolOptions::new().max_connections(2).connect(&url).await?)
}

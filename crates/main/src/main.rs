//! 主应用程序入口
//!
//! 加载配置、连接数据库并启动 Axum Web API 服务。

use std::sync::Arc;

use anyhow::Context;
use application::{EventBroadcaster, SystemClock};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, BcryptPasswordHasher, FanoutBroadcaster, LocalEventBroadcaster, PgStorage,
    RedisEventBroadcaster, MIGRATOR,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, Broadcasting, JwtService, Repositories};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("加载配置失败")?;
    tracing::info!(config = %config.sanitized(), "配置已加载");

    let pool = create_pg_pool(&config.database.url, config.database.max_connections)
        .await
        .context("连接数据库失败")?;
    MIGRATOR.run(&pool).await.context("数据库迁移失败")?;
    let storage = PgStorage::new(pool);

    let jwt = JwtService::new(&config.jwt).context("JWT 配置无效")?;
    let broadcasting = broadcasting(&config).await?;
    let state = AppState::new(
        Repositories::postgres(&storage),
        Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost)),
        broadcasting,
        Arc::new(SystemClock),
        jwt,
    );

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法监听 {addr}"))?;
    tracing::info!("StudentLink 服务启动在 http://{addr}");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// 本地推送始终启用；配置了 Redis 时同时发布到 Redis 频道
async fn broadcasting(config: &AppConfig) -> anyhow::Result<Broadcasting> {
    let live_events = LocalEventBroadcaster::new(config.broadcast.capacity);
    let Some(redis_url) = config.broadcast.redis_url.as_deref() else {
        return Ok(Broadcasting::local(live_events));
    };

    let redis = RedisEventBroadcaster::connect(redis_url, config.broadcast.channel_prefix.clone())
        .await
        .context("连接 Redis 失败")?;
    tracing::info!(prefix = %config.broadcast.channel_prefix, "Redis 广播已启用");

    let targets: Vec<Arc<dyn EventBroadcaster>> =
        vec![Arc::new(live_events.clone()), Arc::new(redis)];
    Ok(Broadcasting {
        broadcaster: Arc::new(FanoutBroadcaster::new(targets)),
        live_events,
    })
}

//! 主应用程序入口
//!
//! 组装依赖并启动 Axum Web 服务和后台清理任务。

use std::sync::Arc;
use std::time::Duration;

use application::{
    MessageService, MessageServiceDependencies, ParticipantService,
    ParticipantServiceDependencies, PresenceSweeper, SweeperConfig, SweeperDependencies,
    SystemClock,
};
use config::AppConfig;
use infrastructure::{create_pg_pool, PgMessageRepository, PgParticipantRepository};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env();

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );
    let pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let participants: Arc<dyn domain::ParticipantRepository> =
        Arc::new(PgParticipantRepository::new(pool.clone()));
    let messages: Arc<dyn domain::MessageRepository> =
        Arc::new(PgMessageRepository::new(pool));
    let clock: Arc<dyn application::Clock> = Arc::new(SystemClock);

    let participant_service = Arc::new(ParticipantService::new(
        ParticipantServiceDependencies {
            participants: participants.clone(),
            messages: messages.clone(),
            clock: clock.clone(),
        },
    ));
    let message_service = Arc::new(MessageService::new(MessageServiceDependencies {
        registry: participant_service.clone(),
        messages: messages.clone(),
        clock: clock.clone(),
    }));

    // 后台清理任务，生命周期跟随进程
    let sweeper = PresenceSweeper::new(
        SweeperDependencies {
            participants,
            messages,
            clock,
        },
        SweeperConfig {
            interval: Duration::from_secs(config.sweeper.interval_secs),
            threshold: Duration::from_secs(config.sweeper.threshold_secs),
        },
    );
    sweeper.start().await;

    let state = AppState::new(participant_service, message_service);
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("聊天服务器启动在 http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

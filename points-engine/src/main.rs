use points_engine::core::{BackgroundTasks, Config, TaskKind};
use points_engine::db::DbService;
use points_engine::db::repository::{RewardRepository, SystemConfigRepository};
use points_engine::ledger::{ExpirySweeper, LedgerManager, LedgerStorage};
use points_engine::services::{ConfigService, TracingNotifier, run_rejection_listener};
use points_engine::utils::{logger, time};
use points_engine::print_banner;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    logger::init_logger_with_file(None, config.log_dir.as_deref());

    print_banner();
    tracing::info!(environment = %config.environment, "Points engine starting...");

    std::fs::create_dir_all(&config.work_dir)?;

    // 2. Stores
    let db = DbService::new(&config.catalog_db).await?;
    let storage = LedgerStorage::open(&config.ledger_db)?;

    // 3. Engine wiring
    let config_service = Arc::new(ConfigService::new(
        SystemConfigRepository::new(db.pool.clone()),
        Duration::from_secs(config.config_cache_ttl_secs),
    ));
    let mut manager = LedgerManager::new(storage);
    manager.set_reward_repository(RewardRepository::new(db.pool.clone()));
    manager.set_config_service(config_service.clone());

    // 4. Background tasks
    let mut tasks = BackgroundTasks::new();
    let notifier = Arc::new(TracingNotifier);

    tasks.spawn(
        "rejection_listener",
        TaskKind::Listener,
        run_rejection_listener(
            manager.subscribe(),
            notifier.clone(),
            tasks.shutdown_token(),
        ),
    );

    if config.enable_expiry_sweep {
        let sweeper = ExpirySweeper::new(
            manager.clone(),
            notifier,
            tasks.shutdown_token(),
            config.timezone,
            time::parse_cutoff(&config.sweep_cutoff),
        )
        .with_config(config_service);
        tasks.spawn("expiry_sweeper", TaskKind::Periodic, sweeper.run());
    } else {
        tracing::info!("Expiry sweeper disabled (ENABLE_EXPIRY_SWEEP=false)");
    }

    tracing::info!(
        epoch = %manager.epoch(),
        tasks = tasks.len(),
        "Points engine ready"
    );

    // 5. Run until interrupted
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    tasks.shutdown().await;

    Ok(())
}

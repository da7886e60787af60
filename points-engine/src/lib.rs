//! Points Engine - loyalty backend core for a fuel-pump chain
//!
//! # Architecture overview
//!
//! Library-level component invoked in-process by the platform's HTTP
//! handlers. Core responsibilities:
//!
//! - **Ledger** (`ledger`): credit/debit with per-account serialization,
//!   wallet summaries kept in lockstep with an append-mostly entry log,
//!   redemption state machine, FIFO expiry sweeper
//! - **Points** (`points`): rate-based calculation and campaign matching
//! - **Catalog** (`db`): SQLite repositories for accounts, campaigns,
//!   rewards, and system configuration
//! - **Services** (`services`): TTL-cached configuration, notification
//!   dispatch, the transaction earning flow
//!
//! # Module structure
//!
//! ```text
//! points-engine/src/
//! ├── core/          # Process config, background tasks
//! ├── ledger/        # Storage, manager, actions, sweeper
//! ├── points/        # Calculator, campaign matcher, award engine
//! ├── db/            # SQLite pool and repositories
//! ├── services/      # Config cache, notifier, earning
//! └── utils/         # Logging, time helpers
//! ```

pub mod core;
pub mod db;
pub mod ledger;
pub mod points;
pub mod services;
pub mod utils;

// Re-export public types
pub use crate::core::{BackgroundTasks, Config, TaskKind};
pub use db::DbService;
pub use db::repository::{
    AccountRepository, CampaignRepository, RepoError, RewardRepository, SystemConfigRepository,
};
pub use ledger::{ExpirySweeper, LedgerManager, LedgerStorage, SweepReport};
pub use points::{PointsBreakdown, compute_award};
pub use services::{ConfigService, EarningService, Notifier, TracingNotifier};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
    ____        _       __
   / __ \____  (_)___  / /______
  / /_/ / __ \/ / __ \/ __/ ___/
 / ____/ /_/ / / / / / /_(__  )
/_/    \____/_/_/ /_/\__/____/
    ______            _
   / ____/___  ____ _(_)___  ___
  / __/ / __ \/ __ `/ / __ \/ _ \
 / /___/ / / / /_/ / / / / /  __/
/_____/_/ /_/\__, /_/_/ /_/\___/
            /____/
    "#
    );
}

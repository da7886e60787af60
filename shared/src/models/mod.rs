//! Data models
//!
//! Catalog entities shared between the points engine and its embedders.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY, snowflake-generated).

pub mod account;
pub mod campaign;
pub mod reward;
pub mod system_config;
pub mod transaction;

// Re-exports
pub use account::{Account, AccountRole};
pub use campaign::{AppliedCampaign, Campaign, CampaignConditions, CampaignKind};
pub use reward::{Reward, RewardAvailability};
pub use system_config::{PointsRates, SystemConfig};
pub use transaction::TransactionCategory;

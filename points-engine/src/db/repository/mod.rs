//! Repository Module
//!
//! CRUD and query operations over the SQLite catalog tables. Row types that
//! need massaging (JSON columns) get private row structs; plain entities
//! derive `sqlx::FromRow` in the shared crate behind its `db` feature.

pub mod account;
pub mod campaign;
pub mod reward;
pub mod system_config;

// Re-exports
pub use account::AccountRepository;
pub use campaign::CampaignRepository;
pub use reward::RewardRepository;
pub use system_config::SystemConfigRepository;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

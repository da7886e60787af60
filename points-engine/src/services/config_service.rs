//! Config Service - bounded-TTL cache over the system configuration row
//!
//! The ledger reads configuration on every operation (expiry months,
//! redemption validity, rates); hitting SQLite each time is wasteful and a
//! cached-at-startup value goes stale the moment an admin changes a rate.
//! A short TTL keeps reads cheap while rate changes become visible within
//! seconds; staleness of that order is acceptable.

use crate::db::repository::SystemConfigRepository;
use parking_lot::RwLock;
use shared::models::SystemConfig;
use std::time::{Duration, Instant};

struct CachedConfig {
    fetched_at: Instant,
    config: SystemConfig,
}

pub struct ConfigService {
    repo: SystemConfigRepository,
    ttl: Duration,
    cached: RwLock<Option<CachedConfig>>,
}

impl ConfigService {
    pub fn new(repo: SystemConfigRepository, ttl: Duration) -> Self {
        Self {
            repo,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Current configuration, served from cache within the TTL
    ///
    /// A read failure falls back to the last known value (or defaults) so a
    /// catalog hiccup never blocks ledger operations.
    pub async fn get(&self) -> SystemConfig {
        {
            let guard = self.cached.read();
            if let Some(cached) = &*guard
                && cached.fetched_at.elapsed() < self.ttl
            {
                return cached.config.clone();
            }
        }

        match self.repo.get().await {
            Ok(config) => {
                *self.cached.write() = Some(CachedConfig {
                    fetched_at: Instant::now(),
                    config: config.clone(),
                });
                config
            }
            Err(e) => {
                tracing::warn!(error = %e, "Config read failed, serving last known value");
                let guard = self.cached.read();
                match &*guard {
                    Some(cached) => cached.config.clone(),
                    None => SystemConfig::default(),
                }
            }
        }
    }

    /// Drop the cached value (e.g. right after an admin update)
    pub fn invalidate(&self) {
        *self.cached.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;

    #[tokio::test]
    async fn test_serves_defaults_on_empty_table() {
        let repo = SystemConfigRepository::new(test_pool().await);
        let service = ConfigService::new(repo, Duration::from_secs(5));
        let config = service.get().await;
        assert_eq!(config.points_expiry_months, 12);
    }

    #[tokio::test]
    async fn test_update_visible_after_invalidate() {
        let pool = test_pool().await;
        let repo = SystemConfigRepository::new(pool.clone());
        let service = ConfigService::new(repo.clone(), Duration::from_secs(3600));

        assert_eq!(service.get().await.points_expiry_months, 12);

        let mut config = SystemConfig::default();
        config.points_expiry_months = 6;
        repo.update(&config).await.unwrap();

        // Long TTL: still the cached value
        assert_eq!(service.get().await.points_expiry_months, 12);

        service.invalidate();
        assert_eq!(service.get().await.points_expiry_months, 6);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let pool = test_pool().await;
        let repo = SystemConfigRepository::new(pool.clone());
        let service = ConfigService::new(repo.clone(), Duration::ZERO);

        assert_eq!(service.get().await.points_expiry_months, 12);

        let mut config = SystemConfig::default();
        config.points_expiry_months = 3;
        repo.update(&config).await.unwrap();

        assert_eq!(service.get().await.points_expiry_months, 3);
    }
}

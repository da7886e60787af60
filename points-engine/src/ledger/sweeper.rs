//! Expiry sweeper
//!
//! Daily batch that FIFO-expires aged credit entries. Runs at a configured
//! cutoff time in the station's timezone; each account is swept through a
//! normal `SweepAccount` command so expiry gets the same serialization and
//! conservation guarantees as every other mutation.
//!
//! Per-account failures are caught, logged, and counted; the batch always
//! continues and never takes the process down. Notifications are
//! fire-and-forget: a dispatcher failure is a counter and a warning, never a
//! rollback.

use super::manager::LedgerManager;
use crate::services::{ConfigService, Notifier};
use crate::utils::time;
use chrono::NaiveTime;
use chrono_tz::Tz;
use shared::ledger::{EntryKind, LedgerCommand, LedgerCommandPayload};
use shared::util::now_millis;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const DAY_MS: i64 = 86_400_000;

/// Aggregate outcome of one sweep run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned_accounts: usize,
    /// Accounts that had at least one entry expired
    pub swept_accounts: usize,
    /// Accounts whose sweep command failed (logged, batch continued)
    pub failed_accounts: usize,
    pub expired_points: i64,
    pub notifications_sent: usize,
    pub notification_failures: usize,
}

/// Daily expiry sweeper
///
/// Registered as a periodic background task; disabled by default in process
/// configuration, matching current production posture.
pub struct ExpirySweeper {
    manager: LedgerManager,
    notifier: Arc<dyn Notifier>,
    config: Option<Arc<ConfigService>>,
    shutdown: CancellationToken,
    tz: Tz,
    cutoff: NaiveTime,
}

impl ExpirySweeper {
    pub fn new(
        manager: LedgerManager,
        notifier: Arc<dyn Notifier>,
        shutdown: CancellationToken,
        tz: Tz,
        cutoff: NaiveTime,
    ) -> Self {
        Self {
            manager,
            notifier,
            config: None,
            shutdown,
            tz,
            cutoff,
        }
    }

    /// Wire the configuration accessor (expiry notification lead days)
    pub fn with_config(mut self, config: Arc<ConfigService>) -> Self {
        self.config = Some(config);
        self
    }

    /// Main loop: sleep until the daily cutoff, sweep, repeat
    pub async fn run(self) {
        tracing::info!("Expiry sweeper started");

        loop {
            let sleep_duration = time::duration_until_next_cutoff(self.cutoff, self.tz);
            tracing::info!(
                "Next expiry sweep in {} minutes",
                sleep_duration.as_secs() / 60
            );

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Expiry sweeper received shutdown signal");
                    return;
                }
            }

            let report = self.sweep_once().await;
            tracing::info!(
                scanned = report.scanned_accounts,
                swept = report.swept_accounts,
                failed = report.failed_accounts,
                expired_points = report.expired_points,
                "Expiry sweep finished"
            );
        }
    }

    /// Sweep every account that holds a wallet
    pub async fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        let account_ids = match self.manager.wallet_account_ids() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Expiry sweep could not list accounts");
                return report;
            }
        };

        let notification_days = match &self.config {
            Some(config) => config.get().await.points_expiry_notification_days,
            None => Vec::new(),
        };

        for account_id in account_ids {
            report.scanned_accounts += 1;

            if self.shutdown.is_cancelled() {
                tracing::info!("Expiry sweep interrupted by shutdown");
                return report;
            }

            let cmd = LedgerCommand::new(
                "system",
                "Expiry Sweeper",
                LedgerCommandPayload::SweepAccount { account_id },
            );
            let (response, events) = self.manager.execute_with_events(cmd).await;
            if !response.success {
                report.failed_accounts += 1;
                tracing::error!(
                    account_id,
                    error = ?response.error,
                    "Account sweep failed, continuing with remaining accounts"
                );
                continue;
            }

            let expired: i64 = events
                .iter()
                .filter_map(|e| e.entry.as_ref())
                .map(|entry| -entry.points)
                .sum();
            if expired > 0 {
                report.swept_accounts += 1;
                report.expired_points += expired;
                self.notify(
                    &mut report,
                    account_id,
                    "Points expired",
                    format!("{expired} loyalty points have expired from your wallet"),
                )
                .await;
            }

            if !notification_days.is_empty() {
                self.warn_upcoming(&mut report, account_id, &notification_days)
                    .await;
            }
        }

        report
    }

    /// Warn about points expiring in exactly one of the configured lead
    /// windows (daily cadence means each lead fires once per entry)
    async fn warn_upcoming(&self, report: &mut SweepReport, account_id: i64, lead_days: &[u32]) {
        let entries = match self.manager.get_entries(account_id) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(account_id, error = %e, "Could not read entries for expiry warning");
                return;
            }
        };

        let now = now_millis();
        for &days in lead_days {
            let expiring: i64 = entries
                .iter()
                .filter(|e| {
                    e.kind == EntryKind::Credit
                        && e.remaining_points() > 0
                        && matches!(e.expiry_date, Some(expiry) if {
                            let days_left = (expiry - now).div_euclid(DAY_MS);
                            expiry > now && days_left == days as i64
                        })
                })
                .map(|e| e.remaining_points())
                .sum();
            if expiring > 0 {
                self.notify(
                    report,
                    account_id,
                    "Points expiring soon",
                    format!("{expiring} loyalty points expire in {days} day(s)"),
                )
                .await;
            }
        }
    }

    async fn notify(&self, report: &mut SweepReport, account_id: i64, title: &str, body: String) {
        match self.notifier.notify(account_id, title, &body).await {
            Ok(()) => report.notifications_sent += 1,
            Err(e) => {
                report.notification_failures += 1;
                tracing::warn!(account_id, error = %e, "Notification dispatch failed (ignored)");
            }
        }
    }
}

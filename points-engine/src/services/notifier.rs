//! Notification dispatch
//!
//! Fire-and-forget by policy: a notification failure is logged and counted,
//! never allowed to roll back or block the ledger operation that triggered
//! it. The platform wires a real push/SMS gateway behind the trait; the
//! engine ships a tracing-backed implementation.

use async_trait::async_trait;
use shared::ledger::{LedgerEvent, LedgerEventKind};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Dispatch failed: {0}")]
    Dispatch(String),
}

/// Notification dispatcher interface
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, account_id: i64, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Dispatcher that logs through tracing (default wiring)
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, account_id: i64, title: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(account_id, title, body, "Notification dispatched");
        Ok(())
    }
}

/// Forward redemption rejections to the dispatcher
///
/// Registered as a Listener background task. Subscribes to committed events;
/// lagging or dispatch failures are logged and the loop keeps going.
pub async fn run_rejection_listener(
    mut rx: broadcast::Receiver<LedgerEvent>,
    notifier: Arc<dyn Notifier>,
    shutdown: CancellationToken,
) {
    tracing::info!("Rejection listener started");
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Rejection listener received shutdown signal");
                return;
            }
            event = rx.recv() => match event {
                Ok(event) if event.kind == LedgerEventKind::RedemptionRejected => {
                    let Some(redemption) = &event.redemption else { continue };
                    let reason = redemption
                        .rejected_reason
                        .as_deref()
                        .unwrap_or("no reason given");
                    let body = format!(
                        "Your redemption {} was rejected: {reason}",
                        redemption.code
                    );
                    if let Err(e) = notifier
                        .notify(event.account_id, "Redemption rejected", &body)
                        .await
                    {
                        tracing::warn!(
                            account_id = event.account_id,
                            error = %e,
                            "Rejection notification failed (ignored)"
                        );
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Rejection listener lagged behind event stream");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event stream closed, rejection listener exiting");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records dispatches; optionally fails every call
    #[derive(Default)]
    pub struct CountingNotifier {
        pub sent: AtomicUsize,
        fail: bool,
    }

    impl CountingNotifier {
        pub fn failing() -> Self {
            Self {
                sent: AtomicUsize::new(0),
                fail: true,
            }
        }

        pub fn count(&self) -> usize {
            self.sent.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(&self, _account_id: i64, _title: &str, _body: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Dispatch("gateway unavailable".to_string()));
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}

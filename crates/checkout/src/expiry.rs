//! Expiry sweeper for unpaid online orders.

use chrono::{DateTime, Utc};
use store::Store;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::error::Result;

/// Periodically removes online orders whose payment window has passed,
/// restoring their stock.
///
/// Deadlines live on the orders themselves, so expiry survives restarts.
#[derive(Clone)]
pub struct ExpirySweeper<S> {
    store: S,
    interval: std::time::Duration,
}

impl<S: Store + Clone + 'static> ExpirySweeper<S> {
    pub fn new(store: S, interval: std::time::Duration) -> Self {
        Self { store, interval }
    }

    /// Runs one sweep, returning how many orders were removed.
    #[instrument(skip(self))]
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<usize> {
        let expired = self.store.expire_pending_orders(now).await?;
        for order in &expired {
            tracing::info!(order_id = %order.id, user_id = %order.user_id, "unpaid order expired");
        }
        if !expired.is_empty() {
            metrics::counter!("orders_expired_total").increment(expired.len() as u64);
        }
        Ok(expired.len())
    }

    /// Sweeps on a fixed interval until `shutdown` flips to true.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(interval = ?self.interval, "expiry sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.sweep_once(Utc::now()).await {
                            tracing::error!(error = %e, "expiry sweep failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("expiry sweeper stopped");
        })
    }
}

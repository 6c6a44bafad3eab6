//! BalancePoller - periodic balance refresh until shutdown

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::Panel;
use crate::backend::WalletBackend;

pub struct BalancePoller<B: WalletBackend> {
    panel: Arc<Panel<B>>,
    interval: Duration,
}

impl<B: WalletBackend + 'static> BalancePoller<B> {
    pub fn new(panel: Arc<Panel<B>>) -> Self {
        let interval = panel.config().poll_interval();
        Self { panel, interval }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self { self.interval = interval; self }

    /// Refresh once immediately, then every interval. Failures keep the previous snapshot.
    pub fn spawn(self, mut shutdown: broadcast::Receiver<()>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::debug!(interval_ms = self.interval.as_millis() as u64, "balance poller started");
            loop {
                match self.panel.refresh_balance().await {
                    Ok(balance) => tracing::debug!(available = balance.available, "balance refreshed"),
                    Err(e) => tracing::warn!("balance refresh failed: {}", e),
                }
                tokio::select! {
                    _ = shutdown.recv() => {
                        tracing::debug!("balance poller stopped");
                        break;
                    }
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
        })
    }
}

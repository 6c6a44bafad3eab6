//! Panel - one wallet panel instance: validate, dispatch, refresh
//!
//! # Flow
//!
//! ```text
//! withdraw(intent)
//!   │
//!   ├── InFlight::begin(Withdraw)     → Busy if already running
//!   ├── wallet::validate(intent, latest balance snapshot)
//!   └── tokio::spawn ─┬─ backend::dispatch(plan) → txid | Dispatch error
//!                     └─ refresh snapshot        (best effort)
//! ```
//!
//! The backend call runs on its own task that owns the in-flight guard, so a
//! dropped caller (closed view, aborted request) neither cancels the call nor
//! frees the action before the call settles.
//!
//! Exit actions follow the same shape, gated by `ExitInfo` evaluated at the
//! panel clock's current time.

mod poller;

pub use poller::BalancePoller;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, RwLock};

use crate::backend::{self, WalletBackend};
use crate::config::PanelConfig;
use crate::core::inflight::{Action, InFlight, InFlightGuard};
use crate::error::{PanelError, Result};
use crate::exit::{ExitInfo, ExitStatus, ExitTransactions};
use crate::wallet::fee::validate_exit_fee_rate;
use crate::wallet::withdraw::{max_sendable, validate_with_size};
use crate::wallet::{resolve_method, Balance, DepositAddresses, SettlementMethod, WithdrawalIntent, WithdrawalPlan};

type ClockFn = dyn Fn() -> DateTime<Utc> + Send + Sync;
type Snapshot = Arc<RwLock<Option<Balance>>>;

/// Result of an accepted and dispatched withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalReceipt {
    pub txid: String,
    #[serde(flatten)]
    pub plan: WithdrawalPlan,
}

pub struct Panel<B: WalletBackend> {
    backend: Arc<B>,
    config: PanelConfig,
    balance: Snapshot,
    in_flight: InFlight,
    clock: Arc<ClockFn>,
}

impl<B: WalletBackend> Panel<B> {
    pub fn new(backend: Arc<B>, config: PanelConfig) -> Self {
        Self { backend, config, balance: Arc::new(RwLock::new(None)), in_flight: InFlight::new(), clock: Arc::new(Utc::now) }
    }

    /// Replace the wall clock, e.g. to pin time in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn backend(&self) -> &Arc<B> { &self.backend }
    pub fn config(&self) -> &PanelConfig { &self.config }
    pub fn in_flight(&self) -> &InFlight { &self.in_flight }
    pub fn now(&self) -> DateTime<Utc> { (self.clock)() }

    /// Latest balance snapshot, if one has been fetched.
    pub fn balance(&self) -> Option<Balance> { *self.balance.read().unwrap_or_else(|p| p.into_inner()) }

    pub async fn refresh_balance(&self) -> Result<Balance> { store_balance(self.backend.as_ref(), &self.balance).await }

    pub async fn deposit_addresses(&self) -> Result<DepositAddresses> {
        self.backend.deposit_addresses().await.map_err(PanelError::dispatch)
    }

    /// Check an intent against the latest snapshot without dispatching.
    pub fn validate(&self, intent: &WithdrawalIntent) -> Result<WithdrawalPlan> {
        validate_with_size(intent, self.balance().as_ref(), self.config.tx_vbytes)
    }

    pub async fn withdraw(&self, intent: &WithdrawalIntent) -> Result<WithdrawalReceipt> {
        let guard = self.in_flight.begin(Action::Withdraw)?;
        let plan = self.validate(intent)?;
        let wallet = self.backend.clone();
        let sent = plan.clone();
        let txid = self
            .detach(guard, true, async move {
                let txid = backend::dispatch(wallet.as_ref(), &sent).await.map_err(|e| {
                    tracing::warn!(address = %sent.address, amount = sent.amount, "withdrawal failed: {:#}", e);
                    PanelError::dispatch(e)
                })?;
                tracing::info!(%txid, method = %sent.method, amount = sent.amount, fee = sent.fee, "withdrawal sent");
                Ok::<_, PanelError>(txid)
            })
            .await?;
        Ok(WithdrawalReceipt { txid, plan })
    }

    pub async fn exit_info(&self) -> Result<ExitInfo> {
        let info = self.backend.exit_info().await.map_err(PanelError::dispatch)?;
        if !info.is_consistent() {
            tracing::warn!(?info, "backend reported timelock expiry before start");
        }
        Ok(info)
    }

    pub async fn exit_status(&self) -> Result<ExitStatus> {
        Ok(self.exit_info().await?.status_at(self.now()))
    }

    pub async fn exit_transactions(&self) -> Result<ExitTransactions> {
        Ok(self.backend.exit_transactions().await.map_err(PanelError::dispatch)?.into_iter().collect())
    }

    /// Broadcast the pre-signed exit. Irreversible; ends the wallet's Ark contract state.
    pub async fn execute_emergency_exit(&self, address: Option<&str>, fee_rate: u64) -> Result<String> {
        let fee_rate = validate_exit_fee_rate(fee_rate)?;
        let guard = self.in_flight.begin(Action::ExecuteExit)?;
        if !self.exit_info().await?.actions_at(self.now()).execute_emergency_exit {
            return Err(PanelError::ExitUnavailable);
        }
        let address = self.exit_address(address).await?;
        let backend = self.backend.clone();
        self.detach(guard, true, async move {
            let txid = backend.execute_emergency_exit(&address, fee_rate).await.map_err(|e| {
                tracing::warn!(%address, "emergency exit failed: {:#}", e);
                PanelError::dispatch(e)
            })?;
            tracing::info!(%txid, %address, fee_rate, "emergency exit broadcast");
            Ok::<_, PanelError>(txid)
        })
        .await
    }

    /// Sweep the spendable balance on-chain once the timelock has expired.
    pub async fn use_timelock_exit(&self, address: Option<&str>, fee_rate: u64) -> Result<WithdrawalReceipt> {
        let fee_rate = validate_exit_fee_rate(fee_rate)?;
        let guard = self.in_flight.begin(Action::TimelockExit)?;
        if !self.exit_info().await?.actions_at(self.now()).use_timelock_exit {
            return Err(PanelError::TimelockActive);
        }
        let address = self.exit_address(address).await?;
        resolve_method(&address, SettlementMethod::OnChain)?;
        let balance = self.refresh_balance().await?;
        let amount = max_sendable(&balance, fee_rate, self.config.tx_vbytes).unwrap_or(0);
        let intent = WithdrawalIntent::new(address, i64::try_from(amount).unwrap_or(i64::MAX))
            .with_method(SettlementMethod::OnChain)
            .with_fee_rate(fee_rate);
        let plan = validate_with_size(&intent, Some(&balance), self.config.tx_vbytes)?;
        let wallet = self.backend.clone();
        let sent = plan.clone();
        let txid = self
            .detach(guard, true, async move {
                let txid = backend::dispatch(wallet.as_ref(), &sent).await.map_err(|e| {
                    tracing::warn!(address = %sent.address, "timelock exit failed: {:#}", e);
                    PanelError::dispatch(e)
                })?;
                tracing::info!(%txid, amount = sent.amount, "timelock exit sent");
                Ok::<_, PanelError>(txid)
            })
            .await?;
        Ok(WithdrawalReceipt { txid, plan })
    }

    pub async fn download_exit_transactions(&self) -> Result<()> {
        let guard = self.in_flight.begin(Action::DownloadExit)?;
        if !self.exit_info().await?.actions_at(self.now()).download_exit_transactions {
            return Err(PanelError::ExitUnavailable);
        }
        let backend = self.backend.clone();
        self.detach(guard, false, async move {
            backend.download_exit_transactions().await.map_err(|e| {
                tracing::warn!("exit transaction download failed: {:#}", e);
                PanelError::dispatch(e)
            })
        })
        .await
    }

    /// Broadcast one stored exit transaction. Repeat broadcasts are not deduplicated here.
    pub async fn broadcast_exit_transaction(&self, id: &str) -> Result<String> {
        let guard = self.in_flight.begin(Action::BroadcastExit)?;
        if !self.exit_transactions().await?.contains(id) {
            return Err(PanelError::UnknownExitTransaction(id.to_string()));
        }
        let backend = self.backend.clone();
        let id = id.to_string();
        self.detach(guard, false, async move {
            let txid = backend.broadcast_exit_transaction(&id).await.map_err(|e| {
                tracing::warn!(%id, "exit transaction broadcast failed: {:#}", e);
                PanelError::dispatch(e)
            })?;
            tracing::info!(%txid, %id, "exit transaction broadcast");
            Ok::<_, PanelError>(txid)
        })
        .await
    }

    /// Given address if non-blank, else the wallet's own on-chain address.
    async fn exit_address(&self, address: Option<&str>) -> Result<String> {
        if let Some(addr) = address.map(str::trim).filter(|a| !a.is_empty()) {
            return Ok(addr.to_string());
        }
        let own = self.deposit_addresses().await?;
        own.onchain().map(str::to_string).ok_or(PanelError::NoExitAddress)
    }

    /// Run a backend call to completion on its own task, holding `guard` until
    /// it settles. With `refresh`, a successful call also reloads the snapshot.
    async fn detach<T, F>(&self, guard: InFlightGuard, refresh: bool, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let backend = self.backend.clone();
        let snapshot = self.balance.clone();
        let task = tokio::spawn(async move {
            let outcome = call.await;
            if refresh && outcome.is_ok() {
                if let Err(e) = store_balance(backend.as_ref(), &snapshot).await {
                    tracing::warn!(action = %guard.action(), "balance refresh after dispatch failed: {}", e);
                }
            }
            drop(guard);
            outcome
        });
        task.await.map_err(|e| PanelError::Dispatch(format!("backend task ended: {}", e)))?
    }
}

async fn store_balance<B: WalletBackend + ?Sized>(backend: &B, snapshot: &Snapshot) -> Result<Balance> {
    let balance = backend.fetch_balance().await.map_err(PanelError::dispatch)?;
    if !balance.is_consistent() {
        tracing::warn!(?balance, "backend reported inconsistent balance");
    }
    *snapshot.write().unwrap_or_else(|p| p.into_inner()) = Some(balance);
    Ok(balance)
}

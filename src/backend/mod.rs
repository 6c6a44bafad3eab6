//! Backend - the external wallet that actually moves funds
//!
//! The panel never builds, signs or broadcasts transactions itself. Everything
//! that touches the network goes through `WalletBackend`.
//!
//! ```text
//! Panel ──validate──▶ WithdrawalPlan ──dispatch──▶ WalletBackend
//!                                                     │
//!                                      ┌──────────────┼──────────────┐
//!                                  send_auto     send_onchain   send_offchain
//! ```

use anyhow::Result;
use async_trait::async_trait;

use crate::exit::{ExitInfo, ExitTransaction};
use crate::wallet::{Balance, DepositAddresses, SettlementMethod, WithdrawalPlan};

#[cfg(feature = "native")]
pub mod memory;

#[async_trait]
pub trait WalletBackend: Send + Sync + 'static {
    async fn fetch_balance(&self) -> Result<Balance>;
    async fn deposit_addresses(&self) -> Result<DepositAddresses>;

    async fn send_auto(&self, address: &str, amount: u64, fee_rate: u64) -> Result<String>;
    async fn send_onchain(&self, address: &str, amount: u64, fee_rate: u64) -> Result<String>;
    async fn send_offchain(&self, address: &str, amount: u64, fee_rate: u64) -> Result<String>;

    async fn execute_emergency_exit(&self, address: &str, fee_rate: u64) -> Result<String>;
    async fn download_exit_transactions(&self) -> Result<()>;
    async fn broadcast_exit_transaction(&self, id: &str) -> Result<String>;

    async fn exit_info(&self) -> Result<ExitInfo>;
    async fn exit_transactions(&self) -> Result<Vec<ExitTransaction>>;
}

/// Route a validated plan to the send call matching what the user asked for.
pub async fn dispatch<B: WalletBackend + ?Sized>(backend: &B, plan: &WithdrawalPlan) -> Result<String> {
    match plan.requested_method {
        SettlementMethod::Auto => backend.send_auto(&plan.address, plan.amount, plan.fee_rate).await,
        SettlementMethod::OnChain => backend.send_onchain(&plan.address, plan.amount, plan.fee_rate).await,
        SettlementMethod::OffChain => backend.send_offchain(&plan.address, plan.amount, plan.fee_rate).await,
    }
}

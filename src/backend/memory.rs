//! MemoryBackend - in-process wallet backend for demos and tests
//!
//! Holds a balance, deposit addresses and exit facts in memory and settles
//! sends instantly. Seeded from JSON (`arkpanel --state state.json`).

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

use crate::backend::WalletBackend;
use crate::exit::{ExitInfo, ExitTransaction};
use crate::wallet::{classify, estimate_fee, Balance, DepositAddresses, Domain, SettlementMethod, DEFAULT_TX_VBYTES};

/// Seed state for the in-memory wallet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryState {
    #[serde(default)]
    pub balance: Balance,
    #[serde(default)]
    pub addresses: DepositAddresses,
    #[serde(default)]
    pub exit_info: ExitInfo,
    #[serde(default)]
    pub exit_transactions: Vec<ExitTransaction>,
}

impl MemoryState {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("state read: {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("state json: {}", path.display()))
    }
}

/// A send the backend settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentTransaction {
    pub txid: String,
    pub method: SettlementMethod,
    pub address: String,
    pub amount: u64,
    pub fee: u64,
}

#[derive(Default)]
struct Inner {
    state: MemoryState,
    sent: Vec<SentTransaction>,
    broadcasts: Vec<String>,
    downloads: usize,
    calls: Vec<&'static str>,
    fail_next: Option<String>,
    nonce: u64,
}

#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
    gate: Option<Arc<Notify>>,
    tx_vbytes: u64,
}

impl Default for MemoryBackend {
    fn default() -> Self { Self::new(MemoryState::default()) }
}

impl MemoryBackend {
    pub fn new(state: MemoryState) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner { state, ..Default::default() })), gate: None, tx_vbytes: DEFAULT_TX_VBYTES }
    }

    /// Charge fees for transactions of this size. Keep in step with `PanelConfig::tx_vbytes`.
    pub fn with_tx_vbytes(mut self, vbytes: u64) -> Self { self.tx_vbytes = vbytes; self }

    /// Hold every dispatch until the returned handle is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    /// Fail the next dispatch call with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() { inner.fail_next = Some(message.into()); }
    }

    pub fn set_balance(&self, balance: Balance) {
        if let Ok(mut inner) = self.inner.lock() { inner.state.balance = balance; }
    }

    pub fn set_exit_info(&self, exit_info: ExitInfo) {
        if let Ok(mut inner) = self.inner.lock() { inner.state.exit_info = exit_info; }
    }

    pub fn state(&self) -> MemoryState { self.inner.lock().map(|i| i.state.clone()).unwrap_or_default() }
    pub fn sent(&self) -> Vec<SentTransaction> { self.inner.lock().map(|i| i.sent.clone()).unwrap_or_default() }
    pub fn broadcasts(&self) -> Vec<String> { self.inner.lock().map(|i| i.broadcasts.clone()).unwrap_or_default() }
    pub fn downloads(&self) -> usize { self.inner.lock().map(|i| i.downloads).unwrap_or_default() }

    /// Names of every backend call, in order.
    pub fn calls(&self) -> Vec<&'static str> { self.inner.lock().map(|i| i.calls.clone()).unwrap_or_default() }

    fn lock(&self, call: &'static str) -> Result<MutexGuard<'_, Inner>> {
        let mut inner = self.inner.lock().map_err(|_| anyhow!("lock"))?;
        inner.calls.push(call);
        Ok(inner)
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate { gate.notified().await; }
    }

    async fn send(&self, call: &'static str, method: SettlementMethod, address: &str, amount: u64, fee_rate: u64) -> Result<String> {
        self.wait_gate().await;
        let mut inner = self.lock(call)?;
        if let Some(msg) = inner.fail_next.take() {
            bail!(msg);
        }
        let method = match (method, classify(address)?) {
            (SettlementMethod::Auto | SettlementMethod::OnChain, Domain::OnChain) => SettlementMethod::OnChain,
            (SettlementMethod::Auto | SettlementMethod::OffChain, Domain::OffChain) => SettlementMethod::OffChain,
            (_, domain) => bail!("cannot send {} to {} address", method, domain),
        };
        let fee = estimate_fee(fee_rate, self.tx_vbytes);
        let total = amount.checked_add(fee).ok_or_else(|| anyhow!("amount overflow"))?;
        if total > inner.state.balance.available {
            bail!("insufficient funds: need {}, available {}", total, inner.state.balance.available);
        }
        inner.state.balance.debit(total);
        let txid = next_txid(&mut inner, &format!("{}:{}:{}", method, address, amount));
        inner.sent.push(SentTransaction { txid: txid.clone(), method, address: address.to_string(), amount, fee });
        Ok(txid)
    }
}

fn next_txid(inner: &mut Inner, payload: &str) -> String {
    inner.nonce += 1;
    let first = Sha256::digest(format!("{}:{}", payload, inner.nonce).as_bytes());
    hex::encode(Sha256::digest(first))
}

#[async_trait]
impl WalletBackend for MemoryBackend {
    async fn fetch_balance(&self) -> Result<Balance> { Ok(self.lock("fetch_balance")?.state.balance) }

    async fn deposit_addresses(&self) -> Result<DepositAddresses> { Ok(self.lock("deposit_addresses")?.state.addresses.clone()) }

    async fn send_auto(&self, address: &str, amount: u64, fee_rate: u64) -> Result<String> {
        self.send("send_auto", SettlementMethod::Auto, address, amount, fee_rate).await
    }

    async fn send_onchain(&self, address: &str, amount: u64, fee_rate: u64) -> Result<String> {
        self.send("send_onchain", SettlementMethod::OnChain, address, amount, fee_rate).await
    }

    async fn send_offchain(&self, address: &str, amount: u64, fee_rate: u64) -> Result<String> {
        self.send("send_offchain", SettlementMethod::OffChain, address, amount, fee_rate).await
    }

    async fn execute_emergency_exit(&self, address: &str, fee_rate: u64) -> Result<String> {
        self.wait_gate().await;
        let mut inner = self.lock("execute_emergency_exit")?;
        if let Some(msg) = inner.fail_next.take() {
            bail!(msg);
        }
        if !inner.state.exit_info.has_pre_signed_exit {
            bail!("no pre-signed exit");
        }
        // The exit sweeps everything and ends the Ark contract state.
        let swept = inner.state.balance.total;
        let fee = estimate_fee(fee_rate, self.tx_vbytes).min(swept);
        inner.state.balance = Balance::default();
        inner.state.exit_info.has_pre_signed_exit = false;
        inner.state.exit_transactions.clear();
        let txid = next_txid(&mut inner, &format!("exit:{}:{}", address, swept));
        inner.sent.push(SentTransaction {
            txid: txid.clone(),
            method: SettlementMethod::OnChain,
            address: address.to_string(),
            amount: swept - fee,
            fee,
        });
        Ok(txid)
    }

    async fn download_exit_transactions(&self) -> Result<()> {
        self.wait_gate().await;
        let mut inner = self.lock("download_exit_transactions")?;
        if let Some(msg) = inner.fail_next.take() {
            bail!(msg);
        }
        inner.downloads += 1;
        Ok(())
    }

    async fn broadcast_exit_transaction(&self, id: &str) -> Result<String> {
        self.wait_gate().await;
        let mut inner = self.lock("broadcast_exit_transaction")?;
        if let Some(msg) = inner.fail_next.take() {
            bail!(msg);
        }
        if !inner.state.exit_transactions.iter().any(|tx| tx.id == id) {
            bail!("exit transaction not found: {}", id);
        }
        inner.broadcasts.push(id.to_string());
        Ok(next_txid(&mut inner, &format!("broadcast:{}", id)))
    }

    async fn exit_info(&self) -> Result<ExitInfo> { Ok(self.lock("exit_info")?.state.exit_info.clone()) }

    async fn exit_transactions(&self) -> Result<Vec<ExitTransaction>> {
        Ok(self.lock("exit_transactions")?.state.exit_transactions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(sats: u64) -> MemoryBackend {
        MemoryBackend::new(MemoryState { balance: Balance::confirmed(sats), ..Default::default() })
    }

    #[tokio::test]
    async fn send_debits_amount_and_fee() {
        let backend = funded(20_000);
        let txid = backend.send_onchain("bc1qdest", 10_000, 5).await.unwrap();
        assert_eq!(txid.len(), 64);
        assert_eq!(backend.fetch_balance().await.unwrap(), Balance::confirmed(8_875));
        assert_eq!(backend.sent()[0].fee, 1125);
    }

    #[tokio::test]
    async fn fee_follows_configured_size() {
        let backend = funded(20_000).with_tx_vbytes(140);
        backend.send_onchain("bc1qdest", 10_000, 5).await.unwrap();
        assert_eq!(backend.sent()[0].fee, 700);
        assert_eq!(backend.fetch_balance().await.unwrap(), Balance::confirmed(9_300));
    }

    #[tokio::test]
    async fn txids_are_unique_per_send() {
        let backend = funded(100_000);
        let a = backend.send_auto("ark1dest", 1_000, 1).await.unwrap();
        let b = backend.send_auto("ark1dest", 1_000, 1).await.unwrap();
        assert_ne!(a, b);
        assert!(backend.sent().iter().all(|s| s.method == SettlementMethod::OffChain));
    }

    #[tokio::test]
    async fn rejects_wrong_domain_and_overdraft() {
        let backend = funded(1_000);
        assert!(backend.send_offchain("bc1qdest", 100, 1).await.is_err());
        assert!(backend.send_onchain("bc1qdest", 1_000, 1).await.is_err());
        assert_eq!(backend.fetch_balance().await.unwrap(), Balance::confirmed(1_000));
    }

    #[tokio::test]
    async fn fail_next_applies_once() {
        let backend = funded(100_000);
        backend.fail_next("network unreachable");
        let err = backend.send_onchain("bc1qdest", 1_000, 1).await.unwrap_err();
        assert_eq!(err.to_string(), "network unreachable");
        assert!(backend.send_onchain("bc1qdest", 1_000, 1).await.is_ok());
    }

    #[tokio::test]
    async fn state_loads_from_json_file() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{
            "balance": {"total": 5000, "confirmed": 5000, "unconfirmed": 0, "available": 4000},
            "addresses": {"onchain": "bc1qmine"},
            "exit_info": {"has_pre_signed_exit": true, "timelock_expiry": "2030-01-01T00:00:00Z"}
        }"#).unwrap();
        let state = MemoryState::load(&path).unwrap();
        assert_eq!(state.balance.available, 4_000);
        assert_eq!(state.addresses.onchain(), Some("bc1qmine"));
        assert!(state.exit_info.has_pre_signed_exit);
        assert!(state.exit_transactions.is_empty());
    }
}

//! PanelNamespace - the panel via paths. Reads are snapshots, writes are actions.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::backend::WalletBackend;
use crate::core::paths;
use crate::error::{PanelError, Result};
use crate::panel::Panel;
use crate::wallet::fee::{estimate_fee, FeeTier};
use crate::wallet::{classify, suggest_method, SettlementMethod, WithdrawalIntent};

pub struct PanelNamespace<B: WalletBackend> {
    panel: Arc<Panel<B>>,
}

impl<B: WalletBackend> PanelNamespace<B> {
    pub fn new(panel: Arc<Panel<B>>) -> Self { Self { panel } }

    pub fn panel(&self) -> &Arc<Panel<B>> { &self.panel }

    pub async fn read(&self, path: &str) -> Result<Option<Value>> {
        let path = paths::normalize(path);
        Ok(Some(match path.as_str() {
            paths::STATUS => json!({
                "app": self.panel.config().app,
                "balance_loaded": self.panel.balance().is_some(),
                "now": self.panel.now(),
            }),
            paths::BALANCE => {
                let balance = match self.panel.balance() {
                    Some(b) => b,
                    None => self.panel.refresh_balance().await?,
                };
                serde_json::to_value(balance).unwrap_or_default()
            }
            paths::DEPOSIT => serde_json::to_value(self.panel.deposit_addresses().await?).unwrap_or_default(),
            paths::FEE_TIERS => json!({
                "tiers": FeeTier::all().iter().map(|t| json!({
                    "tier": t,
                    "rate": t.rate(),
                    "label": t.label(),
                    "description": t.description(),
                    "fee": estimate_fee(t.rate(), self.panel.config().tx_vbytes),
                })).collect::<Vec<_>>(),
                "default": FeeTier::from_rate(self.panel.config().fee_rate),
            }),
            paths::EXIT => serde_json::to_value(self.panel.exit_status().await?).unwrap_or_default(),
            paths::EXIT_TRANSACTIONS => {
                let txs = self.panel.exit_transactions().await?;
                json!({
                    "transactions": txs.iter().collect::<Vec<_>>(),
                    "count": txs.len(),
                    "total_sat": txs.total_amount(),
                })
            }
            paths::ACTIONS => Value::Object(
                self.panel
                    .in_flight()
                    .snapshot()
                    .into_iter()
                    .map(|(action, state)| (action.as_str().to_string(), json!(state)))
                    .collect(),
            ),
            _ => return Ok(None),
        }))
    }

    pub async fn write(&self, path: &str, data: Value) -> Result<Value> {
        let path = paths::normalize(path);
        match path.as_str() {
            paths::CLASSIFY => {
                let address = str_field(&data, "address").unwrap_or_default();
                let domain = classify(address).ok();
                Ok(json!({
                    "address": address,
                    "domain": domain,
                    "suggested_method": suggest_method(address),
                }))
            }
            paths::FEE_ESTIMATE => {
                let fee_rate = self.fee_rate(&data)?;
                let size = u64_field(&data, "size")?.unwrap_or(self.panel.config().tx_vbytes);
                Ok(json!({"fee_rate": fee_rate, "size": size, "fee_sat": estimate_fee(fee_rate, size)}))
            }
            paths::WITHDRAW_VALIDATE => {
                let plan = self.panel.validate(&self.intent(&data)?)?;
                Ok(json!({"valid": true, "plan": plan}))
            }
            paths::WITHDRAW => {
                let receipt = self.panel.withdraw(&self.intent(&data)?).await?;
                Ok(json!({"status": "broadcast", "receipt": receipt}))
            }
            paths::SYNC => {
                let balance = self.panel.refresh_balance().await?;
                Ok(json!({"status": "synced", "balance": balance}))
            }
            paths::EXIT_EXECUTE => {
                let fee_rate = self.exit_fee_rate(&data)?;
                let txid = self.panel.execute_emergency_exit(str_field(&data, "address"), fee_rate).await?;
                Ok(json!({"status": "broadcast", "txid": txid}))
            }
            paths::EXIT_TIMELOCK => {
                let fee_rate = self.exit_fee_rate(&data)?;
                let receipt = self.panel.use_timelock_exit(str_field(&data, "address"), fee_rate).await?;
                Ok(json!({"status": "broadcast", "receipt": receipt}))
            }
            paths::EXIT_DOWNLOAD => {
                self.panel.download_exit_transactions().await?;
                Ok(json!({"status": "downloaded"}))
            }
            paths::EXIT_BROADCAST => {
                let id = str_field(&data, "id").ok_or_else(|| PanelError::InvalidRequest("no 'id'".into()))?;
                let txid = self.panel.broadcast_exit_transaction(id).await?;
                Ok(json!({"status": "broadcast", "id": id, "txid": txid}))
            }
            _ => Err(PanelError::UnknownPath(path.clone())),
        }
    }

    pub fn list(&self) -> Vec<String> {
        paths::READABLE.iter().chain(paths::WRITABLE).map(|s| (*s).into()).collect()
    }

    fn intent(&self, data: &Value) -> Result<WithdrawalIntent> {
        let address = str_field(data, "address").unwrap_or_default();
        let amount = match data.get("amount_sat").or_else(|| data.get("amount")) {
            Some(v) => v.as_i64().ok_or_else(|| PanelError::InvalidRequest("'amount' must be an integer".into()))?,
            None => return Err(PanelError::InvalidRequest("no 'amount'".into())),
        };
        let method = match str_field(data, "method") {
            Some(m) => SettlementMethod::from_str(m).ok_or_else(|| PanelError::InvalidRequest(format!("unknown method: {}", m)))?,
            None => SettlementMethod::Auto,
        };
        Ok(WithdrawalIntent::new(address, amount).with_method(method).with_fee_rate(self.fee_rate(data)?))
    }

    /// `fee_rate` number, or `tier` name, or the configured default.
    fn fee_rate(&self, data: &Value) -> Result<u64> {
        if let Some(rate) = u64_field(data, "fee_rate")? {
            return Ok(rate);
        }
        match str_field(data, "tier") {
            Some(t) => FeeTier::from_str(t).map(|t| t.rate()).ok_or_else(|| PanelError::InvalidRequest(format!("unknown tier: {}", t))),
            None => Ok(self.panel.config().fee_rate),
        }
    }

    fn exit_fee_rate(&self, data: &Value) -> Result<u64> {
        Ok(u64_field(data, "fee_rate")?.unwrap_or(self.panel.config().exit_fee_rate))
    }
}

fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> { data.get(key).and_then(|v| v.as_str()) }

fn u64_field(data: &Value, key: &str) -> Result<Option<u64>> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| PanelError::InvalidRequest(format!("'{}' must be a non-negative integer", key))),
    }
}

//! Withdrawal validation - address, amount, fee and balance in a fixed order
//!
//! The order of checks decides which message the user sees first, so it is
//! part of the contract: address → amount → fee → balance.

use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};
use crate::wallet::address::{resolve_method, SettlementMethod};
use crate::wallet::balance::Balance;
use crate::wallet::fee::{estimate_fee, FeeTier, DEFAULT_TX_VBYTES};

/// A withdrawal as typed by the user. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalIntent {
    pub address: String,
    pub amount: i64,
    #[serde(default)]
    pub method: SettlementMethod,
    #[serde(default = "default_fee_rate")]
    pub fee_rate: u64,
}

fn default_fee_rate() -> u64 { FeeTier::default().rate() }

impl WithdrawalIntent {
    pub fn new(address: impl Into<String>, amount: i64) -> Self {
        Self { address: address.into(), amount, method: SettlementMethod::Auto, fee_rate: default_fee_rate() }
    }
    pub fn with_method(mut self, method: SettlementMethod) -> Self { self.method = method; self }
    pub fn with_fee_rate(mut self, fee_rate: u64) -> Self { self.fee_rate = fee_rate; self }
    pub fn with_tier(mut self, tier: FeeTier) -> Self { self.fee_rate = tier.rate(); self }
}

/// An intent that passed validation, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalPlan {
    pub address: String,
    pub amount: u64,
    /// What the user asked for; `Auto` routes to the backend's auto send.
    pub requested_method: SettlementMethod,
    /// Concrete method the address resolved to.
    pub method: SettlementMethod,
    pub fee_rate: u64,
    pub fee: u64,
    pub total: u64,
}

pub fn validate(intent: &WithdrawalIntent, balance: Option<&Balance>) -> Result<WithdrawalPlan> {
    validate_with_size(intent, balance, DEFAULT_TX_VBYTES)
}

pub fn validate_with_size(intent: &WithdrawalIntent, balance: Option<&Balance>, size_vbytes: u64) -> Result<WithdrawalPlan> {
    let method = resolve_method(&intent.address, intent.method)?;

    let amount = match u64::try_from(intent.amount) {
        Ok(a) if a > 0 => a,
        _ => return Err(PanelError::Amount("must be greater than 0".into())),
    };

    let fee = estimate_fee(intent.fee_rate, size_vbytes);
    let total = amount.saturating_add(fee);

    match balance {
        Some(b) if total <= b.available => Ok(WithdrawalPlan {
            address: intent.address.clone(),
            amount,
            requested_method: intent.method,
            method,
            fee_rate: intent.fee_rate,
            fee,
            total,
        }),
        _ => Err(PanelError::Amount(format!("insufficient balance, need {}, including {} fee", total, fee))),
    }
}

/// Largest amount that still fits `available` after the fee, if any.
pub fn max_sendable(balance: &Balance, fee_rate: u64, size_vbytes: u64) -> Option<u64> {
    balance.available.checked_sub(estimate_fee(fee_rate, size_vbytes)).filter(|a| *a > 0)
}

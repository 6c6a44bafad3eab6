//! Fee estimation - fee rate × assumed transaction size
//!
//! The estimate is shown before signing. The backend may charge a different
//! final fee once the real transaction size is known.

use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};

/// Representative single-input/single-output transaction size in vbytes.
pub const DEFAULT_TX_VBYTES: u64 = 225;

/// Fee rate bounds (sat/vB) accepted in the emergency-exit flow.
pub const MIN_EXIT_FEE_RATE: u64 = 1;
pub const MAX_EXIT_FEE_RATE: u64 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeTier { Economic, #[default] Standard, Priority }

impl FeeTier {
    pub fn all() -> [FeeTier; 3] { [FeeTier::Economic, FeeTier::Standard, FeeTier::Priority] }

    /// Rate in sat/vB
    pub fn rate(&self) -> u64 {
        match self { FeeTier::Economic => 1, FeeTier::Standard => 5, FeeTier::Priority => 15 }
    }

    pub fn label(&self) -> &'static str {
        match self { FeeTier::Economic => "Economic", FeeTier::Standard => "Standard", FeeTier::Priority => "Priority" }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FeeTier::Economic => "Lowest fee, confirmation may take several hours",
            FeeTier::Standard => "Balanced fee, confirmation usually within an hour",
            FeeTier::Priority => "Highest fee, targets the next block",
        }
    }

    pub fn from_rate(rate: u64) -> Option<Self> { Self::all().into_iter().find(|t| t.rate() == rate) }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "economic" | "slow" => Some(FeeTier::Economic),
            "standard" | "normal" => Some(FeeTier::Standard),
            "priority" | "fast" => Some(FeeTier::Priority),
            _ => None,
        }
    }
}

/// `ceil(size_bytes * fee_rate)`; with integer inputs the product is already exact.
pub fn estimate_fee(fee_rate: u64, size_bytes: u64) -> u64 { size_bytes.saturating_mul(fee_rate) }

pub fn estimate_default_fee(fee_rate: u64) -> u64 { estimate_fee(fee_rate, DEFAULT_TX_VBYTES) }

pub fn validate_exit_fee_rate(fee_rate: u64) -> Result<u64> {
    if (MIN_EXIT_FEE_RATE..=MAX_EXIT_FEE_RATE).contains(&fee_rate) {
        Ok(fee_rate)
    } else {
        Err(PanelError::InvalidFeeRate(fee_rate))
    }
}

//! Balance snapshot and deposit addresses, as reported by the wallet backend

use serde::{Deserialize, Serialize};

/// Wallet balance in sats. `available` is what withdrawals may spend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub total: u64,
    pub confirmed: u64,
    pub unconfirmed: u64,
    pub available: u64,
}

impl Balance {
    /// Fully confirmed, fully spendable balance.
    pub fn confirmed(sats: u64) -> Self {
        Self { total: sats, confirmed: sats, unconfirmed: 0, available: sats }
    }

    /// `available <= confirmed <= total`
    pub fn is_consistent(&self) -> bool { self.available <= self.confirmed && self.confirmed <= self.total }

    /// Remove a settled spend from every bucket.
    pub fn debit(&mut self, sats: u64) {
        self.total = self.total.saturating_sub(sats);
        self.confirmed = self.confirmed.saturating_sub(sats);
        self.available = self.available.saturating_sub(sats);
    }
}

/// The wallet's own receive addresses for the two deposit paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAddresses {
    #[serde(default)]
    pub onchain: Option<String>,
    #[serde(default)]
    pub offchain: Option<String>,
}

impl DepositAddresses {
    /// Wallet's on-chain address, ignoring blanks.
    pub fn onchain(&self) -> Option<&str> { self.onchain.as_deref().filter(|a| !a.trim().is_empty()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistency_ordering() {
        assert!(Balance::confirmed(5000).is_consistent());
        assert!(Balance { total: 10_000, confirmed: 8_000, unconfirmed: 2_000, available: 7_500 }.is_consistent());
        assert!(!Balance { total: 1_000, confirmed: 2_000, unconfirmed: 0, available: 500 }.is_consistent());
        assert!(!Balance { total: 2_000, confirmed: 1_000, unconfirmed: 0, available: 1_500 }.is_consistent());
    }

    #[test]
    fn debit_never_underflows() {
        let mut b = Balance { total: 3_000, confirmed: 2_000, unconfirmed: 1_000, available: 1_000 };
        b.debit(1_500);
        assert_eq!(b, Balance { total: 1_500, confirmed: 500, unconfirmed: 1_000, available: 0 });
        assert!(b.is_consistent());
    }

    #[test]
    fn blank_onchain_address_is_absent() {
        let addrs = DepositAddresses { onchain: Some("  ".into()), offchain: None };
        assert_eq!(addrs.onchain(), None);
    }
}

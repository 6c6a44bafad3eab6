//! Path constants for the panel namespace
//!
//! Centralized registry for all readable and writable paths.

/// Read paths
pub const STATUS: &str = "/status";
pub const BALANCE: &str = "/balance";
pub const DEPOSIT: &str = "/deposit";
pub const FEE_TIERS: &str = "/fee-tiers";
pub const EXIT: &str = "/exit";
pub const EXIT_TRANSACTIONS: &str = "/exit/transactions";
pub const ACTIONS: &str = "/actions";

/// Write paths
pub const CLASSIFY: &str = "/classify";
pub const FEE_ESTIMATE: &str = "/fee-estimate";
pub const WITHDRAW: &str = "/withdraw";
pub const WITHDRAW_VALIDATE: &str = "/withdraw/validate";
pub const SYNC: &str = "/sync";
pub const EXIT_EXECUTE: &str = "/exit/execute";
pub const EXIT_TIMELOCK: &str = "/exit/timelock";
pub const EXIT_DOWNLOAD: &str = "/exit/download";
pub const EXIT_BROADCAST: &str = "/exit/broadcast";

pub const READABLE: &[&str] = &[STATUS, BALANCE, DEPOSIT, FEE_TIERS, EXIT, EXIT_TRANSACTIONS, ACTIONS];
pub const WRITABLE: &[&str] = &[
    CLASSIFY, FEE_ESTIMATE, WITHDRAW, WITHDRAW_VALIDATE, SYNC,
    EXIT_EXECUTE, EXIT_TIMELOCK, EXIT_DOWNLOAD, EXIT_BROADCAST,
];

/// Normalize `wallet/balance`, `/balance/` and `` to a leading-slash path.
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        STATUS.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize("balance"), "/balance");
        assert_eq!(normalize("/exit/transactions/"), "/exit/transactions");
        assert_eq!(normalize(""), "/status");
        assert_eq!(normalize("/"), "/status");
    }
}

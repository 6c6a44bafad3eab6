//! Exit - emergency exit availability as a function of time
//!
//! Two ways out when the Ark service stops cooperating:
//!
//! - **Pre-signed exit**: a transaction signed in advance, broadcastable at any time.
//! - **Timelock exit**: after `timelock_expiry` the funds become unilaterally spendable.
//!
//! State is derived from `ExitInfo` and the clock on every read. Nothing is cached,
//! so a status can never go stale against the wall clock.
//!
//! | State | Condition |
//! |-------|-----------|
//! | `FullyUnlocked` | `now >= timelock_expiry` |
//! | `Protected` | locked, pre-signed exit present |
//! | `Limited` | locked, no pre-signed exit |

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Exit facts owned by the wallet backend. Read-only here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitInfo {
    #[serde(default)]
    pub has_pre_signed_exit: bool,
    #[serde(default)]
    pub timelock_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timelock_expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitState { FullyUnlocked, Protected, Limited }

impl ExitState {
    pub fn as_str(&self) -> &'static str {
        match self { ExitState::FullyUnlocked => "fully_unlocked", ExitState::Protected => "protected", ExitState::Limited => "limited" }
    }
}

/// Which exit controls are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitActions {
    pub execute_emergency_exit: bool,
    pub use_timelock_exit: bool,
    pub download_exit_transactions: bool,
}

impl ExitInfo {
    /// Timelock expiry must not precede its start.
    pub fn is_consistent(&self) -> bool {
        match (self.timelock_start, self.timelock_expiry) {
            (Some(start), Some(expiry)) => expiry >= start,
            _ => true,
        }
    }

    /// True once the timelock has expired. No expiry means never.
    pub fn is_unlocked(&self, now: DateTime<Utc>) -> bool {
        self.timelock_expiry.is_some_and(|expiry| now >= expiry)
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> ExitState {
        if self.is_unlocked(now) {
            ExitState::FullyUnlocked
        } else if self.has_pre_signed_exit {
            ExitState::Protected
        } else {
            ExitState::Limited
        }
    }

    pub fn actions_at(&self, now: DateTime<Utc>) -> ExitActions {
        ExitActions {
            execute_emergency_exit: self.has_pre_signed_exit,
            use_timelock_exit: self.is_unlocked(now),
            download_exit_transactions: self.has_pre_signed_exit,
        }
    }

    /// Elapsed share of the timelock window, 0-100. Display only.
    pub fn timelock_progress(&self, now: DateTime<Utc>) -> u8 {
        let Some(expiry) = self.timelock_expiry else { return 0 };
        if now >= expiry {
            return 100;
        }
        let Some(start) = self.timelock_start else { return 0 };
        let span = (expiry - start).num_milliseconds();
        // A zero-length window opens as soon as it starts.
        if span <= 0 {
            return 100;
        }
        let elapsed = (now - start).num_milliseconds();
        (elapsed.saturating_mul(100) / span).clamp(0, 100) as u8
    }

    /// Time left until the timelock opens; zero once expired, `None` without expiry.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.timelock_expiry.map(|expiry| if now >= expiry { Duration::zero() } else { expiry - now })
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> ExitStatus {
        ExitStatus {
            state: self.state_at(now),
            actions: self.actions_at(now),
            progress: self.timelock_progress(now),
            has_pre_signed_exit: self.has_pre_signed_exit,
            timelock_start: self.timelock_start,
            timelock_expiry: self.timelock_expiry,
            remaining_secs: self.time_remaining(now).map(|d| d.num_seconds()),
        }
    }
}

/// Display snapshot of the exit panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    pub state: ExitState,
    pub actions: ExitActions,
    pub progress: u8,
    pub has_pre_signed_exit: bool,
    pub timelock_start: Option<DateTime<Utc>>,
    pub timelock_expiry: Option<DateTime<Utc>>,
    pub remaining_secs: Option<i64>,
}

/// A pre-signed exit transaction available for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitTransaction {
    pub id: String,
    pub amount: u64,
    pub address: String,
    pub created: DateTime<Utc>,
}

/// Exit transactions keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitTransactions(BTreeMap<String, ExitTransaction>);

impl ExitTransactions {
    pub fn get(&self, id: &str) -> Option<&ExitTransaction> { self.0.get(id) }
    pub fn contains(&self, id: &str) -> bool { self.0.contains_key(id) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &ExitTransaction> { self.0.values() }
    pub fn total_amount(&self) -> u64 { self.0.values().fold(0u64, |acc, tx| acc.saturating_add(tx.amount)) }
}

impl FromIterator<ExitTransaction> for ExitTransactions {
    fn from_iter<I: IntoIterator<Item = ExitTransaction>>(iter: I) -> Self {
        Self(iter.into_iter().map(|tx| (tx.id.clone(), tx)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap() }

    fn info(pre_signed: bool, start: Option<i64>, expiry: Option<i64>) -> ExitInfo {
        ExitInfo { has_pre_signed_exit: pre_signed, timelock_start: start.map(at), timelock_expiry: expiry.map(at) }
    }

    #[test]
    fn protected_before_expiry_with_pre_signed_exit() {
        let exit = info(true, Some(0), Some(1_000));
        let now = at(100);
        assert_eq!(exit.state_at(now), ExitState::Protected);
        let actions = exit.actions_at(now);
        assert!(actions.execute_emergency_exit);
        assert!(!actions.use_timelock_exit);
        assert!(actions.download_exit_transactions);
    }

    #[test]
    fn limited_without_pre_signed_exit() {
        let exit = info(false, Some(0), Some(1_000));
        assert_eq!(exit.state_at(at(500)), ExitState::Limited);
        assert_eq!(exit.actions_at(at(500)), ExitActions {
            execute_emergency_exit: false,
            use_timelock_exit: false,
            download_exit_transactions: false,
        });
    }

    #[test]
    fn past_expiry_is_fully_unlocked_either_way() {
        for pre_signed in [true, false] {
            let exit = info(pre_signed, Some(0), Some(1_000));
            assert_eq!(exit.state_at(at(1_000)), ExitState::FullyUnlocked);
            assert_eq!(exit.state_at(at(5_000)), ExitState::FullyUnlocked);
            assert_eq!(exit.timelock_progress(at(5_000)), 100);
            assert!(exit.actions_at(at(5_000)).use_timelock_exit);
            assert_eq!(exit.actions_at(at(5_000)).execute_emergency_exit, pre_signed);
        }
    }

    #[test]
    fn missing_expiry_never_unlocks() {
        let exit = info(true, Some(0), None);
        assert_eq!(exit.state_at(at(i32::MAX as i64)), ExitState::Protected);
        assert_eq!(exit.timelock_progress(at(10)), 0);
        assert_eq!(exit.time_remaining(at(10)), None);
    }

    #[test]
    fn progress_is_floored_and_clamped() {
        let exit = info(false, Some(0), Some(300));
        assert_eq!(exit.timelock_progress(at(-50)), 0);
        assert_eq!(exit.timelock_progress(at(0)), 0);
        assert_eq!(exit.timelock_progress(at(1)), 0);
        assert_eq!(exit.timelock_progress(at(100)), 33);
        assert_eq!(exit.timelock_progress(at(299)), 99);
        assert_eq!(exit.timelock_progress(at(300)), 100);
    }

    #[test]
    fn zero_length_window_does_not_divide_by_zero() {
        let exit = info(false, Some(50), Some(50));
        assert_eq!(exit.timelock_progress(at(49)), 100);
        assert_eq!(exit.timelock_progress(at(50)), 100);
        let inverted = info(false, Some(60), Some(50));
        assert_eq!(inverted.timelock_progress(at(40)), 100);
    }

    #[test]
    fn missing_start_reports_zero_until_expiry() {
        let exit = info(false, None, Some(100));
        assert_eq!(exit.timelock_progress(at(99)), 0);
        assert_eq!(exit.timelock_progress(at(100)), 100);
    }

    #[test]
    fn remaining_time_counts_down_to_zero() {
        let exit = info(true, Some(0), Some(3_600));
        assert_eq!(exit.time_remaining(at(600)), Some(Duration::seconds(3_000)));
        assert_eq!(exit.time_remaining(at(7_200)), Some(Duration::zero()));
    }

    #[test]
    fn consistency_requires_ordered_window() {
        assert!(info(true, Some(0), Some(10)).is_consistent());
        assert!(info(true, None, Some(10)).is_consistent());
        assert!(!info(true, Some(10), Some(0)).is_consistent());
    }

    #[test]
    fn status_snapshot_serializes() {
        let status = info(true, Some(0), Some(1_000)).status_at(at(250));
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["state"], "protected");
        assert_eq!(value["progress"], 25);
        assert_eq!(value["remaining_secs"], 750);
        assert_eq!(value["actions"]["use_timelock_exit"], false);
    }

    #[test]
    fn exit_transactions_keyed_by_id() {
        let txs: ExitTransactions = vec![
            ExitTransaction { id: "a".into(), amount: 1_000, address: "bc1qa".into(), created: at(0) },
            ExitTransaction { id: "b".into(), amount: 2_000, address: "bc1qb".into(), created: at(1) },
            ExitTransaction { id: "a".into(), amount: 1_500, address: "bc1qa".into(), created: at(2) },
        ]
        .into_iter()
        .collect();
        assert_eq!(txs.len(), 2);
        assert!(txs.contains("b"));
        assert!(!txs.contains("unknown-id"));
        assert_eq!(txs.get("a").map(|t| t.amount), Some(1_500));
        assert_eq!(txs.total_amount(), 3_500);
    }

    #[test]
    fn total_amount_saturates() {
        let txs: ExitTransactions = vec![
            ExitTransaction { id: "a".into(), amount: u64::MAX, address: "bc1qa".into(), created: at(0) },
            ExitTransaction { id: "b".into(), amount: 2_000, address: "bc1qb".into(), created: at(1) },
        ]
        .into_iter()
        .collect();
        assert_eq!(txs.total_amount(), u64::MAX);
    }
}

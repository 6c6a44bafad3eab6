//! Wallet module - withdrawal intent engine
//!
//! Pure functions that turn what the user typed into a dispatch-ready plan.
//! Nothing here talks to the backend; the `Panel` does that.
//!
//! # Pipeline
//!
//! ```text
//! WithdrawalIntent {address, amount, method, fee_rate}
//!     │
//!     ├── address::resolve_method   → OnChain | OffChain   (or address error)
//!     ├── amount > 0                                       (or amount error)
//!     ├── fee::estimate_fee         → fee = rate × 225 vB
//!     └── amount + fee ≤ available                         (or amount error)
//!     │
//!     ▼
//! WithdrawalPlan {method, fee, total}
//! ```
//!
//! # Prefixes
//!
//! | Prefix | Domain |
//! |--------|--------|
//! | `bc1`, `tb1` | on-chain (Bitcoin) |
//! | `ark1`, `tark1` | off-chain (Ark) |

pub mod address;
pub mod balance;
pub mod fee;
pub mod withdraw;

pub use address::{classify, resolve_method, suggest_method, Domain, SettlementMethod};
pub use balance::{Balance, DepositAddresses};
pub use fee::{estimate_default_fee, estimate_fee, FeeTier, DEFAULT_TX_VBYTES};
pub use withdraw::{validate, WithdrawalIntent, WithdrawalPlan};

//! Arkpanel: deposit, withdrawal and emergency-exit engine for a Bitcoin/Ark wallet panel.
//!
//! # Architecture
//!
//! ```text
//! UI (forms, modals, QR, toasts)  ── out of scope
//!   │
//!   ├── PanelNamespace / HTTP router / CLI
//!   │
//!   └── Panel
//!         ├── wallet::validate      (address → method, fee, balance)
//!         ├── exit::ExitInfo        (derived exit state + enabled actions)
//!         ├── InFlight              (one outstanding call per action)
//!         ├── BalancePoller         (periodic refresh, cancellable)
//!         └── WalletBackend         (external: send, broadcast, exit)
//! ```
//!
//! # Settlement
//!
//! | Prefix | Method | Backend call |
//! |--------|--------|--------------|
//! | `bc1`, `tb1` | on-chain | `send_onchain` |
//! | `ark1`, `tark1` | off-chain (Ark) | `send_offchain` |
//! | any, method `auto` | resolved from prefix | `send_auto` |
//!
//! # Features
//!
//! - `native` (default) - tokio, panel orchestration, HTTP server, CLI, logging
//!
//! # Usage
//!
//! ```ignore
//! use arkpanel::{Panel, PanelConfig, WithdrawalIntent, MemoryBackend, MemoryState};
//! use std::sync::Arc;
//!
//! let panel = Panel::new(Arc::new(MemoryBackend::new(MemoryState::default())), PanelConfig::default());
//! panel.refresh_balance().await?;
//! let receipt = panel.withdraw(&WithdrawalIntent::new("bc1q...", 10_000)).await?;
//! println!("{}", receipt.txid);
//! ```

// =============================================================================
// Shared modules (pure engine, no runtime)
// =============================================================================
pub mod backend;
pub mod core;
pub mod error;
pub mod exit;
pub mod wallet;

// =============================================================================
// Native-only modules (tokio, server, CLI, filesystem)
// =============================================================================
#[cfg(feature = "native")]
pub mod config;
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod namespaces;
#[cfg(feature = "native")]
pub mod panel;
#[cfg(feature = "native")]
pub mod runtime;
#[cfg(feature = "native")]
pub mod server;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use backend::WalletBackend;
pub use crate::core::inflight::{Action, InFlight, OpState};
pub use error::{PanelError, Result};
pub use exit::{ExitActions, ExitInfo, ExitState, ExitStatus, ExitTransaction, ExitTransactions};
pub use wallet::{
    classify, estimate_default_fee, estimate_fee, resolve_method, suggest_method, validate, Balance, DepositAddresses,
    Domain, FeeTier, SettlementMethod, WithdrawalIntent, WithdrawalPlan, DEFAULT_TX_VBYTES,
};

// =============================================================================
// Re-exports: Native
// =============================================================================
#[cfg(feature = "native")]
pub use backend::memory::{MemoryBackend, MemoryState};
#[cfg(feature = "native")]
pub use config::PanelConfig;
#[cfg(feature = "native")]
pub use namespaces::PanelNamespace;
#[cfg(feature = "native")]
pub use panel::{BalancePoller, Panel, WithdrawalReceipt};
#[cfg(feature = "native")]
pub use runtime::{install_signal_handlers, Shutdown};
#[cfg(feature = "native")]
pub use server::{create_router, create_router_with_name};

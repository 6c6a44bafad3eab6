//! Error types for the panel engine

use thiserror::Error;

use crate::core::inflight::Action;
use crate::wallet::address::{Domain, SettlementMethod};

/// Result type alias using the panel error
pub type Result<T> = std::result::Result<T, PanelError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    // Address errors
    #[error("address is required")]
    EmptyAddress,

    #[error("invalid address format: must start with tb1/bc1/tark1/ark1")]
    InvalidAddressFormat,

    #[error("address does not match {requested} method (detected {domain})")]
    AddressMethodMismatch { requested: SettlementMethod, domain: Domain },

    // Amount / fee errors
    #[error("amount {0}")]
    Amount(String),

    #[error("fee rate {0} sat/vB is out of range (1-25)")]
    InvalidFeeRate(u64),

    // Emergency exit errors
    #[error("no exit address: provide one or configure an on-chain deposit address")]
    NoExitAddress,

    #[error("unknown exit transaction: {0}")]
    UnknownExitTransaction(String),

    #[error("no pre-signed exit transaction available")]
    ExitUnavailable,

    #[error("timelock has not expired yet")]
    TimelockActive,

    // Concurrency
    #[error("{0} already in flight")]
    Busy(Action),

    // Backend
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    // Surface errors
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown path: {0}")]
    UnknownPath(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PanelError {
    /// Form field a validation error belongs to.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            PanelError::EmptyAddress
            | PanelError::InvalidAddressFormat
            | PanelError::AddressMethodMismatch { .. }
            | PanelError::NoExitAddress => Some("address"),
            PanelError::Amount(_) => Some("amount"),
            PanelError::InvalidFeeRate(_) => Some("fee_rate"),
            _ => None,
        }
    }

    /// Local, recoverable errors raised before anything reaches the backend.
    pub fn is_validation(&self) -> bool {
        self.field().is_some()
            || matches!(
                self,
                PanelError::UnknownExitTransaction(_) | PanelError::ExitUnavailable | PanelError::TimelockActive
            )
    }

    pub fn is_address_error(&self) -> bool {
        matches!(
            self,
            PanelError::EmptyAddress | PanelError::InvalidAddressFormat | PanelError::AddressMethodMismatch { .. }
        )
    }

    pub(crate) fn dispatch(err: anyhow::Error) -> Self {
        PanelError::Dispatch(format!("{:#}", err))
    }
}

//! Address classification - prefix dispatch to a settlement domain
//!
//! Prefixes are the entire contract with the address-format domain. Checksum,
//! length and network checks belong to the backend that executes the send.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PanelError, Result};

pub const ONCHAIN_PREFIXES: &[&str] = &["tb1", "bc1"];
pub const OFFCHAIN_PREFIXES: &[&str] = &["tark1", "ark1"];

/// Settlement domain of a destination address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain { OnChain, OffChain, Unknown }

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self { Domain::OnChain => "onchain", Domain::OffChain => "offchain", Domain::Unknown => "unknown" }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// How a withdrawal settles. `Auto` infers from the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementMethod { #[default] Auto, OnChain, OffChain }

impl SettlementMethod {
    pub fn as_str(&self) -> &'static str {
        match self { SettlementMethod::Auto => "auto", SettlementMethod::OnChain => "onchain", SettlementMethod::OffChain => "offchain" }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Some(SettlementMethod::Auto),
            "onchain" | "on-chain" | "bitcoin" => Some(SettlementMethod::OnChain),
            "offchain" | "off-chain" | "ark" => Some(SettlementMethod::OffChain),
            _ => None,
        }
    }
}

impl fmt::Display for SettlementMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Classify a destination by prefix. Case-sensitive.
pub fn classify(address: &str) -> Result<Domain> {
    if address.trim().is_empty() {
        return Err(PanelError::EmptyAddress);
    }
    if ONCHAIN_PREFIXES.iter().any(|p| address.starts_with(p)) {
        Ok(Domain::OnChain)
    } else if OFFCHAIN_PREFIXES.iter().any(|p| address.starts_with(p)) {
        Ok(Domain::OffChain)
    } else {
        Ok(Domain::Unknown)
    }
}

/// Resolve the concrete settlement method for `address`. Never returns `Auto`.
pub fn resolve_method(address: &str, requested: SettlementMethod) -> Result<SettlementMethod> {
    let domain = classify(address)?;
    match (requested, domain) {
        (SettlementMethod::Auto, Domain::OnChain) => Ok(SettlementMethod::OnChain),
        (SettlementMethod::Auto, Domain::OffChain) => Ok(SettlementMethod::OffChain),
        (SettlementMethod::Auto, Domain::Unknown) => Err(PanelError::InvalidAddressFormat),
        (SettlementMethod::OnChain, Domain::OnChain) => Ok(SettlementMethod::OnChain),
        (SettlementMethod::OffChain, Domain::OffChain) => Ok(SettlementMethod::OffChain),
        (requested, domain) => Err(PanelError::AddressMethodMismatch { requested, domain }),
    }
}

/// Method to pre-select while the user is still typing.
///
/// Unrecognized or empty input falls back to `Auto`; the error surfaces on submit.
pub fn suggest_method(address: &str) -> SettlementMethod {
    match classify(address) {
        Ok(Domain::OnChain) => SettlementMethod::OnChain,
        Ok(Domain::OffChain) => SettlementMethod::OffChain,
        _ => SettlementMethod::Auto,
    }
}

//! Wallet error types.

use satchel_core::error::{AddressError, FetchError};
use thiserror::Error;

/// Errors that can occur in derivation and UTXO selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Mnemonic failed validation (unknown word, wrong count, bad checksum).
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Address format name not recognized.
    #[error("unsupported address format: {0}")]
    UnsupportedFormat(String),

    /// Derivation path string could not be parsed.
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    /// BIP-32 child derivation produced an invalid key.
    #[error("key derivation: {0}")]
    KeyDerivation(String),

    /// Fewer spendable outputs than the selector requires.
    #[error("insufficient UTXOs: found {found}, required {required} ({excluded} excluded with attached assets)")]
    InsufficientUtxos {
        /// Spendable outputs remaining after filtering.
        found: usize,
        /// Configured minimum.
        required: usize,
        /// Outputs dropped because they carry attached balances.
        excluded: usize,
    },

    /// Selector limits that no selection can satisfy.
    #[error("invalid selector config: {0}")]
    InvalidSelectorConfig(String),

    /// An external lookup failed; no partial result is returned.
    #[error("fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    /// Sum of selected values exceeds `u64`.
    #[error("UTXO value sum overflows u64")]
    ValueOverflow,

    /// Address encoding error from satchel-core.
    #[error(transparent)]
    Address(#[from] AddressError),
}

//! # satchel-wallet: mnemonic key derivation and asset-aware UTXO selection.
//!
//! Derives keys and addresses from BIP-39 and legacy Counterwallet
//! mnemonics, and selects spendable outputs for an address while skipping
//! outputs that carry attached token balances.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`wordlist`]: Counterwallet 1626-word mnemonic codec
//! - [`path`]: BIP-32 derivation paths and per-format defaults
//! - [`keys`]: Seed and BIP-32 extended private keys
//! - [`mnemonic`]: Mnemonic to seed for either scheme
//! - [`derivation`]: Mnemonic + path + format to address
//! - [`utxo_selection`]: UTXO filtering, ordering, and capping
//! - [`client`]: HTTP `UtxoSource` (Esplora + Counterparty)

pub mod client;
pub mod derivation;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod path;
pub mod utxo_selection;
pub mod wordlist;

// Re-exports for convenient access
pub use client::{HttpSourceConfig, HttpUtxoSource};
pub use derivation::{derive_address, derive_address_for, derive_public_key};
pub use error::WalletError;
pub use keys::{ExtendedPrivateKey, Seed};
pub use path::{ChildNumber, DerivationPath, path_for_format, path_for_format_name};
pub use utxo_selection::{SelectorConfig, UtxoSelection, UtxoSelector, select_from};

//! Mnemonic to seed conversion for both supported schemes.

use bip39::{Language, Mnemonic};

use satchel_core::address::AddressFormat;

use crate::error::WalletError;
use crate::keys::Seed;
use crate::wordlist;

/// BIP-39 seed (English word list, empty passphrase, 64 bytes).
///
/// Normalizes whitespace and converts to lowercase before parsing.
pub fn bip39_seed(phrase: &str) -> Result<Seed, WalletError> {
    let normalized = phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let m = Mnemonic::parse_in(Language::English, &normalized)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(Seed::from_bytes(m.to_seed("").to_vec()))
}

/// Seed for `format`: Counterwallet formats use the legacy word codec,
/// everything else BIP-39.
pub fn seed_for_format(phrase: &str, format: AddressFormat) -> Result<Seed, WalletError> {
    if format.is_counterwallet() {
        wordlist::to_seed(phrase).map(Seed::from_bytes)
    } else {
        bip39_seed(phrase)
    }
}

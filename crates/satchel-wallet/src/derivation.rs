//! Mnemonic + path + format to public key and address.

use tracing::debug;

use satchel_core::address::{Address, AddressFormat, Network};
use satchel_core::crypto::PublicKey;

use crate::error::WalletError;
use crate::keys::ExtendedPrivateKey;
use crate::mnemonic::seed_for_format;
use crate::path::DerivationPath;

/// Derive the compressed public key at `path`.
///
/// The path is parsed before the mnemonic is touched, so a bad path is
/// always reported as `InvalidPath` even when the mnemonic is also bad.
pub fn derive_public_key(
    mnemonic: &str,
    path: &str,
    format: AddressFormat,
) -> Result<PublicKey, WalletError> {
    let path: DerivationPath = path.parse()?;
    let seed = seed_for_format(mnemonic, format)?;
    let master = ExtendedPrivateKey::master(&seed)?;
    let key = master.derive_path(&path)?;
    debug!(%format, %path, depth = key.depth(), "derived key");
    Ok(key.public_key())
}

/// Derive a mainnet address.
pub fn derive_address(
    mnemonic: &str,
    path: &str,
    format: AddressFormat,
) -> Result<String, WalletError> {
    derive_address_for(Network::Mainnet, mnemonic, path, format).map(|a| a.encode())
}

/// Derive an address on `network`.
pub fn derive_address_for(
    network: Network,
    mnemonic: &str,
    path: &str,
    format: AddressFormat,
) -> Result<Address, WalletError> {
    let pubkey = derive_public_key(mnemonic, path, format)?;
    let address = Address::from_public_key(pubkey.as_bytes(), format, network)?;
    debug!(%format, ?network, %address, "derived address");
    Ok(address)
}

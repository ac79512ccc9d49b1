//! Seeds and BIP-32 extended private keys.
//!
//! Only private derivation (CKDpriv) is implemented; every address needs
//! the full path from the master key anyway. Secret material is wiped when
//! the owning value is dropped.

use hmac::{Hmac, Mac};
use secp256k1::{Scalar, SecretKey};
use sha2::Sha512;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use satchel_core::crypto::{PublicKey, hash160, secp};

use crate::error::WalletError;
use crate::path::{ChildNumber, DerivationPath};

type HmacSha512 = Hmac<Sha512>;

/// HMAC key for master key generation (BIP-32).
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Seed bytes for BIP-32 master key generation.
///
/// BIP-39 mnemonics produce 64 bytes; Counterwallet mnemonics produce
/// 4 bytes per word triple.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: Vec<u8>,
}

impl Seed {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Clone for Seed {
    fn clone(&self) -> Self {
        Self {
            bytes: self.bytes.clone(),
        }
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A BIP-32 extended private key.
pub struct ExtendedPrivateKey {
    secret: SecretKey,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: u32,
}

impl ExtendedPrivateKey {
    /// `I = HMAC-SHA512(key = "Bitcoin seed", data = seed)`.
    pub fn master(seed: &Seed) -> Result<Self, WalletError> {
        let mut i = hmac_sha512(MASTER_HMAC_KEY, seed.as_bytes())?;
        let result = split_key(&i).map(|(secret, chain_code)| Self {
            secret,
            chain_code,
            depth: 0,
            parent_fingerprint: [0; 4],
            child_number: 0,
        });
        i.zeroize();
        result.map_err(|_| WalletError::KeyDerivation("master key out of range".into()))
    }

    /// CKDpriv for a single child.
    pub fn derive_child(&self, child: ChildNumber) -> Result<Self, WalletError> {
        let index = child.to_u32();
        let mut data = Vec::with_capacity(37);
        if child.is_hardened() {
            data.push(0x00);
            data.extend_from_slice(&self.secret.secret_bytes());
        } else {
            data.extend_from_slice(&self.secp_public_key().serialize());
        }
        data.extend_from_slice(&index.to_be_bytes());

        let mut i = hmac_sha512(&self.chain_code, &data)?;
        data.zeroize();

        let mut il = [0u8; 32];
        il.copy_from_slice(&i[..32]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&i[32..]);
        i.zeroize();

        let tweak = Scalar::from_be_bytes(il);
        il.zeroize();
        let secret = tweak
            .map_err(|_| WalletError::KeyDerivation(format!("child {child}: IL out of range")))
            .and_then(|t| {
                self.secret.add_tweak(&t).map_err(|_| {
                    WalletError::KeyDerivation(format!("child {child}: derived key is zero"))
                })
            });
        let secret = match secret {
            Ok(secret) => secret,
            Err(e) => {
                chain_code.zeroize();
                return Err(e);
            }
        };

        Ok(Self {
            secret,
            chain_code,
            depth: self.depth.saturating_add(1),
            parent_fingerprint: self.fingerprint(),
            child_number: index,
        })
    }

    /// Derive along `path` starting from this key.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, WalletError> {
        let mut current = self.clone_key();
        for &child in path.children() {
            current = current.derive_child(child)?;
        }
        Ok(current)
    }

    fn secp_public_key(&self) -> secp256k1::PublicKey {
        secp256k1::PublicKey::from_secret_key(secp(), &self.secret)
    }

    /// Compressed public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secp(&self.secp_public_key(), true)
    }

    /// Uncompressed public key (65 bytes).
    pub fn public_key_uncompressed(&self) -> PublicKey {
        PublicKey::from_secp(&self.secp_public_key(), false)
    }

    /// First four bytes of HASH160 of the compressed public key.
    pub fn fingerprint(&self) -> [u8; 4] {
        let hash = hash160(&self.secp_public_key().serialize());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn child_number(&self) -> u32 {
        self.child_number
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    fn clone_key(&self) -> Self {
        Self {
            secret: self.secret,
            chain_code: self.chain_code,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
        }
    }
}

impl Drop for ExtendedPrivateKey {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
        self.chain_code.zeroize();
    }
}

impl fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPrivateKey")
            .field("depth", &self.depth)
            .field("child_number", &self.child_number)
            .field("public_key", &self.public_key())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<[u8; 64], WalletError> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| WalletError::KeyDerivation(format!("HMAC-SHA512 key init failed: {e}")))?;
    mac.update(data);
    let result = mac.finalize().into_bytes();

    let mut output = [0u8; 64];
    output.copy_from_slice(&result);
    Ok(output)
}

fn split_key(i: &[u8; 64]) -> Result<(SecretKey, [u8; 32]), secp256k1::Error> {
    let secret = SecretKey::from_slice(&i[..32])?;
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&i[32..]);
    Ok((secret, chain_code))
}

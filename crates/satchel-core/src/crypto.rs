//! secp256k1 public keys and the hash functions addresses are built from.
//!
//! Provides HASH160 (RIPEMD-160 of SHA-256), double SHA-256 for Base58Check
//! checksums, BIP340 tagged hashes, and the BIP341 key-path tweak used by
//! taproot outputs that commit to no script tree.

use ripemd::Ripemd160;
use secp256k1::{All, Scalar, Secp256k1, XOnlyPublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;

use crate::constants::{
    COMPRESSED_PUBKEY_LEN, HASH160_LEN, TAP_TWEAK_TAG, UNCOMPRESSED_PUBKEY_LEN, XONLY_PUBKEY_LEN,
};
use crate::error::CryptoError;

/// Shared verification/signing context. Immutable after first use.
pub fn secp() -> &'static Secp256k1<All> {
    static SECP: OnceLock<Secp256k1<All>> = OnceLock::new();
    SECP.get_or_init(Secp256k1::new)
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD-160 of SHA-256.
pub fn hash160(data: &[u8]) -> [u8; HASH160_LEN] {
    Ripemd160::digest(sha256(data)).into()
}

/// BIP340 tagged hash: `SHA256(SHA256(tag) || SHA256(tag) || msg)`.
pub fn tagged_hash(tag: &str, msg: &[u8]) -> [u8; 32] {
    let tag_hash = sha256(tag.as_bytes());
    let mut hasher = Sha256::new();
    hasher.update(tag_hash);
    hasher.update(tag_hash);
    hasher.update(msg);
    hasher.finalize().into()
}

/// A validated secp256k1 public key in SEC1 form.
///
/// Keeps the encoding it was created with: 33-byte compressed or 65-byte
/// uncompressed. Legacy addresses hash whichever encoding the key carries,
/// so the two forms of the same point produce different P2PKH addresses.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Parse and validate SEC1 bytes (33 or 65 bytes, on the curve).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        match bytes.len() {
            COMPRESSED_PUBKEY_LEN | UNCOMPRESSED_PUBKEY_LEN => {}
            len => return Err(CryptoError::InvalidPublicKeyLength(len)),
        }
        secp256k1::PublicKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Wrap a library point, choosing the serialization.
    pub fn from_secp(key: &secp256k1::PublicKey, compressed: bool) -> Self {
        let bytes = if compressed {
            key.serialize().to_vec()
        } else {
            key.serialize_uncompressed().to_vec()
        };
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_compressed(&self) -> bool {
        self.bytes.len() == COMPRESSED_PUBKEY_LEN
    }

    /// HASH160 of the serialized key.
    pub fn pubkey_hash(&self) -> [u8; HASH160_LEN] {
        hash160(&self.bytes)
    }

    /// The 32-byte x coordinate, dropping parity.
    pub fn x_only(&self) -> [u8; XONLY_PUBKEY_LEN] {
        let mut out = [0u8; XONLY_PUBKEY_LEN];
        out.copy_from_slice(&self.bytes[1..1 + XONLY_PUBKEY_LEN]);
        out
    }

    /// Re-encode as a 33-byte compressed key.
    pub fn to_compressed(&self) -> Self {
        match secp256k1::PublicKey::from_slice(&self.bytes) {
            Ok(key) => Self::from_secp(&key, true),
            // Unreachable for keys built through the validating constructors.
            Err(_) => self.clone(),
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.bytes))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.bytes))
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.bytes))
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Self::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Compute the BIP341 output key for a key-path-only taproot output.
///
/// Accepts a 32-byte x-only key or a 33/65-byte SEC1 key. The tweak is
/// `t = tagged_hash("TapTweak", P.x)` and the output key is `P + t*G`,
/// returned x-only.
pub fn taproot_output_key(pubkey: &[u8]) -> Result<[u8; XONLY_PUBKEY_LEN], CryptoError> {
    let internal = match pubkey.len() {
        XONLY_PUBKEY_LEN => {
            XOnlyPublicKey::from_slice(pubkey).map_err(|_| CryptoError::InvalidPublicKey)?
        }
        COMPRESSED_PUBKEY_LEN | UNCOMPRESSED_PUBKEY_LEN => {
            let full = secp256k1::PublicKey::from_slice(pubkey)
                .map_err(|_| CryptoError::InvalidPublicKey)?;
            full.x_only_public_key().0
        }
        len => return Err(CryptoError::InvalidPublicKeyLength(len)),
    };

    let tweak = tagged_hash(TAP_TWEAK_TAG, &internal.serialize());
    let scalar = Scalar::from_be_bytes(tweak).map_err(|_| CryptoError::InvalidTweak)?;
    let (output, _parity) = internal
        .add_tweak(secp(), &scalar)
        .map_err(|_| CryptoError::InvalidTweak)?;
    Ok(output.serialize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERATOR: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256d_differs_from_single() {
        assert_ne!(sha256d(b"abc"), sha256(b"abc"));
        assert_eq!(sha256d(b"abc"), sha256(&sha256(b"abc")));
    }

    #[test]
    fn hash160_of_generator() {
        let g = hex::decode(GENERATOR).unwrap();
        assert_eq!(
            hex::encode(hash160(&g)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn hash160_of_empty_input() {
        assert_eq!(
            hex::encode(hash160(&[])),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }

    #[test]
    fn tagged_hash_depends_on_tag() {
        assert_ne!(tagged_hash("TapTweak", b"x"), tagged_hash("TapLeaf", b"x"));
    }

    #[test]
    fn public_key_rejects_bad_length() {
        assert_eq!(
            PublicKey::from_slice(&[2u8; 32]).unwrap_err(),
            CryptoError::InvalidPublicKeyLength(32)
        );
        assert_eq!(
            PublicKey::from_slice(&[]).unwrap_err(),
            CryptoError::InvalidPublicKeyLength(0)
        );
    }

    #[test]
    fn public_key_rejects_off_curve() {
        let mut bytes = [0xFFu8; 33];
        bytes[0] = 0x02;
        assert_eq!(
            PublicKey::from_slice(&bytes).unwrap_err(),
            CryptoError::InvalidPublicKey
        );
    }

    #[test]
    fn public_key_compressed_and_uncompressed() {
        let g = hex::decode(GENERATOR).unwrap();
        let pk = PublicKey::from_slice(&g).unwrap();
        assert!(pk.is_compressed());

        let full = secp256k1::PublicKey::from_slice(&g).unwrap();
        let uncompressed = PublicKey::from_secp(&full, false);
        assert_eq!(uncompressed.as_bytes().len(), 65);
        assert_eq!(uncompressed.as_bytes()[0], 0x04);
        assert_eq!(uncompressed.to_compressed(), pk);
        assert_eq!(uncompressed.x_only(), pk.x_only());
        assert_ne!(uncompressed.pubkey_hash(), pk.pubkey_hash());
    }

    #[test]
    fn public_key_display_and_serde() {
        let g = hex::decode(GENERATOR).unwrap();
        let pk = PublicKey::from_slice(&g).unwrap();
        assert_eq!(pk.to_string(), GENERATOR);
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{GENERATOR}\""));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
    }

    #[test]
    fn taproot_tweak_bip341_vector() {
        let internal =
            hex::decode("d6889cb081036e0faefa3a35157ad71086b123b2b144b649798b494c300a961d")
                .unwrap();
        assert_eq!(
            hex::encode(taproot_output_key(&internal).unwrap()),
            "53a1f6e454df1aa2776a2814a721372d6258050de330b3c6d10ee8f4e0dda343"
        );
    }

    #[test]
    fn taproot_tweak_ignores_parity_byte() {
        let g = hex::decode(GENERATOR).unwrap();
        let mut odd = g.clone();
        odd[0] = 0x03;
        assert_eq!(
            taproot_output_key(&g).unwrap(),
            taproot_output_key(&odd).unwrap()
        );
        assert_eq!(
            taproot_output_key(&g).unwrap(),
            taproot_output_key(&g[1..]).unwrap()
        );
    }

    #[test]
    fn taproot_tweak_rejects_garbage() {
        assert_eq!(
            taproot_output_key(&[1u8; 20]).unwrap_err(),
            CryptoError::InvalidPublicKeyLength(20)
        );
        assert_eq!(
            taproot_output_key(&[0xFFu8; 32]).unwrap_err(),
            CryptoError::InvalidPublicKey
        );
    }
}

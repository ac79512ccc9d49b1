//! Address encoding for Bitcoin's standard output types.
//!
//! Four payload kinds cover the six wallet address formats:
//! - P2PKH and P2SH use Base58Check with a network version byte (`1...`, `3...`)
//! - segwit v0 key hashes use Bech32 ([BIP-173]) (`bc1q...`)
//! - taproot outputs use Bech32m ([BIP-350]) (`bc1p...`)
//!
//! The legacy Counterwallet formats reuse the P2PKH and P2WPKH encodings;
//! they differ only in how the key is derived.
//!
//! [BIP-173]: https://github.com/bitcoin/bips/blob/master/bip-0173.mediawiki
//! [BIP-350]: https://github.com/bitcoin/bips/blob/master/bip-0350.mediawiki

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    BASE58_ALPHABET, BASE58_MAX_LEN, BASE58_MIN_LEN, BASE58CHECK_DECODED_LEN, BECH32_MAX_LEN,
    COMPRESSED_PUBKEY_LEN, HASH160_LEN, PUBKEY_ADDRESS_VERSION_MAIN, PUBKEY_ADDRESS_VERSION_TEST,
    SCRIPT_ADDRESS_VERSION_MAIN, SCRIPT_ADDRESS_VERSION_TEST, UNCOMPRESSED_PUBKEY_LEN,
    XONLY_PUBKEY_LEN,
};
use crate::crypto::{hash160, sha256d, taproot_output_key};
use crate::error::AddressError;
use crate::script;

/// Bech32 checksum constant (BIP-173).
const BECH32_CONST: u32 = 1;

/// Bech32m checksum constant (BIP-350).
const BECH32M_CONST: u32 = 0x2bc830a3;

/// Bech32 character set for encoding 5-bit values.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Network identifier selecting version bytes and the Bech32 prefix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// Bitcoin mainnet (HRP: "bc").
    #[default]
    Mainnet,
    /// Bitcoin testnet and signet (HRP: "tb").
    Testnet,
}

impl Network {
    /// Human-readable prefix for segwit addresses.
    pub fn hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "bc",
            Network::Testnet => "tb",
        }
    }

    /// Look up network from a human-readable prefix.
    pub fn from_hrp(hrp: &str) -> Result<Self, AddressError> {
        match hrp {
            "bc" => Ok(Network::Mainnet),
            "tb" => Ok(Network::Testnet),
            _ => Err(AddressError::UnknownNetwork(hrp.to_string())),
        }
    }

    /// Base58Check version byte for pay-to-pubkey-hash.
    pub fn pubkey_version(&self) -> u8 {
        match self {
            Network::Mainnet => PUBKEY_ADDRESS_VERSION_MAIN,
            Network::Testnet => PUBKEY_ADDRESS_VERSION_TEST,
        }
    }

    /// Base58Check version byte for pay-to-script-hash.
    pub fn script_version(&self) -> u8 {
        match self {
            Network::Mainnet => SCRIPT_ADDRESS_VERSION_MAIN,
            Network::Testnet => SCRIPT_ADDRESS_VERSION_TEST,
        }
    }
}

/// The six address formats a wallet can derive.
///
/// Each variant has exactly one derivation path and one encoding rule;
/// both are exhaustive matches, so adding a variant forces every call site
/// to handle it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFormat {
    #[serde(rename = "P2PKH")]
    P2pkh,
    #[serde(rename = "P2SH-P2WPKH")]
    P2shP2wpkh,
    #[serde(rename = "P2WPKH")]
    P2wpkh,
    #[serde(rename = "P2TR")]
    P2tr,
    #[serde(rename = "Counterwallet")]
    Counterwallet,
    #[serde(rename = "CounterwalletSegwit")]
    CounterwalletSegwit,
}

impl AddressFormat {
    pub const ALL: [AddressFormat; 6] = [
        AddressFormat::P2pkh,
        AddressFormat::P2shP2wpkh,
        AddressFormat::P2wpkh,
        AddressFormat::P2tr,
        AddressFormat::Counterwallet,
        AddressFormat::CounterwalletSegwit,
    ];

    /// Canonical name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFormat::P2pkh => "P2PKH",
            AddressFormat::P2shP2wpkh => "P2SH-P2WPKH",
            AddressFormat::P2wpkh => "P2WPKH",
            AddressFormat::P2tr => "P2TR",
            AddressFormat::Counterwallet => "Counterwallet",
            AddressFormat::CounterwalletSegwit => "CounterwalletSegwit",
        }
    }

    /// Whether keys for this format come from the legacy Counterwallet mnemonic.
    pub fn is_counterwallet(&self) -> bool {
        matches!(
            self,
            AddressFormat::Counterwallet | AddressFormat::CounterwalletSegwit
        )
    }
}

impl fmt::Display for AddressFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressFormat {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| AddressError::UnsupportedFormat(s.to_string()))
    }
}

/// What an address commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Payload {
    /// HASH160 of a public key (P2PKH).
    PubkeyHash([u8; HASH160_LEN]),
    /// HASH160 of a redeem script (P2SH).
    ScriptHash([u8; HASH160_LEN]),
    /// Segwit v0 key hash (P2WPKH).
    WitnessV0KeyHash([u8; HASH160_LEN]),
    /// Segwit v1 tweaked x-only output key (P2TR).
    Taproot([u8; XONLY_PUBKEY_LEN]),
}

/// A Bitcoin address: a network plus the payload it pays to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    network: Network,
    payload: Payload,
}

impl Address {
    pub fn new(payload: Payload, network: Network) -> Self {
        Self { network, payload }
    }

    /// Build the address a public key controls under the given format.
    ///
    /// A zero-length key is accepted by every format and yields a
    /// deterministic address that no key controls: hash formats hash the
    /// empty buffer and taproot uses an all-zero program.
    pub fn from_public_key(
        pubkey: &[u8],
        format: AddressFormat,
        network: Network,
    ) -> Result<Self, AddressError> {
        let payload = match format {
            AddressFormat::P2pkh | AddressFormat::Counterwallet => {
                check_legacy_key(pubkey)?;
                Payload::PubkeyHash(hash160(pubkey))
            }
            AddressFormat::P2shP2wpkh => {
                check_segwit_key(pubkey)?;
                let redeem = script::p2wpkh_script(&hash160(pubkey));
                Payload::ScriptHash(hash160(&redeem))
            }
            AddressFormat::P2wpkh | AddressFormat::CounterwalletSegwit => {
                check_segwit_key(pubkey)?;
                Payload::WitnessV0KeyHash(hash160(pubkey))
            }
            AddressFormat::P2tr => {
                if pubkey.is_empty() {
                    Payload::Taproot([0u8; XONLY_PUBKEY_LEN])
                } else {
                    Payload::Taproot(taproot_output_key(pubkey)?)
                }
            }
        };
        Ok(Self::new(payload, network))
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Encode as the canonical address string.
    pub fn encode(&self) -> String {
        match &self.payload {
            Payload::PubkeyHash(hash) => base58check_encode(self.network.pubkey_version(), hash),
            Payload::ScriptHash(hash) => base58check_encode(self.network.script_version(), hash),
            Payload::WitnessV0KeyHash(program) => {
                segwit_encode(self.network.hrp(), 0, program, Variant::Bech32)
            }
            Payload::Taproot(program) => {
                segwit_encode(self.network.hrp(), 1, program, Variant::Bech32m)
            }
        }
    }

    /// Decode and fully verify an address string.
    ///
    /// Checks the Base58Check or Bech32/Bech32m checksum, the version byte or
    /// witness version, and the program length.
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        if looks_like_segwit(s) {
            decode_segwit(s)
        } else {
            decode_base58check(s)
        }
    }

    /// The output script paying to this address.
    pub fn script_pubkey(&self) -> Vec<u8> {
        script::script_for(&self.payload)
    }

    /// Recover the address from a standard output script, if it is one.
    pub fn from_script(script_pubkey: &[u8], network: Network) -> Option<Self> {
        script::payload_from_script(script_pubkey).map(|payload| Self::new(payload, network))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Encode a public key as a mainnet address string.
pub fn encode_address(pubkey: &[u8], format: AddressFormat) -> Result<String, AddressError> {
    Address::from_public_key(pubkey, format, Network::Mainnet).map(|a| a.encode())
}

/// Format gate for Base58 addresses: alphabet and length only.
///
/// Does not verify the checksum; use [`Address::decode`] for that.
pub fn is_valid_base58(address: &str) -> bool {
    (BASE58_MIN_LEN..=BASE58_MAX_LEN).contains(&address.len())
        && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// Whether `address` decodes with a valid checksum on any supported network.
pub fn is_valid_address(address: &str) -> bool {
    Address::decode(address).is_ok()
}

fn check_legacy_key(pubkey: &[u8]) -> Result<(), AddressError> {
    match (pubkey.len(), pubkey.first()) {
        (0, _) => Ok(()),
        (COMPRESSED_PUBKEY_LEN, Some(0x02 | 0x03)) => Ok(()),
        (UNCOMPRESSED_PUBKEY_LEN, Some(0x04)) => Ok(()),
        (len, _) => Err(crate::error::CryptoError::InvalidPublicKeyLength(len).into()),
    }
}

/// Segwit v0 outputs are only standard for compressed keys.
fn check_segwit_key(pubkey: &[u8]) -> Result<(), AddressError> {
    match (pubkey.len(), pubkey.first()) {
        (0, _) => Ok(()),
        (COMPRESSED_PUBKEY_LEN, Some(0x02 | 0x03)) => Ok(()),
        (len, _) => Err(crate::error::CryptoError::InvalidPublicKeyLength(len).into()),
    }
}

// --- Base58Check internals ---

fn base58check_encode(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + 4);
    data.push(version);
    data.extend_from_slice(payload);
    let checksum = sha256d(&data);
    data.extend_from_slice(&checksum[..4]);
    bs58::encode(data).into_string()
}

fn decode_base58check(s: &str) -> Result<Address, AddressError> {
    let data = bs58::decode(s)
        .into_vec()
        .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
    if data.len() != BASE58CHECK_DECODED_LEN {
        return Err(AddressError::InvalidLength);
    }

    let (body, checksum) = data.split_at(BASE58CHECK_DECODED_LEN - 4);
    if sha256d(body)[..4] != *checksum {
        return Err(AddressError::InvalidChecksum);
    }

    let mut hash = [0u8; HASH160_LEN];
    hash.copy_from_slice(&body[1..]);

    let payload_network = match body[0] {
        PUBKEY_ADDRESS_VERSION_MAIN => (Payload::PubkeyHash(hash), Network::Mainnet),
        SCRIPT_ADDRESS_VERSION_MAIN => (Payload::ScriptHash(hash), Network::Mainnet),
        PUBKEY_ADDRESS_VERSION_TEST => (Payload::PubkeyHash(hash), Network::Testnet),
        SCRIPT_ADDRESS_VERSION_TEST => (Payload::ScriptHash(hash), Network::Testnet),
        other => return Err(AddressError::UnknownVersionByte(other)),
    };
    Ok(Address::new(payload_network.0, payload_network.1))
}

// --- Bech32 / Bech32m internals ---

/// Which checksum constant a Bech32 string uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Variant {
    Bech32,
    Bech32m,
}

impl Variant {
    fn constant(self) -> u32 {
        match self {
            Variant::Bech32 => BECH32_CONST,
            Variant::Bech32m => BECH32M_CONST,
        }
    }
}

fn looks_like_segwit(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with("bc1") || lower.starts_with("tb1")
}

/// Compute the Bech32 polymod over a sequence of 5-bit values.
fn polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
    let mut chk: u32 = 1;
    for &v in values {
        let b = chk >> 25;
        chk = ((chk & 0x1ffffff) << 5) ^ (v as u32);
        for (i, &g) in GEN.iter().enumerate() {
            if (b >> i) & 1 != 0 {
                chk ^= g;
            }
        }
    }
    chk
}

/// Expand the HRP for checksum computation.
fn hrp_expand(hrp: &str) -> Vec<u8> {
    let mut ret = Vec::with_capacity(hrp.len() * 2 + 1);
    for c in hrp.bytes() {
        ret.push(c >> 5);
    }
    ret.push(0);
    for c in hrp.bytes() {
        ret.push(c & 31);
    }
    ret
}

/// Create the 6-value checksum for the given HRP, data, and variant.
fn create_checksum(hrp: &str, data: &[u8], variant: Variant) -> Vec<u8> {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
    let polymod = polymod(&values) ^ variant.constant();
    (0..6)
        .map(|i| ((polymod >> (5 * (5 - i))) & 31) as u8)
        .collect()
}

/// Verify a checksum, reporting which variant it matched.
fn verify_checksum(hrp: &str, data: &[u8]) -> Option<Variant> {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    match polymod(&values) {
        BECH32_CONST => Some(Variant::Bech32),
        BECH32M_CONST => Some(Variant::Bech32m),
        _ => None,
    }
}

/// Convert between bit widths (e.g. 8-bit bytes to 5-bit Bech32 groups).
fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut ret = Vec::new();
    let maxv = (1u32 << to_bits) - 1;
    for &value in data {
        let v = value as u32;
        if v >> from_bits != 0 {
            return None;
        }
        acc = (acc << from_bits) | v;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            ret.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad {
        if bits > 0 {
            ret.push(((acc << (to_bits - bits)) & maxv) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & maxv) != 0 {
        return None;
    }
    Some(ret)
}

fn segwit_encode(hrp: &str, version: u8, program: &[u8], variant: Variant) -> String {
    // 8-bit to 5-bit with padding never fails.
    let program_5bit = convert_bits(program, 8, 5, true).unwrap_or_default();

    let mut payload = Vec::with_capacity(1 + program_5bit.len());
    payload.push(version);
    payload.extend_from_slice(&program_5bit);

    let checksum = create_checksum(hrp, &payload, variant);

    let mut result = String::with_capacity(hrp.len() + 1 + payload.len() + 6);
    result.push_str(hrp);
    result.push('1');
    for &d in payload.iter().chain(checksum.iter()) {
        result.push(CHARSET[d as usize] as char);
    }
    result
}

fn decode_segwit(s: &str) -> Result<Address, AddressError> {
    // Reject mixed case (all alpha chars must be same case)
    let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(AddressError::MixedCase);
    }
    if s.len() > BECH32_MAX_LEN {
        return Err(AddressError::InvalidLength);
    }

    let s_lower = s.to_ascii_lowercase();

    let sep_pos = s_lower.rfind('1').ok_or(AddressError::MissingSeparator)?;
    if sep_pos == 0 {
        return Err(AddressError::InvalidHrp);
    }
    // Need at least 6 checksum chars + 1 version char after separator
    if sep_pos + 8 > s_lower.len() {
        return Err(AddressError::InvalidLength);
    }

    let hrp = &s_lower[..sep_pos];
    let data_part = &s_lower[sep_pos + 1..];
    let network = Network::from_hrp(hrp)?;

    let mut data = Vec::with_capacity(data_part.len());
    for c in data_part.chars() {
        let pos = CHARSET
            .iter()
            .position(|&ch| ch as char == c)
            .ok_or(AddressError::InvalidCharacter(c))?;
        data.push(pos as u8);
    }

    let variant = verify_checksum(hrp, &data).ok_or(AddressError::InvalidChecksum)?;

    let payload = &data[..data.len() - 6];
    let version = payload[0];
    let program =
        convert_bits(&payload[1..], 5, 8, false).ok_or(AddressError::InvalidPadding)?;

    match (version, variant, program.len()) {
        (0, Variant::Bech32, HASH160_LEN) => {
            let mut hash = [0u8; HASH160_LEN];
            hash.copy_from_slice(&program);
            Ok(Address::new(Payload::WitnessV0KeyHash(hash), network))
        }
        (1, Variant::Bech32m, XONLY_PUBKEY_LEN) => {
            let mut key = [0u8; XONLY_PUBKEY_LEN];
            key.copy_from_slice(&program);
            Ok(Address::new(Payload::Taproot(key), network))
        }
        (0, Variant::Bech32m, _) | (1..=16, Variant::Bech32, _) => {
            Err(AddressError::WrongVariant(version))
        }
        (0..=1, _, len) => Err(AddressError::UnsupportedProgram { version, len }),
        _ => Err(AddressError::InvalidVersion(version)),
    }
}

//! Standard output script templates.
//!
//! Only the four templates wallets pay to are recognized. Anything else
//! (OP_RETURN data carriers, bare multisig, P2WSH, non-standard scripts)
//! decodes to `None`.

use crate::address::{Address, Network, Payload};
use crate::constants::{
    HASH160_LEN, OP_0, OP_1, OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160,
    OP_PUSHBYTES_20, OP_PUSHBYTES_32, XONLY_PUBKEY_LEN,
};

/// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_script(pubkey_hash: &[u8; HASH160_LEN]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.extend_from_slice(&[OP_DUP, OP_HASH160, OP_PUSHBYTES_20]);
    script.extend_from_slice(pubkey_hash);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

/// `OP_HASH160 <20> OP_EQUAL`
pub fn p2sh_script(script_hash: &[u8; HASH160_LEN]) -> Vec<u8> {
    let mut script = Vec::with_capacity(23);
    script.extend_from_slice(&[OP_HASH160, OP_PUSHBYTES_20]);
    script.extend_from_slice(script_hash);
    script.push(OP_EQUAL);
    script
}

/// `OP_0 <20>`. Also the redeem script of a P2SH-wrapped P2WPKH output.
pub fn p2wpkh_script(pubkey_hash: &[u8; HASH160_LEN]) -> Vec<u8> {
    let mut script = Vec::with_capacity(22);
    script.extend_from_slice(&[OP_0, OP_PUSHBYTES_20]);
    script.extend_from_slice(pubkey_hash);
    script
}

/// `OP_1 <32>`
pub fn p2tr_script(output_key: &[u8; XONLY_PUBKEY_LEN]) -> Vec<u8> {
    let mut script = Vec::with_capacity(34);
    script.extend_from_slice(&[OP_1, OP_PUSHBYTES_32]);
    script.extend_from_slice(output_key);
    script
}

pub fn script_for(payload: &Payload) -> Vec<u8> {
    match payload {
        Payload::PubkeyHash(hash) => p2pkh_script(hash),
        Payload::ScriptHash(hash) => p2sh_script(hash),
        Payload::WitnessV0KeyHash(hash) => p2wpkh_script(hash),
        Payload::Taproot(key) => p2tr_script(key),
    }
}

/// Match a script against the standard templates.
///
/// Templates are exact: a trailing byte or a short push is not a match.
pub fn payload_from_script(script: &[u8]) -> Option<Payload> {
    match script {
        [OP_DUP, OP_HASH160, OP_PUSHBYTES_20, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG]
            if hash.len() == HASH160_LEN =>
        {
            Some(Payload::PubkeyHash(hash.try_into().ok()?))
        }
        [OP_HASH160, OP_PUSHBYTES_20, hash @ .., OP_EQUAL] if hash.len() == HASH160_LEN => {
            Some(Payload::ScriptHash(hash.try_into().ok()?))
        }
        [OP_0, OP_PUSHBYTES_20, hash @ ..] if hash.len() == HASH160_LEN => {
            Some(Payload::WitnessV0KeyHash(hash.try_into().ok()?))
        }
        [OP_1, OP_PUSHBYTES_32, key @ ..] if key.len() == XONLY_PUBKEY_LEN => {
            Some(Payload::Taproot(key.try_into().ok()?))
        }
        _ => None,
    }
}

/// Decode a hex-encoded output script to a mainnet address string.
///
/// Returns `None` for non-hex input, empty scripts, OP_RETURN outputs and
/// anything that is not one of the four standard templates.
pub fn decode_script(hex_script: &str) -> Option<String> {
    decode_script_for(hex_script, Network::Mainnet)
}

pub fn decode_script_for(hex_script: &str, network: Network) -> Option<String> {
    let bytes = hex::decode(hex_script.trim()).ok()?;
    Address::from_script(&bytes, network).map(|a| a.encode())
}

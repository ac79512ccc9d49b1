//! Legacy Counterwallet mnemonic codec.
//!
//! Counterwallet (2014) predates BIP-39. Its mnemonics draw from a fixed
//! 1626-word list and carry no checksum: each group of three words maps to
//! a 32-bit number, written as 8 hex digits, and the concatenated hex is the
//! BIP-32 seed.
//!
//! For word indices `w1, w2, w3` and `n = 1626`:
//!
//! ```text
//! x = w1 + n * ((w2 - w1) mod n) + n^2 * ((w3 - w2) mod n)
//! ```
//!
//! with a non-negative `mod`. `x` is truncated to 32 bits, so a handful of
//! triples near the top of the range share an encoding with lower triples.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::WalletError;

mod words;

pub use words::WORDS;

/// Number of words in the list; also the radix of the group encoding.
pub const WORD_COUNT: u32 = 1626;

fn index() -> &'static HashMap<&'static str, u32> {
    static INDEX: OnceLock<HashMap<&'static str, u32>> = OnceLock::new();
    INDEX.get_or_init(|| {
        WORDS
            .iter()
            .enumerate()
            .map(|(i, w)| (*w, i as u32))
            .collect()
    })
}

/// Position of `word` in the list. Lookup is case-sensitive.
pub fn word_index(word: &str) -> Option<u32> {
    index().get(word).copied()
}

/// A mnemonic is valid when it has a positive multiple of three words and
/// every word is in the list.
pub fn is_valid_mnemonic(words: &[&str]) -> bool {
    !words.is_empty() && words.len() % 3 == 0 && words.iter().all(|w| word_index(w).is_some())
}

/// Encode one word triple. Word order matters.
pub fn encode_group(w1: u32, w2: u32, w3: u32, n: u32) -> u32 {
    let (w1, w2, w3, n) = (w1 as i64, w2 as i64, w3 as i64, n as i64);
    let x = w1 + n * (w2 - w1).rem_euclid(n) + n * n * (w3 - w2).rem_euclid(n);
    x as u32
}

/// Inverse of [`encode_group`] for `n = WORD_COUNT`.
fn decode_group(x: u32) -> [u32; 3] {
    let n = WORD_COUNT;
    let w1 = x % n;
    let w2 = (x / n + w1) % n;
    let w3 = (x / n / n + w2) % n;
    [w1, w2, w3]
}

/// Hex encoding of a word list: 8 lowercase digits per triple.
pub fn to_hex(words: &[&str]) -> Result<String, WalletError> {
    if words.is_empty() || words.len() % 3 != 0 {
        return Err(WalletError::InvalidMnemonic(format!(
            "word count must be a positive multiple of 3, got {}",
            words.len()
        )));
    }

    let mut out = String::with_capacity(words.len() / 3 * 8);
    for (group, triple) in words.chunks_exact(3).enumerate() {
        let mut idx = [0u32; 3];
        for (slot, word) in idx.iter_mut().zip(triple) {
            *slot = word_index(word).ok_or_else(|| {
                WalletError::InvalidMnemonic(format!("unknown word {word:?} in group {group}"))
            })?;
        }
        let x = encode_group(idx[0], idx[1], idx[2], WORD_COUNT);
        out.push_str(&format!("{x:08x}"));
    }
    Ok(out)
}

/// Seed bytes for a Counterwallet mnemonic.
///
/// Words are separated by any run of whitespace.
pub fn to_seed(mnemonic: &str) -> Result<Vec<u8>, WalletError> {
    let words: Vec<&str> = mnemonic.split_whitespace().collect();
    let hex_seed = to_hex(&words)?;
    hex::decode(&hex_seed).map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// Recover the word list that encodes `seed`.
///
/// Every 4-byte chunk decodes, so any seed whose length is a positive
/// multiple of 4 has exactly one mnemonic.
pub fn from_seed(seed: &[u8]) -> Result<Vec<&'static str>, WalletError> {
    if seed.is_empty() || seed.len() % 4 != 0 {
        return Err(WalletError::InvalidMnemonic(format!(
            "seed length must be a positive multiple of 4, got {}",
            seed.len()
        )));
    }

    let mut words = Vec::with_capacity(seed.len() / 4 * 3);
    for chunk in seed.chunks_exact(4) {
        let x = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        words.extend(decode_group(x).map(|i| WORDS[i as usize]));
    }
    Ok(words)
}

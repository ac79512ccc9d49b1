//! Cross-crate test suite for Satchel.
//!
//! Property tests and end-to-end vectors that exercise derivation, address
//! encoding, script decoding, and UTXO selection together.

pub mod helpers;

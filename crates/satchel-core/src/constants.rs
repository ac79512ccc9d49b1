//! Bitcoin encoding constants.

// --- Key and hash sizes ---

pub const COMPRESSED_PUBKEY_LEN: usize = 33;
pub const UNCOMPRESSED_PUBKEY_LEN: usize = 65;
pub const XONLY_PUBKEY_LEN: usize = 32;
pub const HASH160_LEN: usize = 20;

// --- Base58Check version bytes ---

pub const PUBKEY_ADDRESS_VERSION_MAIN: u8 = 0x00;
pub const SCRIPT_ADDRESS_VERSION_MAIN: u8 = 0x05;
pub const PUBKEY_ADDRESS_VERSION_TEST: u8 = 0x6f;
pub const SCRIPT_ADDRESS_VERSION_TEST: u8 = 0xc4;

/// Version byte plus 20-byte hash plus 4-byte checksum.
pub const BASE58CHECK_DECODED_LEN: usize = 25;

/// Length window accepted by the Base58 format gate.
pub const BASE58_MIN_LEN: usize = 26;
pub const BASE58_MAX_LEN: usize = 35;

/// Base58 alphabet (no `0`, `O`, `I`, `l`).
pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

// --- Bech32 ---

pub const BECH32_MAX_LEN: usize = 90;

/// Mainnet P2WPKH address length (`bc1q` + 38).
pub const P2WPKH_ADDRESS_LEN: usize = 42;

/// Mainnet P2TR address length (`bc1p` + 58).
pub const P2TR_ADDRESS_LEN: usize = 62;

// --- Script opcodes ---

pub const OP_0: u8 = 0x00;
pub const OP_PUSHBYTES_20: u8 = 0x14;
pub const OP_PUSHBYTES_32: u8 = 0x20;
pub const OP_1: u8 = 0x51;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;

/// BIP341 tag for the key-path output tweak.
pub const TAP_TWEAK_TAG: &str = "TapTweak";

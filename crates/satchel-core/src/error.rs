//! Error types for address encoding and UTXO lookups.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid public key length: {0}")] InvalidPublicKeyLength(usize),
    #[error("taproot tweak out of range")] InvalidTweak,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid HRP")] InvalidHrp,
    #[error("invalid length")] InvalidLength,
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid character: {0}")] InvalidCharacter(char),
    #[error("invalid witness version: {0}")] InvalidVersion(u8),
    #[error("invalid padding bits")] InvalidPadding,
    #[error("unknown network: {0}")] UnknownNetwork(String),
    #[error("missing separator")] MissingSeparator,
    #[error("mixed case")] MixedCase,
    #[error("checksum variant does not match witness version {0}")] WrongVariant(u8),
    #[error("unsupported witness program of {len} bytes for version {version}")] UnsupportedProgram { version: u8, len: usize },
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("unknown version byte: 0x{0:02x}")] UnknownVersionByte(u8),
    #[error("unsupported address format: {0}")] UnsupportedFormat(String),
    #[error(transparent)] Crypto(#[from] CryptoError),
}

/// Failure talking to an external UTXO or balance index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport: {0}")] Transport(String),
    #[error("HTTP {status} from {url}")] Status { status: u16, url: String },
    #[error("decode: {0}")] Decode(String),
}

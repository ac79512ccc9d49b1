//! # satchel-core
//! Address encodings, output scripts, and UTXO types for the Satchel wallet.

pub mod address;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod script;
pub mod traits;
pub mod types;

pub use address::{
    Address, AddressFormat, Network, Payload, encode_address, is_valid_address, is_valid_base58,
};
pub use script::decode_script;

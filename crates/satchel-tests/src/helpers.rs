//! Shared fixtures for integration tests.

use std::sync::Mutex;

use satchel_core::error::FetchError;
use satchel_core::traits::UtxoSource;
use satchel_core::types::{AttachedBalance, Txid, Utxo, UtxoStatus};

/// The all-`abandon` BIP-39 test mnemonic.
pub const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon about";

/// Compressed secp256k1 generator point.
pub const GENERATOR: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

pub fn generator() -> Vec<u8> {
    hex::decode(GENERATOR).unwrap_or_default()
}

/// A UTXO with a txid made of one repeated byte.
pub fn make_utxo(id: u8, vout: u32, value: u64, confirmed: bool) -> Utxo {
    Utxo {
        txid: Txid([id; 32]),
        vout,
        status: UtxoStatus {
            confirmed,
            block_height: confirmed.then_some(840_000),
            ..Default::default()
        },
        value,
    }
}

/// An attached balance bound to `utxo`.
pub fn attach(utxo: &Utxo, asset: &str) -> AttachedBalance {
    AttachedBalance {
        utxo: Some(utxo.outpoint().to_string()),
        asset: asset.to_string(),
        quantity: 1,
        utxo_address: None,
    }
}

/// In-memory [`UtxoSource`] that records which addresses were queried.
#[derive(Default)]
pub struct FixtureSource {
    pub utxos: Vec<Utxo>,
    pub attached: Vec<AttachedBalance>,
    pub fail_utxos: Option<FetchError>,
    pub fail_balances: Option<FetchError>,
    queried: Mutex<Vec<String>>,
}

impl FixtureSource {
    pub fn new(utxos: Vec<Utxo>, attached: Vec<AttachedBalance>) -> Self {
        Self {
            utxos,
            attached,
            ..Default::default()
        }
    }

    pub fn failing_utxos(mut self, error: FetchError) -> Self {
        self.fail_utxos = Some(error);
        self
    }

    pub fn failing_balances(mut self, error: FetchError) -> Self {
        self.fail_balances = Some(error);
        self
    }

    /// Addresses passed to either lookup, in call order.
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn record(&self, address: &str) {
        if let Ok(mut q) = self.queried.lock() {
            q.push(address.to_string());
        }
    }
}

#[async_trait::async_trait]
impl UtxoSource for FixtureSource {
    async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>, FetchError> {
        self.record(address);
        match &self.fail_utxos {
            Some(e) => Err(e.clone()),
            None => Ok(self.utxos.clone()),
        }
    }

    async fn fetch_attached_balances(
        &self,
        address: &str,
    ) -> Result<Vec<AttachedBalance>, FetchError> {
        self.record(address);
        match &self.fail_balances {
            Some(e) => Err(e.clone()),
            None => Ok(self.attached.clone()),
        }
    }
}

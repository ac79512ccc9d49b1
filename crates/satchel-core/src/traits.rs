//! Trait interfaces between the selection logic and external indexers.
//!
//! - [`UtxoSource`]: unspent outputs and attached token balances for an
//!   address (an Esplora/Counterparty HTTP client implements it; tests use
//!   in-memory fixtures)

use crate::error::FetchError;
use crate::types::{AttachedBalance, Utxo};

/// Read-only lookups the UTXO selector depends on.
///
/// Implementations must not cache: every call reflects the indexer's
/// current view of the address.
#[async_trait::async_trait]
pub trait UtxoSource: Send + Sync {
    /// All unspent outputs paying to `address`, confirmed or not.
    async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>, FetchError>;

    /// Token balances attached to outputs of `address`.
    async fn fetch_attached_balances(
        &self,
        address: &str,
    ) -> Result<Vec<AttachedBalance>, FetchError>;
}

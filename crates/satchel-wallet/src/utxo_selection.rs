//! Asset-aware UTXO selection.
//!
//! Picks the outputs a transaction composer should spend from an address:
//! confirmed outputs that carry no attached token balance, largest value
//! first, capped at a fixed count. This is not a fee-optimizing coin
//! selector; the composer decides how much of the set it actually needs.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use satchel_core::traits::UtxoSource;
use satchel_core::types::{AttachedBalance, Utxo};

use crate::error::WalletError;

/// Selection limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Fewer spendable outputs than this is an error.
    pub min_utxos: usize,
    /// At most this many outputs are returned.
    pub max_utxos: usize,
    /// Whether mempool outputs may be selected.
    pub allow_unconfirmed: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            min_utxos: 1,
            max_utxos: 20,
            allow_unconfirmed: false,
        }
    }
}

impl SelectorConfig {
    /// Reject limits under which every selection would be empty or short.
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.max_utxos == 0 {
            return Err(WalletError::InvalidSelectorConfig(
                "max_utxos must be at least 1".into(),
            ));
        }
        if self.max_utxos < self.min_utxos {
            return Err(WalletError::InvalidSelectorConfig(format!(
                "max_utxos ({}) is below min_utxos ({})",
                self.max_utxos, self.min_utxos
            )));
        }
        Ok(())
    }
}

/// Result of selection: which outputs to offer as inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoSelection {
    /// Selected outputs, largest value first.
    pub utxos: Vec<Utxo>,
    /// Exact sum of selected values in satoshis.
    pub total_value: u64,
    /// Outputs dropped because a token balance is attached to them.
    pub excluded_with_assets: usize,
}

impl UtxoSelection {
    /// Comma-joined `"{txid}:{vout}"` list, in selection order.
    pub fn inputs_set(&self) -> String {
        self.utxos
            .iter()
            .map(|u| u.outpoint().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }
}

/// UTXO selector over an external [`UtxoSource`].
#[derive(Debug, Clone, Default)]
pub struct UtxoSelector {
    config: SelectorConfig,
}

impl UtxoSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Fetch outputs and attached balances for `address` and select.
    ///
    /// Both lookups run concurrently. If either fails the whole call fails;
    /// no partial selection is returned.
    pub async fn select(
        &self,
        source: &dyn UtxoSource,
        address: &str,
    ) -> Result<UtxoSelection, WalletError> {
        self.config.validate()?;
        let fetched = tokio::try_join!(
            source.fetch_utxos(address),
            source.fetch_attached_balances(address),
        );
        let (candidates, attached) = match fetched {
            Ok(pair) => pair,
            Err(e) => {
                warn!(address, error = %e, "UTXO lookup failed");
                return Err(WalletError::FetchFailed(e));
            }
        };

        debug!(
            address,
            candidates = candidates.len(),
            attached = attached.len(),
            "fetched UTXO data"
        );

        let selection = select_from(candidates, &attached, &self.config)?;
        info!(
            address,
            selected = selection.len(),
            excluded = selection.excluded_with_assets,
            total = selection.total_value,
            "selected UTXOs"
        );
        Ok(selection)
    }
}

/// Selection over already-fetched data.
///
/// Fails with [`WalletError::InvalidSelectorConfig`] before looking at any
/// output when `config` cannot be satisfied.
///
/// 1. Drop unconfirmed outputs unless allowed.
/// 2. Drop outputs with an attached balance, counting them.
/// 3. Drop repeated outpoints (first occurrence wins).
/// 4. Fail if fewer than `min_utxos` remain.
/// 5. Stable sort by value descending, then truncate to `max_utxos`.
pub fn select_from(
    candidates: Vec<Utxo>,
    attached: &[AttachedBalance],
    config: &SelectorConfig,
) -> Result<UtxoSelection, WalletError> {
    config.validate()?;
    let encumbered: HashSet<String> = attached
        .iter()
        .filter_map(AttachedBalance::outpoint_key)
        .collect();

    let mut seen = HashSet::with_capacity(candidates.len());
    let mut excluded_with_assets = 0usize;
    let mut spendable: Vec<Utxo> = Vec::with_capacity(candidates.len());

    for utxo in candidates {
        if !config.allow_unconfirmed && !utxo.is_confirmed() {
            continue;
        }
        let outpoint = utxo.outpoint();
        if encumbered.contains(&outpoint.to_string()) {
            // Count each encumbered outpoint once even if the source repeats it.
            if seen.insert(outpoint) {
                excluded_with_assets += 1;
            }
            continue;
        }
        if !seen.insert(outpoint) {
            continue;
        }
        spendable.push(utxo);
    }

    if spendable.is_empty() || spendable.len() < config.min_utxos {
        return Err(WalletError::InsufficientUtxos {
            found: spendable.len(),
            required: config.min_utxos.max(1),
            excluded: excluded_with_assets,
        });
    }

    // sort_by is stable: equal values keep source order.
    spendable.sort_by(|a, b| b.value.cmp(&a.value));
    spendable.truncate(config.max_utxos);

    let total_value = spendable
        .iter()
        .try_fold(0u64, |acc, u| acc.checked_add(u.value))
        .ok_or(WalletError::ValueOverflow)?;

    Ok(UtxoSelection {
        utxos: spendable,
        total_value,
        excluded_with_assets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use satchel_core::error::FetchError;
    use satchel_core::types::{Txid, UtxoStatus};

    // --- Mock source ---

    struct MockSource {
        utxos: Result<Vec<Utxo>, FetchError>,
        attached: Result<Vec<AttachedBalance>, FetchError>,
    }

    impl MockSource {
        fn new(utxos: Vec<Utxo>, attached: Vec<AttachedBalance>) -> Self {
            Self {
                utxos: Ok(utxos),
                attached: Ok(attached),
            }
        }
    }

    #[async_trait]
    impl UtxoSource for MockSource {
        async fn fetch_utxos(&self, _address: &str) -> Result<Vec<Utxo>, FetchError> {
            self.utxos.clone()
        }

        async fn fetch_attached_balances(
            &self,
            _address: &str,
        ) -> Result<Vec<AttachedBalance>, FetchError> {
            self.attached.clone()
        }
    }

    fn make_utxo(id: u8, vout: u32, value: u64, confirmed: bool) -> Utxo {
        Utxo {
            txid: Txid([id; 32]),
            vout,
            status: UtxoStatus {
                confirmed,
                block_height: confirmed.then_some(800_000),
                ..Default::default()
            },
            value,
        }
    }

    fn attach(utxo: &Utxo) -> AttachedBalance {
        AttachedBalance {
            utxo: Some(utxo.outpoint().to_string()),
            asset: "XCP".into(),
            quantity: 1,
            utxo_address: None,
        }
    }

    const ADDR: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    #[tokio::test]
    async fn single_confirmed_utxo() {
        let u = make_utxo(1, 0, 100_000, true);
        let source = MockSource::new(vec![u.clone()], vec![]);
        let sel = UtxoSelector::default().select(&source, ADDR).await.unwrap();
        assert_eq!(sel.len(), 1);
        assert_eq!(sel.total_value, 100_000);
        assert_eq!(sel.excluded_with_assets, 0);
        assert_eq!(sel.inputs_set(), format!("{}:0", u.txid));
    }

    #[tokio::test]
    async fn attached_output_excluded_rest_sorted() {
        let a = make_utxo(1, 0, 5_000, true);
        let b = make_utxo(2, 1, 9_000, true);
        let c = make_utxo(3, 2, 7_000, true);
        let source = MockSource::new(vec![a.clone(), b.clone(), c.clone()], vec![attach(&b)]);
        let sel = UtxoSelector::default().select(&source, ADDR).await.unwrap();
        assert_eq!(sel.excluded_with_assets, 1);
        assert_eq!(sel.utxos, vec![c.clone(), a.clone()]);
        assert_eq!(sel.total_value, 12_000);
        assert_eq!(
            sel.inputs_set(),
            format!("{}:2,{}:0", c.txid, a.txid)
        );
    }

    #[tokio::test]
    async fn empty_address_is_insufficient() {
        let source = MockSource::new(vec![], vec![]);
        let err = UtxoSelector::default().select(&source, ADDR).await.unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientUtxos {
                found: 0,
                required: 1,
                excluded: 0
            }
        );
    }

    #[tokio::test]
    async fn utxo_fetch_failure_propagates() {
        let source = MockSource {
            utxos: Err(FetchError::Transport("timeout".into())),
            attached: Ok(vec![]),
        };
        let err = UtxoSelector::default().select(&source, ADDR).await.unwrap_err();
        assert_eq!(err, WalletError::FetchFailed(FetchError::Transport("timeout".into())));
    }

    #[tokio::test]
    async fn balance_fetch_failure_propagates() {
        let source = MockSource {
            utxos: Ok(vec![make_utxo(1, 0, 1, true)]),
            attached: Err(FetchError::Status {
                status: 503,
                url: "http://indexer".into(),
            }),
        };
        let err = UtxoSelector::default().select(&source, ADDR).await.unwrap_err();
        assert!(matches!(err, WalletError::FetchFailed(FetchError::Status { status: 503, .. })));
    }

    #[test]
    fn unconfirmed_dropped_by_default() {
        let utxos = vec![make_utxo(1, 0, 10, false), make_utxo(2, 0, 20, true)];
        let sel = select_from(utxos.clone(), &[], &SelectorConfig::default()).unwrap();
        assert_eq!(sel.utxos, vec![utxos[1].clone()]);

        let config = SelectorConfig {
            allow_unconfirmed: true,
            ..Default::default()
        };
        let sel = select_from(utxos, &[], &config).unwrap();
        assert_eq!(sel.len(), 2);
        assert_eq!(sel.total_value, 30);
    }

    #[test]
    fn only_unconfirmed_is_insufficient() {
        let err = select_from(vec![make_utxo(1, 0, 10, false)], &[], &SelectorConfig::default())
            .unwrap_err();
        assert!(matches!(err, WalletError::InsufficientUtxos { found: 0, .. }));
    }

    #[test]
    fn all_encumbered_reports_excluded() {
        let a = make_utxo(1, 0, 10, true);
        let b = make_utxo(2, 0, 20, true);
        let err = select_from(vec![a.clone(), b.clone()], &[attach(&a), attach(&b)], &SelectorConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientUtxos {
                found: 0,
                required: 1,
                excluded: 2
            }
        );
    }

    #[test]
    fn attached_key_matching_is_case_insensitive() {
        let a = make_utxo(0xAB, 3, 10, true);
        let b = make_utxo(2, 0, 20, true);
        let upper = AttachedBalance {
            utxo: Some(a.outpoint().to_string().to_uppercase()),
            ..Default::default()
        };
        let sel = select_from(vec![a, b.clone()], &[upper], &SelectorConfig::default()).unwrap();
        assert_eq!(sel.utxos, vec![b]);
        assert_eq!(sel.excluded_with_assets, 1);
    }

    #[test]
    fn balances_without_outpoint_ignored() {
        let a = make_utxo(1, 0, 10, true);
        let unbound = AttachedBalance {
            utxo: None,
            asset: "XCP".into(),
            ..Default::default()
        };
        let sel = select_from(vec![a], &[unbound], &SelectorConfig::default()).unwrap();
        assert_eq!(sel.excluded_with_assets, 0);
    }

    #[test]
    fn duplicate_outpoints_counted_once() {
        let a = make_utxo(1, 0, 10, true);
        let b = make_utxo(2, 0, 20, true);
        let sel = select_from(
            vec![a.clone(), b.clone(), a.clone()],
            &[],
            &SelectorConfig::default(),
        )
        .unwrap();
        assert_eq!(sel.utxos, vec![b, a]);
        assert_eq!(sel.total_value, 30);
    }

    #[test]
    fn cap_keeps_largest() {
        let utxos: Vec<Utxo> = (0..30u8)
            .map(|i| make_utxo(i, 0, 1_000 + i as u64, true))
            .collect();
        let sel = select_from(utxos, &[], &SelectorConfig::default()).unwrap();
        assert_eq!(sel.len(), 20);
        assert_eq!(sel.utxos[0].value, 1_029);
        assert_eq!(sel.utxos[19].value, 1_010);
        assert_eq!(sel.total_value, (1_010..=1_029).sum::<u64>());
    }

    #[test]
    fn equal_values_keep_source_order() {
        let a = make_utxo(1, 0, 50, true);
        let b = make_utxo(2, 0, 50, true);
        let c = make_utxo(3, 0, 50, true);
        let sel = select_from(vec![a.clone(), b.clone(), c.clone()], &[], &SelectorConfig::default())
            .unwrap();
        assert_eq!(sel.utxos, vec![a, b, c]);
    }

    #[test]
    fn min_utxos_enforced() {
        let config = SelectorConfig {
            min_utxos: 3,
            ..Default::default()
        };
        let err = select_from(
            vec![make_utxo(1, 0, 10, true), make_utxo(2, 0, 10, true)],
            &[],
            &config,
        )
        .unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientUtxos {
                found: 2,
                required: 3,
                excluded: 0
            }
        );
    }

    #[test]
    fn zero_cap_rejected() {
        let config = SelectorConfig {
            max_utxos: 0,
            ..Default::default()
        };
        let err = select_from(vec![make_utxo(1, 0, 100_000, true)], &[], &config).unwrap_err();
        assert!(matches!(err, WalletError::InvalidSelectorConfig(_)), "{err:?}");
    }

    #[test]
    fn cap_below_minimum_rejected() {
        let config = SelectorConfig {
            min_utxos: 3,
            max_utxos: 2,
            allow_unconfirmed: false,
        };
        let utxos = (1..=5u8).map(|i| make_utxo(i, 0, 10, true)).collect();
        let err = select_from(utxos, &[], &config).unwrap_err();
        assert_eq!(
            err,
            WalletError::InvalidSelectorConfig("max_utxos (2) is below min_utxos (3)".into())
        );
    }

    #[test]
    fn cap_equal_to_minimum_accepted() {
        let config = SelectorConfig {
            min_utxos: 2,
            max_utxos: 2,
            allow_unconfirmed: false,
        };
        let utxos = (1..=4u8).map(|i| make_utxo(i, 0, i as u64, true)).collect();
        let sel = select_from(utxos, &[], &config).unwrap();
        assert_eq!(sel.len(), 2);
        assert_eq!(sel.total_value, 7);
    }

    #[tokio::test]
    async fn invalid_config_fails_before_fetching() {
        let source = MockSource {
            utxos: Err(FetchError::Transport("must not be called".into())),
            attached: Ok(vec![]),
        };
        let selector = UtxoSelector::new(SelectorConfig {
            max_utxos: 0,
            ..Default::default()
        });
        let err = selector.select(&source, ADDR).await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidSelectorConfig(_)), "{err:?}");
    }

    #[test]
    fn value_overflow_detected() {
        let utxos = vec![make_utxo(1, 0, u64::MAX, true), make_utxo(2, 0, 1, true)];
        let err = select_from(utxos, &[], &SelectorConfig::default()).unwrap_err();
        assert_eq!(err, WalletError::ValueOverflow);
    }

    #[test]
    fn inputs_set_empty_selection() {
        let sel = UtxoSelection {
            utxos: vec![],
            total_value: 0,
            excluded_with_assets: 0,
        };
        assert_eq!(sel.inputs_set(), "");
        assert!(sel.is_empty());
    }
}

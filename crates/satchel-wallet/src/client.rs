//! HTTP [`UtxoSource`] over an Esplora-compatible UTXO index and the
//! Counterparty v2 balances API.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use satchel_core::error::FetchError;
use satchel_core::traits::UtxoSource;
use satchel_core::types::{AttachedBalance, Utxo};

/// Stop following cursors after this many pages.
const MAX_PAGES: usize = 100;

/// Endpoints and limits for [`HttpUtxoSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSourceConfig {
    /// Base URL of an Esplora-compatible API (no trailing slash).
    pub esplora_url: String,
    /// Base URL of a Counterparty node API (no trailing slash).
    pub counterparty_url: String,
    pub timeout_secs: u64,
    /// Page size for balance queries.
    pub page_limit: u32,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            esplora_url: "https://mempool.space/api".to_string(),
            counterparty_url: "https://api.counterparty.io:4000".to_string(),
            timeout_secs: 10,
            page_limit: 1000,
        }
    }
}

/// One page of the Counterparty balances endpoint.
#[derive(Debug, Deserialize)]
struct BalancePage {
    #[serde(default)]
    result: Vec<AttachedBalance>,
    #[serde(default)]
    next_cursor: Option<serde_json::Value>,
}

pub struct HttpUtxoSource {
    client: Client,
    config: HttpSourceConfig,
}

impl HttpUtxoSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            config: HttpSourceConfig {
                esplora_url: config.esplora_url.trim_end_matches('/').to_string(),
                counterparty_url: config.counterparty_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Cursor values arrive as numbers or strings; `null` ends pagination.
fn cursor_string(cursor: Option<serde_json::Value>) -> Option<String> {
    match cursor? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[async_trait::async_trait]
impl UtxoSource for HttpUtxoSource {
    async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>, FetchError> {
        let url = format!("{}/address/{address}/utxo", self.config.esplora_url);
        let utxos: Vec<Utxo> = self.get_json(&url, &[]).await?;
        debug!(address, count = utxos.len(), "fetched UTXOs");
        Ok(utxos)
    }

    async fn fetch_attached_balances(
        &self,
        address: &str,
    ) -> Result<Vec<AttachedBalance>, FetchError> {
        let url = format!(
            "{}/v2/addresses/{address}/balances",
            self.config.counterparty_url
        );
        let mut balances = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 0..MAX_PAGES {
            let mut query = vec![
                ("type", "utxo".to_string()),
                ("limit", self.config.page_limit.to_string()),
            ];
            if let Some(c) = &cursor {
                query.push(("cursor", c.clone()));
            }

            let body: BalancePage = self.get_json(&url, &query).await?;
            let received = body.result.len();
            balances.extend(body.result);

            let next = cursor_string(body.next_cursor);
            debug!(address, page, received, next = ?next, "fetched balance page");
            match next {
                Some(n) if received > 0 && cursor.as_deref() != Some(n.as_str()) => {
                    cursor = Some(n)
                }
                _ => break,
            }
        }

        Ok(balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use serde_json::{Value, json};
    use std::collections::HashMap;

    const TXID_A: &str = "aa00000000000000000000000000000000000000000000000000000000000001";
    const TXID_B: &str = "bb00000000000000000000000000000000000000000000000000000000000002";

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn source(base: &str) -> HttpUtxoSource {
        HttpUtxoSource::new(HttpSourceConfig {
            esplora_url: base.to_string(),
            counterparty_url: format!("{base}/"),
            timeout_secs: 5,
            page_limit: 2,
        })
        .unwrap()
    }

    async fn esplora_utxos(Path(address): Path<String>) -> axum::Json<Value> {
        assert_eq!(address, "bc1qtest");
        axum::Json(json!([
            {"txid": TXID_A, "vout": 0, "status": {"confirmed": true, "block_height": 1,
              "block_hash": "00", "block_time": 2}, "value": 1000},
            {"txid": TXID_B, "vout": 3, "status": {"confirmed": false}, "value": 50}
        ]))
    }

    async fn balances(Query(q): Query<HashMap<String, String>>) -> axum::Json<Value> {
        assert_eq!(q.get("type").map(String::as_str), Some("utxo"));
        assert_eq!(q.get("limit").map(String::as_str), Some("2"));
        match q.get("cursor").map(String::as_str) {
            None => axum::Json(json!({
                "result": [
                    {"utxo": format!("{TXID_A}:0"), "asset": "XCP", "quantity": 5},
                    {"utxo": format!("{TXID_A}:1"), "asset": "PEPE", "quantity": 1}
                ],
                "next_cursor": 7
            })),
            Some("7") => axum::Json(json!({
                "result": [{"utxo": format!("{TXID_B}:3"), "asset": "XCP", "quantity": 2}],
                "next_cursor": null
            })),
            Some(other) => panic!("unexpected cursor {other}"),
        }
    }

    fn fixture_router() -> Router {
        Router::new()
            .route("/address/:address/utxo", get(esplora_utxos))
            .route("/v2/addresses/:address/balances", get(balances))
    }

    #[tokio::test]
    async fn fetches_esplora_utxos() {
        let base = serve(fixture_router()).await;
        let utxos = source(&base).fetch_utxos("bc1qtest").await.unwrap();
        assert_eq!(utxos.len(), 2);
        assert!(utxos[0].is_confirmed());
        assert_eq!(utxos[0].value, 1000);
        assert_eq!(utxos[1].outpoint().to_string(), format!("{TXID_B}:3"));
    }

    #[tokio::test]
    async fn follows_balance_cursor() {
        let base = serve(fixture_router()).await;
        let balances = source(&base)
            .fetch_attached_balances("bc1qtest")
            .await
            .unwrap();
        let keys: Vec<_> = balances.iter().filter_map(|b| b.outpoint_key()).collect();
        assert_eq!(
            keys,
            vec![
                format!("{TXID_A}:0"),
                format!("{TXID_A}:1"),
                format!("{TXID_B}:3")
            ]
        );
    }

    #[tokio::test]
    async fn repeated_cursor_stops() {
        async fn looping() -> axum::Json<Value> {
            axum::Json(json!({"result": [{"utxo": "x:0"}], "next_cursor": "same"}))
        }
        let router = Router::new().route("/v2/addresses/:address/balances", get(looping));
        let base = serve(router).await;
        let balances = source(&base).fetch_attached_balances("a").await.unwrap();
        // First page, then one page with cursor "same", which repeats and stops.
        assert_eq!(balances.len(), 2);
    }

    #[tokio::test]
    async fn http_error_status_maps_to_fetch_error() {
        async fn unavailable() -> StatusCode {
            StatusCode::SERVICE_UNAVAILABLE
        }
        let router = Router::new().route("/address/:address/utxo", get(unavailable));
        let base = serve(router).await;
        let err = source(&base).fetch_utxos("a").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }), "{err:?}");
    }

    #[tokio::test]
    async fn malformed_json_maps_to_decode_error() {
        async fn garbage() -> &'static str {
            "not json"
        }
        let router = Router::new().route("/address/:address/utxo", get(garbage));
        let base = serve(router).await;
        let err = source(&base).fetch_utxos("a").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "{err:?}");
    }

    #[tokio::test]
    async fn connection_refused_maps_to_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = source(&format!("http://{addr}"))
            .fetch_utxos("a")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)), "{err:?}");
    }

    #[test]
    fn cursor_normalization() {
        assert_eq!(cursor_string(None), None);
        assert_eq!(cursor_string(Some(Value::Null)), None);
        assert_eq!(cursor_string(Some(json!(""))), None);
        assert_eq!(cursor_string(Some(json!(42))), Some("42".into()));
        assert_eq!(cursor_string(Some(json!("abc"))), Some("abc".into()));
    }

    #[test]
    fn trailing_slashes_trimmed() {
        let s = HttpUtxoSource::new(HttpSourceConfig {
            esplora_url: "http://x/api/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.config().esplora_url, "http://x/api");
    }
}

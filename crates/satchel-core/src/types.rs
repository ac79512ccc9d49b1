//! UTXO data as returned by address indexers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 32-byte transaction ID in display (big-endian hex) byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Txid(pub [u8; 32]);

impl Txid {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({})", hex::encode(self.0))
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Txid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(format!("txid must be 64 hex chars, got {}", s.len()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| format!("invalid txid hex: {e}"))?;
        Ok(Txid(bytes))
    }
}

impl Serialize for Txid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Txid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Reference to a specific transaction output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub txid: Txid,
    pub vout: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl FromStr for OutPoint {
    type Err = String;

    /// Parse `"{txid}:{vout}"`. The txid may be upper or lower case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid, vout) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("outpoint missing ':': {s}"))?;
        let txid = txid.to_ascii_lowercase().parse()?;
        let vout = vout
            .parse()
            .map_err(|e| format!("invalid vout {vout:?}: {e}"))?;
        Ok(OutPoint { txid, vout })
    }
}

/// Confirmation status of a UTXO.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoStatus {
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_time: Option<u64>,
}

/// An unspent output controlled by an address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    #[serde(default)]
    pub status: UtxoStatus,
    /// Value in satoshis.
    pub value: u64,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.txid,
            vout: self.vout,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status.confirmed
    }
}

/// A token balance attached to a specific output.
///
/// Only `utxo` matters for selection; the remaining fields are carried for
/// display and logging.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedBalance {
    /// `"{txid}:{vout}"` of the output carrying the balance.
    #[serde(default)]
    pub utxo: Option<String>,
    #[serde(default)]
    pub asset: String,
    #[serde(default)]
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utxo_address: Option<String>,
}

impl AttachedBalance {
    /// Normalized outpoint key, or `None` for balances not bound to an output.
    pub fn outpoint_key(&self) -> Option<String> {
        self.utxo
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

    #[test]
    fn txid_parse_and_display() {
        let txid: Txid = TXID.parse().unwrap();
        assert_eq!(txid.to_string(), TXID);
    }

    #[test]
    fn txid_rejects_bad_input() {
        assert!("abcd".parse::<Txid>().is_err());
        assert!("zz".repeat(32).parse::<Txid>().is_err());
    }

    #[test]
    fn outpoint_display_and_parse() {
        let op: OutPoint = format!("{TXID}:7").parse().unwrap();
        assert_eq!(op.vout, 7);
        assert_eq!(op.to_string(), format!("{TXID}:7"));
    }

    #[test]
    fn outpoint_parse_case_insensitive_txid() {
        let op: OutPoint = format!("{}:0", TXID.to_uppercase()).parse().unwrap();
        assert_eq!(op.txid.to_string(), TXID);
    }

    #[test]
    fn outpoint_parse_errors() {
        assert!(TXID.parse::<OutPoint>().is_err());
        assert!(format!("{TXID}:x").parse::<OutPoint>().is_err());
        assert!(format!("{TXID}:-1").parse::<OutPoint>().is_err());
    }

    #[test]
    fn utxo_deserializes_esplora_shape() {
        let json = format!(
            r#"{{"txid":"{TXID}","vout":1,"status":{{"confirmed":true,"block_height":800000,
            "block_hash":"00ab","block_time":1700000000}},"value":100000}}"#
        );
        let utxo: Utxo = serde_json::from_str(&json).unwrap();
        assert!(utxo.is_confirmed());
        assert_eq!(utxo.value, 100_000);
        assert_eq!(utxo.status.block_height, Some(800_000));
        assert_eq!(utxo.outpoint().to_string(), format!("{TXID}:1"));
    }

    #[test]
    fn unconfirmed_utxo_has_no_block_fields() {
        let json = format!(r#"{{"txid":"{TXID}","vout":0,"status":{{"confirmed":false}},"value":5}}"#);
        let utxo: Utxo = serde_json::from_str(&json).unwrap();
        assert!(!utxo.is_confirmed());
        assert_eq!(utxo.status.block_height, None);
    }

    #[test]
    fn attached_balance_key_normalized() {
        let bal = AttachedBalance {
            utxo: Some(format!(" {}:2 ", TXID.to_uppercase())),
            ..Default::default()
        };
        assert_eq!(bal.outpoint_key(), Some(format!("{TXID}:2")));

        let unbound = AttachedBalance {
            utxo: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(unbound.outpoint_key(), None);
    }

    #[test]
    fn attached_balance_ignores_unknown_fields() {
        let json = format!(
            r#"{{"utxo":"{TXID}:0","asset":"XCP","quantity":100,"utxo_address":"bc1q","divisible":true}}"#
        );
        let bal: AttachedBalance = serde_json::from_str(&json).unwrap();
        assert_eq!(bal.asset, "XCP");
        assert_eq!(bal.quantity, 100);
    }
}

//! BIP-32 derivation paths and the default path for each address format.

use std::fmt;
use std::str::FromStr;

use satchel_core::address::AddressFormat;

use crate::error::WalletError;

/// Offset added to an index to mark it hardened.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// One step of a derivation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChildNumber {
    index: u32,
    hardened: bool,
}

impl ChildNumber {
    pub fn normal(index: u32) -> Result<Self, WalletError> {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> Result<Self, WalletError> {
        Self::new(index, true)
    }

    fn new(index: u32, hardened: bool) -> Result<Self, WalletError> {
        if index >= HARDENED_OFFSET {
            return Err(WalletError::InvalidPath(format!(
                "index {index} exceeds maximum ({})",
                HARDENED_OFFSET - 1
            )));
        }
        Ok(Self { index, hardened })
    }

    /// Index without the hardened offset.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// Serialized form used in BIP-32 child derivation (`ser32(i)`).
    pub fn to_u32(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for ChildNumber {
    type Err = WalletError;

    fn from_str(part: &str) -> Result<Self, Self::Err> {
        let (digits, hardened) = match part.strip_suffix('\'').or_else(|| part.strip_suffix('h')) {
            Some(digits) => (digits, true),
            None => (part, false),
        };
        if digits.is_empty() {
            return Err(WalletError::InvalidPath("empty path segment".into()));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WalletError::InvalidPath(format!(
                "non-numeric segment {part:?}"
            )));
        }
        // Overflowing u32 is also out of range.
        let index: u32 = digits.parse().map_err(|_| {
            WalletError::InvalidPath(format!("index {digits} exceeds maximum"))
        })?;
        Self::new(index, hardened)
    }
}

/// A path from the master key, e.g. `m/84'/0'/0'/0/0`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    /// The empty path `m`.
    pub fn master() -> Self {
        Self(Vec::new())
    }

    pub fn children(&self) -> &[ChildNumber] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path with `child` appended.
    pub fn child(&self, child: ChildNumber) -> Self {
        let mut next = self.0.clone();
        next.push(child);
        Self(next)
    }

    /// Path with all of `children` appended.
    pub fn extend(&self, children: impl IntoIterator<Item = ChildNumber>) -> Self {
        let mut next = self.0.clone();
        next.extend(children);
        Self(next)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for child in &self.0 {
            write!(f, "/{child}")?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let rest = trimmed
            .strip_prefix('m')
            .ok_or_else(|| WalletError::InvalidPath(format!("path must start with 'm': {s:?}")))?;
        if rest.is_empty() {
            return Ok(Self::master());
        }
        let rest = rest
            .strip_prefix('/')
            .ok_or_else(|| WalletError::InvalidPath(format!("expected '/' after 'm': {s:?}")))?;

        rest.split('/')
            .map(|part| {
                part.parse::<ChildNumber>()
                    .map_err(|e| WalletError::InvalidPath(format!("{s:?}: {}", path_reason(&e))))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

fn path_reason(e: &WalletError) -> String {
    match e {
        WalletError::InvalidPath(reason) => reason.clone(),
        other => other.to_string(),
    }
}

/// Account-level path (without the address index) for a format.
pub fn path_for_format(format: AddressFormat) -> DerivationPath {
    // Every literal here is well-formed; built directly to avoid parsing.
    let h = |i| ChildNumber { index: i, hardened: true };
    let n = |i| ChildNumber { index: i, hardened: false };
    let children = match format {
        AddressFormat::P2pkh => vec![h(44), h(0), h(0), n(0)],
        AddressFormat::P2shP2wpkh => vec![h(49), h(0), h(0), n(0)],
        AddressFormat::P2wpkh => vec![h(84), h(0), h(0), n(0)],
        AddressFormat::P2tr => vec![h(86), h(0), h(0), n(0)],
        AddressFormat::Counterwallet | AddressFormat::CounterwalletSegwit => vec![h(0), n(0)],
    };
    DerivationPath(children)
}

/// Default path for a format name; unknown names are `UnsupportedFormat`.
pub fn path_for_format_name(name: &str) -> Result<DerivationPath, WalletError> {
    let format: AddressFormat = name
        .parse()
        .map_err(|_| WalletError::UnsupportedFormat(name.to_string()))?;
    Ok(path_for_format(format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_canonical() {
        let path: DerivationPath = "m/84'/0'/0'/0/5".parse().unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.to_string(), "m/84'/0'/0'/0/5");
        assert!(path.children()[0].is_hardened());
        assert!(!path.children()[4].is_hardened());
        assert_eq!(path.children()[4].index(), 5);
    }

    #[test]
    fn h_marker_normalizes_to_apostrophe() {
        let path: DerivationPath = "m/44h/0h/0h/0/0".parse().unwrap();
        assert_eq!(path.to_string(), "m/44'/0'/0'/0/0");
    }

    #[test]
    fn master_path() {
        let path: DerivationPath = "m".parse().unwrap();
        assert!(path.is_empty());
        assert_eq!(path.to_string(), "m");
    }

    #[test]
    fn serialized_index() {
        let c: ChildNumber = "0'".parse().unwrap();
        assert_eq!(c.to_u32(), 0x8000_0000);
        let c: ChildNumber = "7".parse().unwrap();
        assert_eq!(c.to_u32(), 7);
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in [
            "",
            "44'/0'",
            "m/",
            "m//0",
            "m/0/",
            "m/abc",
            "m/-1",
            "m/+1",
            "m/1''",
            "m/'",
            "mm/0",
            "m0",
            "m/2147483648",
            "m/4294967296",
            "m/99999999999999999999",
        ] {
            let err = bad.parse::<DerivationPath>().unwrap_err();
            assert!(matches!(err, WalletError::InvalidPath(_)), "{bad}: {err:?}");
        }
    }

    #[test]
    fn max_index_accepted() {
        let path: DerivationPath = "m/2147483647'".parse().unwrap();
        assert_eq!(path.children()[0].to_u32(), u32::MAX);
    }

    #[test]
    fn child_and_extend() {
        let base = path_for_format(AddressFormat::P2wpkh);
        let full = base.child(ChildNumber::normal(3).unwrap());
        assert_eq!(full.to_string(), "m/84'/0'/0'/0/3");
        let ext = DerivationPath::master().extend([
            ChildNumber::hardened(0).unwrap(),
            ChildNumber::normal(0).unwrap(),
        ]);
        assert_eq!(ext, path_for_format(AddressFormat::Counterwallet));
        assert!(ChildNumber::normal(HARDENED_OFFSET).is_err());
    }

    #[test]
    fn format_paths() {
        let expect = [
            (AddressFormat::P2pkh, "m/44'/0'/0'/0"),
            (AddressFormat::P2shP2wpkh, "m/49'/0'/0'/0"),
            (AddressFormat::P2wpkh, "m/84'/0'/0'/0"),
            (AddressFormat::P2tr, "m/86'/0'/0'/0"),
            (AddressFormat::Counterwallet, "m/0'/0"),
            (AddressFormat::CounterwalletSegwit, "m/0'/0"),
        ];
        for (format, path) in expect {
            assert_eq!(path_for_format(format).to_string(), path);
            assert_eq!(path.parse::<DerivationPath>().unwrap(), path_for_format(format));
        }
    }

    #[test]
    fn format_name_lookup() {
        assert_eq!(
            path_for_format_name("P2TR").unwrap().to_string(),
            "m/86'/0'/0'/0"
        );
        assert_eq!(
            path_for_format_name("P2WSH").unwrap_err(),
            WalletError::UnsupportedFormat("P2WSH".into())
        );
    }
}

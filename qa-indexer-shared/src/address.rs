//! Content addresses for archived documents.
//!
//! An address is the SHA-512 digest of a primary identifier's decimal text,
//! rendered as lowercase hex. It depends on the identifier only, never on
//! document content, so the same question always lands at the same path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

/// Number of hex characters in an address.
pub const ADDRESS_LEN: usize = 128;

/// Hex characters used for each shard directory level.
const SHARD_WIDTH: usize = 2;

/// Hash-derived storage key for one archived document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentAddress(String);

/// Error returned when a string is not a well-formed address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid content address: {0}")]
pub struct ParseAddressError(String);

impl ContentAddress {
    /// Compute the address of a primary identifier.
    pub fn of(primary_id: i32) -> Self {
        let digest = Sha512::digest(primary_id.to_string().as_bytes());
        Self(hex::encode(digest))
    }

    /// The full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Level-1 and level-2 shard directory names.
    pub fn shards(&self) -> (&str, &str) {
        (
            &self.0[..SHARD_WIDTH],
            &self.0[SHARD_WIDTH..SHARD_WIDTH * 2],
        )
    }

    /// Archive-relative path: `<aa>/<bb>/<address>.json`.
    pub fn relative_path(&self) -> PathBuf {
        let (level1, level2) = self.shards();
        Path::new(level1)
            .join(level2)
            .join(format!("{}.json", self.0))
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentAddress {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_LEN {
            return Err(ParseAddressError(format!(
                "expected {} hex characters, got {}",
                ADDRESS_LEN,
                s.len()
            )));
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(ParseAddressError(format!("non-hex characters in {}", s)));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ContentAddress {
    type Error = ParseAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentAddress> for String {
    fn from(address: ContentAddress) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_deterministic() {
        for id in [0, 1, 4, 1337, i32::MAX, -5] {
            assert_eq!(ContentAddress::of(id), ContentAddress::of(id));
        }
    }

    #[test]
    fn test_address_is_sha512_of_decimal_text() {
        let address = ContentAddress::of(1);
        let expected = hex::encode(Sha512::digest(b"1"));

        assert_eq!(address.as_str(), expected);
        assert_eq!(address.as_str().len(), ADDRESS_LEN);
    }

    #[test]
    fn test_distinct_ids_have_distinct_addresses() {
        let addresses: std::collections::HashSet<_> =
            (0..1000).map(ContentAddress::of).collect();
        assert_eq!(addresses.len(), 1000);
    }

    #[test]
    fn test_relative_path_uses_two_shard_levels() {
        let address = ContentAddress::of(42);
        let hex = address.as_str();
        let expected = Path::new(&hex[0..2])
            .join(&hex[2..4])
            .join(format!("{}.json", hex));

        assert_eq!(address.relative_path(), expected);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("abc".parse::<ContentAddress>().is_err());
        assert!("Z".repeat(ADDRESS_LEN).parse::<ContentAddress>().is_err());

        let valid = ContentAddress::of(3);
        assert_eq!(valid.as_str().parse::<ContentAddress>().unwrap(), valid);
    }

    #[test]
    fn test_serde_as_plain_string() {
        let address = ContentAddress::of(9);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));

        let back: ContentAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}

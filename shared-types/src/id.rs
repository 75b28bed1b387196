//! Worker identifiers.
//!
//! A [`WorkerId`] is a fixed 20-byte opaque value. Externally (JSON, URLs,
//! logs) it is always rendered as 40 lowercase hex characters.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Size of a worker id in bytes.
pub const ID_SIZE: usize = 20;

/// Identifier of a registered worker (musician).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WorkerId([u8; ID_SIZE]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("worker id is empty")]
    Empty,
    #[error("worker id must be {expected} bytes, got {actual}")]
    WrongSize { expected: usize, actual: usize },
    #[error("worker id is not valid hex: {0}")]
    InvalidHex(String),
}

impl WorkerId {
    pub const MIN: WorkerId = WorkerId([0x00; ID_SIZE]);
    pub const MAX: WorkerId = WorkerId([0xFF; ID_SIZE]);

    pub const fn from_bytes(bytes: [u8; ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Generate a random id.
    pub fn random() -> Self {
        let mut bytes = [0u8; ID_SIZE];
        rand::rng().fill(&mut bytes);
        Self(bytes)
    }

    /// Derive a stable id from arbitrary content (truncated SHA-256).
    pub fn from_content(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        let mut bytes = [0u8; ID_SIZE];
        bytes.copy_from_slice(&digest[..ID_SIZE]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkerId({})", self.to_hex())
    }
}

impl FromStr for WorkerId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        let bytes = hex::decode(s).map_err(|e| IdError::InvalidHex(e.to_string()))?;
        let bytes: [u8; ID_SIZE] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| IdError::WrongSize {
                    expected: ID_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self(bytes))
    }
}

impl Serialize for WorkerId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for WorkerId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let id = WorkerId::random();
        let hex = id.to_string();
        assert_eq!(hex.len(), ID_SIZE * 2);
        assert_eq!(hex.parse::<WorkerId>().unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!("".parse::<WorkerId>(), Err(IdError::Empty));
        assert!(matches!(
            "abcd".parse::<WorkerId>(),
            Err(IdError::WrongSize { actual: 2, .. })
        ));
        assert!(matches!(
            "zz".repeat(ID_SIZE).parse::<WorkerId>(),
            Err(IdError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let mut low = [0u8; ID_SIZE];
        low[ID_SIZE - 1] = 1;
        let mut high = [0u8; ID_SIZE];
        high[0] = 1;
        let low = WorkerId::from_bytes(low);
        let high = WorkerId::from_bytes(high);
        assert!(WorkerId::MIN < low);
        assert!(low < high);
        assert!(high < WorkerId::MAX);
    }

    #[test]
    fn test_from_content_is_stable() {
        assert_eq!(
            WorkerId::from_content(b"violin"),
            WorkerId::from_content(b"violin")
        );
        assert_ne!(
            WorkerId::from_content(b"violin"),
            WorkerId::from_content(b"cello")
        );
    }

    #[test]
    fn test_serde_as_hex_string() {
        let id = WorkerId::from_bytes([0xAB; ID_SIZE]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(ID_SIZE)));
        let back: WorkerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<WorkerId>("\"nothex\"").is_err());
    }
}

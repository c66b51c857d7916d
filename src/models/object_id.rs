//! Document identifiers.
//!
//! Identifiers use the 12-byte object-id layout common to document stores:
//! a big-endian seconds timestamp, five bytes unique to the process and a
//! three-byte counter. On the wire they are 24 hex characters.

use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
};

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

static OBJECT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("valid object id pattern"));

static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(rand::random);

static COUNTER: Lazy<AtomicU32> = Lazy::new(|| AtomicU32::new(rand::random::<u32>() & 0x00ff_ffff));

/// Returned when a path segment is not a well-formed identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id: {0:?}")]
pub struct InvalidObjectId(pub String);

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        let timestamp = Utc::now().timestamp() as u32;
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Whether `s` has the shape of an identifier (24 hex characters, any case)
    pub fn is_valid(s: &str) -> bool {
        OBJECT_ID_RE.is_match(s)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_valid(s) {
            return Err(InvalidObjectId(s.to_string()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidObjectId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_well_formed_and_distinct() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_hex().len(), 24);
        assert!(ObjectId::is_valid(&a.to_hex()));
        assert_eq!(a.to_hex().parse::<ObjectId>().unwrap(), a);
    }

    #[test]
    fn parse_accepts_upper_case_and_normalises() {
        let id: ObjectId = "05E2AC2514C82863C629B3E1".parse().unwrap();
        assert_eq!(id.to_string(), "05e2ac2514c82863c629b3e1");
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["", "search", "stats", "05e2ac2514c82863c629b3e", "05e2ac2514c82863c629b3e1a", "zze2ac2514c82863c629b3e1"] {
            assert!(bad.parse::<ObjectId>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn timestamp_prefix_is_current() {
        let id = ObjectId::new();
        let bytes = id.bytes();
        let secs = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64;
        assert!((Utc::now().timestamp() - secs).abs() < 5);
    }

    #[test]
    fn serde_uses_hex_string() {
        let id: ObjectId = "05e2ac2514c82863c629b3e1".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"05e2ac2514c82863c629b3e1\"");
        assert!(serde_json::from_str::<ObjectId>("\"nope\"").is_err());
    }
}

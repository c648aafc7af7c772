use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::time_units::TimeUnits;

/// Every entry, keyed by its caller-chosen key. Persisted wholesale.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    pub data: HashMap<String, StoreEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEntry {
    pub content: String,
    pub time_to_wait: TimeUnits,
    /// Milliseconds since the epoch after which the content may be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<u64>,
}

impl Store {
    pub fn deserialize(data: &[u8]) -> anyhow::Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::{Store, StoreEntry};
    use crate::time_units::TimeUnits;

    fn sample() -> Store {
        let mut store = Store::default();
        store.data.insert(
            "locked".to_string(),
            StoreEntry {
                content: "secret".to_string(),
                time_to_wait: TimeUnits {
                    minutes: 10,
                    ..Default::default()
                },
                release_date: None,
            },
        );
        store.data.insert(
            "scheduled".to_string(),
            StoreEntry {
                content: "later".to_string(),
                time_to_wait: TimeUnits {
                    days: 10,
                    ..Default::default()
                },
                release_date: Some(1_700_000_000_000),
            },
        );
        store
    }

    #[test]
    fn round_trip() {
        let store = sample();
        let data = store.serialize().unwrap();
        assert_eq!(Store::deserialize(&data).unwrap(), store);
    }

    #[test]
    fn document_layout() {
        let data = sample().serialize().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(
            value["locked"],
            serde_json::json!({
                "content": "secret",
                "timeToWait": {"days": 0, "hours": 0, "minutes": 10, "seconds": 0}
            })
        );
        assert_eq!(value["scheduled"]["releaseDate"], 1_700_000_000_000u64);
    }

    #[test]
    fn missing_units_are_filled_on_load() {
        let store = Store::deserialize(br#"{"k":{"content":"c","timeToWait":{"hours":2}}}"#).unwrap();
        let entry = store.data.get("k").unwrap();
        assert_eq!(
            entry.time_to_wait,
            TimeUnits {
                hours: 2,
                ..Default::default()
            }
        );
        assert_eq!(entry.release_date, None);
    }

    #[test]
    fn empty_document() {
        let store = Store::deserialize(b"{}").unwrap();
        assert!(store.data.is_empty());
    }

    #[test]
    fn malformed_document() {
        assert!(Store::deserialize(b"[1, 2]").is_err());
        assert!(Store::deserialize(br#"{"k":{"timeToWait":{}}}"#).is_err());
        assert!(Store::deserialize(b"").is_err());
    }
}

//! A single stored value and its bookkeeping.

use serde::Serialize;

/// Bytes charged per entry on top of key and value.
const ENTRY_OVERHEAD_BYTES: usize = 64;

/// Estimate used when a value cannot be serialized.
const UNSERIALIZABLE_VALUE_BYTES: usize = 100;

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    /// Insertion time, ms since epoch.
    pub stored_at: i64,
    pub ttl_ms: u64,
    pub access_count: u64,
    pub last_accessed_at: i64,
}

impl<V> CacheEntry<V> {
    pub fn new(data: V, now: i64, ttl_ms: u64) -> Self {
        Self {
            data,
            stored_at: now,
            ttl_ms,
            access_count: 0,
            last_accessed_at: now,
        }
    }

    /// Live while `now - stored_at <= ttl_ms`.
    pub fn is_expired(&self, now: i64) -> bool {
        let age = now.saturating_sub(self.stored_at);
        age > i64::try_from(self.ttl_ms).unwrap_or(i64::MAX)
    }

    pub fn touch(&mut self, now: i64) {
        self.access_count += 1;
        self.last_accessed_at = now;
    }
}

impl<V: Serialize> CacheEntry<V> {
    /// Rough footprint: UTF-16 sized key and JSON value plus fixed overhead.
    pub fn estimated_size(&self, key: &str) -> usize {
        let value_bytes = serde_json::to_string(&self.data)
            .map(|json| utf16_bytes(&json))
            .unwrap_or(UNSERIALIZABLE_VALUE_BYTES);

        utf16_bytes(key) + value_bytes + ENTRY_OVERHEAD_BYTES
    }
}

fn utf16_bytes(s: &str) -> usize {
    s.encode_utf16().count() * 2
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::ser::Error as _;
    use serde::{Serialize, Serializer};

    use super::*;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("not serializable"))
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let entry = CacheEntry::new(1, 1_000, 100);
        assert!(!entry.is_expired(1_099));
        assert!(!entry.is_expired(1_100));
        assert!(entry.is_expired(1_101));
    }

    #[test]
    fn test_touch_updates_access_fields() {
        let mut entry = CacheEntry::new("v", 0, 10);
        entry.touch(5);
        entry.touch(7);
        assert_eq!(entry.access_count, 2);
        assert_eq!(entry.last_accessed_at, 7);
        assert_eq!(entry.stored_at, 0);
    }

    #[test]
    fn test_estimated_size_string_value() {
        // key "ab" = 4 bytes, "\"xyz\"" = 10 bytes, plus overhead
        let entry = CacheEntry::new("xyz".to_string(), 0, 10);
        assert_eq!(entry.estimated_size("ab"), 4 + 10 + 64);
    }

    #[test]
    fn test_estimated_size_counts_utf16_units() {
        // "é" is one UTF-16 unit, "😀" is two
        let entry = CacheEntry::new(0u8, 0, 10);
        assert_eq!(entry.estimated_size("é😀"), 6 + 2 + 64);
    }

    #[test]
    fn test_estimated_size_falls_back_when_serialization_fails() {
        let entry = CacheEntry::new(Unserializable, 0, 10);
        assert_eq!(entry.estimated_size("k"), 2 + 100 + 64);

        // Non-string map keys are rejected by serde_json too
        let mut map = HashMap::new();
        map.insert((1, 2), "x");
        let entry = CacheEntry::new(map, 0, 10);
        assert_eq!(entry.estimated_size("k"), 2 + 100 + 64);
    }
}

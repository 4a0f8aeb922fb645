//! Contract for values stored in the cache.

use anyhow::Result;

/// A value that can convert itself to and from a transport string.
///
/// The cache never inspects the serialized form; it only requires the
/// round-trip law to hold: `deserialize_from_string(serialize_to_string(v))`
/// is semantically equal to `v` for every valid `v`.
///
/// Implementations typically delegate to `serde_json`:
///
/// ```rust,ignore
/// impl StringSerializable for User {
///     fn serialize_to_string(&self) -> anyhow::Result<String> {
///         Ok(serde_json::to_string(self)?)
///     }
///
///     fn deserialize_from_string(raw: &str) -> anyhow::Result<Self> {
///         Ok(serde_json::from_str(raw)?)
///     }
/// }
/// ```
pub trait StringSerializable: Sized {
    fn serialize_to_string(&self) -> Result<String>;
    fn deserialize_from_string(raw: &str) -> Result<Self>;
}

// Strings cache as themselves.
impl StringSerializable for String {
    fn serialize_to_string(&self) -> Result<String> {
        Ok(self.clone())
    }

    fn deserialize_from_string(raw: &str) -> Result<Self> {
        Ok(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct TestData {
        id: i32,
        name: String,
    }

    impl StringSerializable for TestData {
        fn serialize_to_string(&self) -> Result<String> {
            Ok(serde_json::to_string(self)?)
        }

        fn deserialize_from_string(raw: &str) -> Result<Self> {
            Ok(serde_json::from_str(raw)?)
        }
    }

    #[test]
    fn test_round_trip_law() {
        let value = TestData {
            id: 7,
            name: "seven".to_string(),
        };

        let raw = value.serialize_to_string().unwrap();
        let restored = TestData::deserialize_from_string(&raw).unwrap();

        assert_eq!(restored, value);
    }

    #[test]
    fn test_string_round_trips_unchanged() {
        let value = "plain string".to_string();

        let raw = value.serialize_to_string().unwrap();
        assert_eq!(raw, value);

        let restored = String::deserialize_from_string(&raw).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        let result = TestData::deserialize_from_string("not json{");
        assert!(result.is_err());
    }
}

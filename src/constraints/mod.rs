//! Constraint reader
//!
//! Typed read-only view over the nested constraint tree a caller hands to
//! `getUserMedia`. The tree is loosely typed (booleans, maps, arrays, numbers
//! encoded as numbers or strings), so every accessor answers "absent" instead
//! of failing when the shape is not the expected one.

pub mod media;
pub mod request;

pub use media::{KeyValuePair, MediaConstraints};
pub use request::{AcquisitionRequest, MediaRequest, VideoMandatory, VideoSourceKind};

use serde_json::{Map, Value};

/// Type tag of a constraint value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Null,
    Boolean,
    Number,
    String,
    Map,
    Array,
}

impl ObjectType {
    /// Classify a raw value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ObjectType::Null,
            Value::Bool(_) => ObjectType::Boolean,
            Value::Number(_) => ObjectType::Number,
            Value::String(_) => ObjectType::String,
            Value::Object(_) => ObjectType::Map,
            Value::Array(_) => ObjectType::Array,
        }
    }
}

/// Borrowed view over one dictionary level of a constraint tree
#[derive(Debug, Clone, Copy)]
pub struct ConstraintsMap<'a> {
    inner: &'a Map<String, Value>,
}

impl<'a> ConstraintsMap<'a> {
    pub fn new(inner: &'a Map<String, Value>) -> Self {
        Self { inner }
    }

    /// View a value as a dictionary, if it is one
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(Self::new)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn get_type(&self, key: &str) -> Option<ObjectType> {
        self.inner.get(key).map(ObjectType::of)
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.inner.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.inner.get(key).and_then(Value::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.inner.get(key).and_then(Value::as_str)
    }

    /// Read a non-negative integer hint
    ///
    /// Hosts send these either as JSON numbers or as decimal strings
    /// (`"640"`); fractional numbers are truncated.
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        match self.inner.get(key)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        }
    }

    pub fn get_map(&self, key: &str) -> Option<ConstraintsMap<'a>> {
        self.inner.get(key).and_then(Self::from_value)
    }

    pub fn get_array(&self, key: &str) -> Option<&'a [Value]> {
        self.inner.get(key).and_then(Value::as_array).map(Vec::as_slice)
    }

    /// Iterate over the entries of this level
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Owned copy of this level
    pub fn to_owned_map(&self) -> Map<String, Value> {
        self.inner.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_queries() {
        let value = json!({
            "audio": true,
            "video": { "mandatory": { "minWidth": 640 } },
            "optional": [],
        });
        let map = ConstraintsMap::from_value(&value).unwrap();

        assert_eq!(map.get_type("audio"), Some(ObjectType::Boolean));
        assert_eq!(map.get_type("video"), Some(ObjectType::Map));
        assert_eq!(map.get_type("optional"), Some(ObjectType::Array));
        assert_eq!(map.get_type("missing"), None);
        assert!(!map.has_key("missing"));
    }

    #[test]
    fn test_numeric_hints_accept_strings() {
        let value = json!({ "a": 640, "b": "480", "c": 15.9, "d": -3, "e": "wide" });
        let map = ConstraintsMap::from_value(&value).unwrap();

        assert_eq!(map.get_u32("a"), Some(640));
        assert_eq!(map.get_u32("b"), Some(480));
        assert_eq!(map.get_u32("c"), Some(15));
        assert_eq!(map.get_u32("d"), None);
        assert_eq!(map.get_u32("e"), None);
    }

    #[test]
    fn test_non_map_value_has_no_view() {
        assert!(ConstraintsMap::from_value(&json!(true)).is_none());
        assert!(ConstraintsMap::from_value(&json!([1, 2])).is_none());
    }
}

//! Media constraints handed to the pipeline when creating an audio source

use super::ConstraintsMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single constraint entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Mandatory and optional constraints for a pipeline source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub mandatory: Vec<KeyValuePair>,
    pub optional: Vec<KeyValuePair>,
}

impl MediaConstraints {
    /// Constraints with every given key enabled as an optional constraint
    pub fn enabled_options<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mandatory: Vec::new(),
            optional: keys
                .into_iter()
                .map(|key| KeyValuePair::new(key, "true"))
                .collect(),
        }
    }

    /// Parse a caller-supplied constraint dictionary
    ///
    /// `mandatory` is a map of scalar values, `optional` an array of maps.
    /// Nested values that cannot be expressed as a string are skipped.
    pub fn parse(map: ConstraintsMap<'_>) -> Self {
        let mut constraints = MediaConstraints::default();

        if let Some(mandatory) = map.get_map("mandatory") {
            for (key, value) in mandatory.entries() {
                match scalar_to_string(value) {
                    Some(value) => constraints.mandatory.push(KeyValuePair::new(key, value)),
                    None => tracing::debug!("Ignoring non-scalar mandatory constraint {}", key),
                }
            }
        }

        if let Some(optional) = map.get_array("optional") {
            for option in optional.iter().filter_map(ConstraintsMap::from_value) {
                for (key, value) in option.entries() {
                    match scalar_to_string(value) {
                        Some(value) => constraints.optional.push(KeyValuePair::new(key, value)),
                        None => tracing::debug!("Ignoring non-scalar optional constraint {}", key),
                    }
                }
            }
        }

        constraints
    }

    pub fn is_empty(&self) -> bool {
        self.mandatory.is_empty() && self.optional.is_empty()
    }
}

impl fmt::Display for MediaConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |pairs: &[KeyValuePair]| {
            pairs
                .iter()
                .map(|p| format!("{}: {}", p.key, p.value))
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "mandatory: [{}], optional: [{}]",
            join(&self.mandatory),
            join(&self.optional)
        )
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_mandatory_and_optional() {
        let value = json!({
            "mandatory": { "googAutoGainControl": false, "sampleRate": 48000 },
            "optional": [
                { "googNoiseSuppression": true },
                { "sourceId": "mic-1" },
                "not a map",
            ],
        });
        let constraints = MediaConstraints::parse(ConstraintsMap::from_value(&value).unwrap());

        assert_eq!(constraints.mandatory.len(), 2);
        assert!(constraints
            .mandatory
            .contains(&KeyValuePair::new("googAutoGainControl", "false")));
        assert!(constraints
            .mandatory
            .contains(&KeyValuePair::new("sampleRate", "48000")));
        assert_eq!(
            constraints.optional,
            vec![
                KeyValuePair::new("googNoiseSuppression", "true"),
                KeyValuePair::new("sourceId", "mic-1"),
            ]
        );
    }

    #[test]
    fn test_enabled_options() {
        let constraints = MediaConstraints::enabled_options(["echoCancellation"]);
        assert!(constraints.mandatory.is_empty());
        assert_eq!(
            constraints.optional,
            vec![KeyValuePair::new("echoCancellation", "true")]
        );
    }
}

//! Scalar attribute values carried by feature records and graphics.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attribute table row: field name to scalar value.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A single attribute value as returned by a feature service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Integer view of the value; floats only qualify when they are whole.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(v) => Some(*v),
            AttributeValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Stringified form used as a lookup key for object ids.
    ///
    /// Whole floats print without a fraction so `1` and `1.0` share a key.
    pub fn key_string(&self) -> String {
        match self {
            AttributeValue::Null => "null".to_string(),
            AttributeValue::Bool(b) => b.to_string(),
            AttributeValue::Int(v) => v.to_string(),
            AttributeValue::Float(v) => match self.as_i64() {
                Some(whole) => whole.to_string(),
                None => v.to_string(),
            },
            AttributeValue::Text(s) => s.clone(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            AttributeValue::Null => 0,
            AttributeValue::Bool(_) => 1,
            AttributeValue::Int(_) | AttributeValue::Float(_) => 2,
            AttributeValue::Text(_) => 3,
        }
    }

    /// Total ordering: null < bool < number < text.
    pub fn compare(&self, other: &AttributeValue) -> Ordering {
        match (self, other) {
            (AttributeValue::Int(a), AttributeValue::Int(b)) => a.cmp(b),
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => a.cmp(b),
            (AttributeValue::Text(a), AttributeValue::Text(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }

    /// Loose equality: numbers compare by value regardless of int/float.
    pub fn loosely_equals(&self, other: &AttributeValue) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key_string())
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Int(v as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_scalars() {
        let attrs: Attributes = serde_json::from_str(
            r#"{"OID": 7, "AREA": 12.5, "NAME": "Alpha", "OPEN": true, "NOTE": null}"#,
        )
        .unwrap();

        assert_eq!(attrs["OID"], AttributeValue::Int(7));
        assert_eq!(attrs["AREA"], AttributeValue::Float(12.5));
        assert_eq!(attrs["NAME"], AttributeValue::Text("Alpha".to_string()));
        assert_eq!(attrs["OPEN"], AttributeValue::Bool(true));
        assert!(attrs["NOTE"].is_null());
    }

    #[test]
    fn test_key_string() {
        assert_eq!(AttributeValue::Int(42).key_string(), "42");
        assert_eq!(AttributeValue::Float(42.0).key_string(), "42");
        assert_eq!(AttributeValue::Float(4.25).key_string(), "4.25");
        assert_eq!(AttributeValue::from("abc").key_string(), "abc");
        assert_eq!(AttributeValue::Null.key_string(), "null");
    }

    #[test]
    fn test_compare_mixed_numbers() {
        assert_eq!(
            AttributeValue::Int(2).compare(&AttributeValue::Float(2.5)),
            Ordering::Less
        );
        assert!(AttributeValue::Int(3).loosely_equals(&AttributeValue::Float(3.0)));
    }

    #[test]
    fn test_compare_across_kinds() {
        let mut values = vec![
            AttributeValue::from("b"),
            AttributeValue::Int(1),
            AttributeValue::Null,
            AttributeValue::Bool(false),
            AttributeValue::from("a"),
        ];
        values.sort_by(|a, b| a.compare(b));
        assert_eq!(
            values,
            vec![
                AttributeValue::Null,
                AttributeValue::Bool(false),
                AttributeValue::Int(1),
                AttributeValue::from("a"),
                AttributeValue::from("b"),
            ]
        );
    }
}

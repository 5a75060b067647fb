/*!
 * Core data types for midealan.
 *
 * This module defines the attribute value type shared by every device family.
 */
use std::fmt;

use serde::{Deserialize, Serialize};

/// An attribute value reported by or written to an appliance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Not yet observed
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value (enumerated names such as preset modes)
    String(String),
}

impl Value {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get an integer value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if *f == (*f as i64) as f64 => Some(*f as i64),
            _ => None,
        }
    }

    /// Try to get a float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the variant, used in type mismatch messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
        }
    }

    /// Parse a command-line literal: `true`/`false`, integers (decimal or
    /// `0x` hex), floats, `null`, anything else as a string.
    pub fn parse_literal(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            "null" => return Value::Null,
            _ => {}
        }
        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            if let Ok(i) = i64::from_str_radix(hex, 16) {
                return Value::Integer(i);
            }
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
        Value::String(trimmed.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u8> for Value {
    fn from(i: u8) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        let v: Value = true.into();
        assert_eq!(v.as_bool(), Some(true));

        let v: Value = 42u8.into();
        assert_eq!(v.as_integer(), Some(42));

        let v: Value = 26.5f64.into();
        assert_eq!(v.as_float(), Some(26.5));

        let v: Value = "Sleep".into();
        assert_eq!(v.as_str(), Some("Sleep"));

        let v: Value = Option::<&str>::None.into();
        assert!(v.is_null());
    }

    #[test]
    fn test_value_as_methods() {
        let v = Value::Integer(3);
        assert_eq!(v.as_float(), Some(3.0));

        let v = Value::Float(3.0);
        assert_eq!(v.as_integer(), Some(3));

        let v = Value::Float(3.5);
        assert_eq!(v.as_integer(), None);

        let v = Value::String("on".to_string());
        assert_eq!(v.as_bool(), None);
        assert_eq!(v.type_name(), "string");
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(Value::parse_literal("true"), Value::Bool(true));
        assert_eq!(Value::parse_literal("0x80"), Value::Integer(0x80));
        assert_eq!(Value::parse_literal("12"), Value::Integer(12));
        assert_eq!(Value::parse_literal("26.5"), Value::Float(26.5));
        assert_eq!(Value::parse_literal("Strong Wind"), Value::String("Strong Wind".into()));
        assert_eq!(Value::parse_literal("null"), Value::Null);
    }

    #[test]
    fn test_serde_untagged() {
        let json = serde_json::to_string(&Value::Integer(5)).unwrap();
        assert_eq!(json, "5");
        let v: Value = serde_json::from_str("true").unwrap();
        assert_eq!(v, Value::Bool(true));
    }
}

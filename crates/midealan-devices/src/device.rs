/*!
 * Device adapter trait and shared device types.
 *
 * A device adapter owns one appliance's attribute state. It turns received
 * bodies into attribute deltas and attribute requests into outgoing
 * messages. Adapters never talk to the network themselves.
 */
use std::fmt::Debug;

use serde::Serialize;
use thiserror::Error;

use midealan_core::{config::DeviceEntry, types::Value};

use crate::attribute::{AttributeDelta, AttributeMap};
use crate::message::{DeviceType, Message, ParseError, Response};

/// Error type for device operations
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The attribute does not exist for this family
    #[error("Unsupported attribute: {0}")]
    UnsupportedAttribute(String),

    /// The attribute is decoded from status frames only
    #[error("Attribute {0} is read-only")]
    ReadOnlyAttribute(&'static str),

    /// The value type is not valid for the attribute
    #[error("Invalid value type for attribute {attribute}: expected {expected}, got {got}")]
    InvalidValueType {
        /// Attribute name
        attribute: &'static str,
        /// Expected type
        expected: &'static str,
        /// Supplied type
        got: &'static str,
    },

    /// The mode is not in the family's vocabulary
    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    /// The request is refused by protocol rules
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Malformed customisation string
    #[error("Customize error: {0}")]
    Customize(String),

    /// Body parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl From<serde_json::Error> for DeviceError {
    fn from(err: serde_json::Error) -> Self {
        DeviceError::Customize(err.to_string())
    }
}

/// Result type for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Identity of one appliance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    /// Appliance identifier
    pub device_id: u64,
    /// Human readable name
    pub name: String,
    /// Device class code
    pub device_type: DeviceType,
    /// Model string
    pub model: String,
    /// Sub-variant identifier
    pub subtype: u16,
    /// Message protocol version
    pub protocol_version: u8,
}

impl From<&DeviceEntry> for DeviceInfo {
    fn from(entry: &DeviceEntry) -> Self {
        Self {
            device_id: entry.device_id,
            name: entry.name.clone(),
            device_type: DeviceType(entry.device_type),
            model: entry.model.clone(),
            subtype: entry.subtype,
            protocol_version: entry.protocol_version,
        }
    }
}

/// The contract every device family implements
///
/// Operations never fail: a body that cannot be decoded yields an empty
/// delta, and a request the protocol refuses yields no message. Both cases
/// are logged.
pub trait DeviceAdapter: Send + Sync + Debug {
    /// Get the device information
    fn info(&self) -> &DeviceInfo;

    /// Get the device ID
    fn device_id(&self) -> u64 {
        self.info().device_id
    }

    /// Get the device class code
    fn device_type(&self) -> DeviceType {
        self.info().device_type
    }

    /// Current value of one attribute
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Snapshot of every attribute in reporting order
    fn attributes(&self) -> AttributeMap;

    /// Query messages that ask the appliance for its full state
    fn build_query(&self) -> Vec<Message>;

    /// Decode a received body and merge it into the attribute state
    fn process_message(&mut self, response: &Response) -> AttributeDelta;

    /// Build the command that changes one attribute, if any is needed
    fn set_attribute(&mut self, name: &str, value: Value) -> Option<Message>;

    /// Apply a JSON customisation string; malformed input keeps defaults
    fn set_customize(&mut self, customize: &str);
}

/// Read a boolean request value; integers follow C truthiness
pub(crate) fn expect_bool(attribute: &'static str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Integer(i) => Ok(*i != 0),
        other => Err(DeviceError::InvalidValueType {
            attribute,
            expected: "bool",
            got: other.type_name(),
        }),
    }
}

/// Read an integer request value
pub(crate) fn expect_integer(attribute: &'static str, value: &Value) -> Result<i64> {
    value.as_integer().ok_or_else(|| DeviceError::InvalidValueType {
        attribute,
        expected: "integer",
        got: value.type_name(),
    })
}

/// Read a float request value
pub(crate) fn expect_float(attribute: &'static str, value: &Value) -> Result<f64> {
    value.as_float().ok_or_else(|| DeviceError::InvalidValueType {
        attribute,
        expected: "float",
        got: value.type_name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_from_entry() {
        let entry = DeviceEntry::new(99, 0xFA, "560000AG").with_subtype(5);
        let info = DeviceInfo::from(&entry);
        assert_eq!(info.device_id, 99);
        assert_eq!(info.device_type, DeviceType::FA);
        assert_eq!(info.model, "560000AG");
        assert_eq!(info.subtype, 5);
    }

    #[test]
    fn test_expect_helpers() {
        assert!(expect_bool("power", &Value::Bool(true)).unwrap());
        assert!(!expect_bool("power", &Value::Integer(0)).unwrap());
        assert!(matches!(
            expect_bool("power", &Value::String("on".into())),
            Err(DeviceError::InvalidValueType { expected: "bool", .. })
        ));
        assert_eq!(expect_integer("fan_speed", &Value::Float(3.0)).unwrap(), 3);
        assert!(expect_integer("fan_speed", &Value::Float(3.5)).is_err());
        assert_eq!(expect_float("target_temperature", &Value::Integer(24)).unwrap(), 24.0);
    }

    #[test]
    fn test_error_messages() {
        let err = DeviceError::InvalidValueType {
            attribute: "power",
            expected: "bool",
            got: "string",
        };
        assert_eq!(
            err.to_string(),
            "Invalid value type for attribute power: expected bool, got string"
        );
        let err: DeviceError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, DeviceError::Customize(_)));
    }
}

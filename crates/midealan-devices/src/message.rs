/*!
 * Message envelope.
 *
 * Outgoing commands implement [`MessageRequest`] and are turned into a
 * [`Message`] whose body the transport encrypts and sends. Incoming bodies
 * arrive as a [`Response`] and are parsed by a family-specific
 * [`MessageBody`].
 */
use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use thiserror::Error;

/// Device class code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeviceType(pub u8);

impl DeviceType {
    /// Climate unit
    pub const CC: DeviceType = DeviceType(0xCC);
    /// Fan unit
    pub const FA: DeviceType = DeviceType(0xFA);
    /// First code of the newer code-space era
    pub const A0: DeviceType = DeviceType(0xA0);

    /// Raw protocol code
    pub fn code(self) -> u8 {
        self.0
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

impl From<u8> for DeviceType {
    fn from(code: u8) -> Self {
        DeviceType(code)
    }
}

/// Message type taken from the frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Set command / set acknowledgement
    Set,
    /// Query command / query response
    Query,
    /// Unsolicited status notification
    Notify1,
    /// Second notification channel
    Notify2,
    /// Exception report
    Exception,
    /// Serial number query
    QuerySn,
    /// Second exception channel
    Exception2,
    /// Subtype query
    QuerySubtype,
    /// A code this crate does not know
    Unknown(u8),
}

impl MessageType {
    /// Decode a header byte
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x02 => Self::Set,
            0x03 => Self::Query,
            0x04 => Self::Notify1,
            0x05 => Self::Notify2,
            0x06 => Self::Exception,
            0x07 => Self::QuerySn,
            0x0A => Self::Exception2,
            0xA0 => Self::QuerySubtype,
            other => Self::Unknown(other),
        }
    }

    /// Header byte
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Set => 0x02,
            Self::Query => 0x03,
            Self::Notify1 => 0x04,
            Self::Notify2 => 0x05,
            Self::Exception => 0x06,
            Self::QuerySn => 0x07,
            Self::Exception2 => 0x0A,
            Self::QuerySubtype => 0xA0,
            Self::Unknown(v) => v,
        }
    }

    /// Lower-case name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Query => "query",
            Self::Notify1 => "notify1",
            Self::Notify2 => "notify2",
            Self::Exception => "exception",
            Self::QuerySn => "query_sn",
            Self::Exception2 => "exception2",
            Self::QuerySubtype => "query_subtype",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(v) => write!(f, "unknown(0x{:02X})", v),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for MessageType {
    type Err = ParseError;

    /// Accepts a name (`set`, `notify1`, ...) or a numeric code (`0x04`, `4`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let named = match lower.as_str() {
            "set" => Some(Self::Set),
            "query" => Some(Self::Query),
            "notify1" => Some(Self::Notify1),
            "notify2" => Some(Self::Notify2),
            "exception" => Some(Self::Exception),
            "query_sn" => Some(Self::QuerySn),
            "exception2" => Some(Self::Exception2),
            "query_subtype" => Some(Self::QuerySubtype),
            _ => None,
        };
        if let Some(message_type) = named {
            return Ok(message_type);
        }
        parse_u8(&lower)
            .map(Self::from_u8)
            .ok_or_else(|| ParseError::InvalidName(s.to_string()))
    }
}

/// Body-type codes (first byte of a body)
pub mod body_type {
    /// General layout
    pub const X00: u8 = 0x00;
    /// Status layout
    pub const X01: u8 = 0x01;
    /// Fan sub-variant that keeps byte 13 clear
    pub const X0A: u8 = 0x0A;
    /// Fan sub-variant using the short set layout
    pub const A1: u8 = 0xA1;
    /// Climate set layout
    pub const C3: u8 = 0xC3;
}

/// Errors raised while parsing bodies or textual codec input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Body shorter than the family layout requires
    #[error("Body too short: expected at least {expected} bytes, got {got}")]
    TooShort {
        /// Minimum length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// Malformed hex input
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    /// Unknown name or code
    #[error("Invalid name: {0}")]
    InvalidName(String),
}

/// A serialized outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    device_type: DeviceType,
    message_type: MessageType,
    body_type: Option<u8>,
    protocol_version: u8,
    payload: Bytes,
}

impl Message {
    /// Create a new message
    pub fn new(
        device_type: DeviceType,
        message_type: MessageType,
        body_type: Option<u8>,
        protocol_version: u8,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            device_type,
            message_type,
            body_type,
            protocol_version,
            payload: payload.into(),
        }
    }

    /// Device class code
    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// Message type
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Body-type code, if the body carries one
    pub fn body_type(&self) -> Option<u8> {
        self.body_type
    }

    /// Protocol version for the frame header
    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    /// Family payload without the body-type byte
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Full body handed to the transport: `[body_type] ++ payload`
    pub fn body(&self) -> Bytes {
        let Some(body_type) = self.body_type else {
            return self.payload.clone();
        };
        let mut body = BytesMut::with_capacity(self.payload.len() + 1);
        body.put_u8(body_type);
        body.put_slice(&self.payload);
        body.freeze()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} device_type={} protocol_version={} body={}",
            self.message_type,
            self.device_type,
            self.protocol_version,
            to_hex(&self.body())
        )
    }
}

/// A command that serializes to a message body
pub trait MessageRequest {
    /// Device class this command is addressed to
    const DEVICE_TYPE: DeviceType;

    /// Message type
    fn message_type(&self) -> MessageType;

    /// Body-type code prefixed to the payload
    fn body_type(&self) -> Option<u8>;

    /// Serialize the payload (excluding the body-type byte)
    fn payload(&self) -> Vec<u8>;

    /// Build the message
    fn to_message(&self, protocol_version: u8) -> Message {
        Message::new(
            Self::DEVICE_TYPE,
            self.message_type(),
            self.body_type(),
            protocol_version,
            self.payload(),
        )
    }
}

/// A status body parsed from received bytes
///
/// Byte indices count from the body-type byte at index 0.
pub trait MessageBody: Sized {
    /// Minimum body length the layout reads from
    const MIN_LEN: usize;

    /// Decode fields from a body at least `MIN_LEN` long
    fn from_body(body: &[u8]) -> Self;

    /// Parse with length validation
    fn parse(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < Self::MIN_LEN {
            return Err(ParseError::TooShort {
                expected: Self::MIN_LEN,
                got: body.len(),
            });
        }
        Ok(Self::from_body(body))
    }
}

/// A received message body with its header classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    message_type: MessageType,
    body: Bytes,
}

impl Response {
    /// Create a response from the header message type and the decrypted body
    pub fn new(message_type: MessageType, body: impl Into<Bytes>) -> Self {
        Self {
            message_type,
            body: body.into(),
        }
    }

    /// Message type
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Body-type code (first body byte)
    pub fn body_type(&self) -> Option<u8> {
        self.body.first().copied()
    }

    /// Raw body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} body={}", self.message_type, to_hex(&self.body))
    }
}

/// Format bytes as colon-separated lower-case hex
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse hex with optional `:`/space/`-` separators
pub fn from_hex(s: &str) -> Result<Vec<u8>, ParseError> {
    let digits: String = s
        .chars()
        .filter(|c| !matches!(c, ':' | ' ' | '-' | '\n' | '\t'))
        .collect();
    if digits.len() % 2 != 0 {
        return Err(ParseError::InvalidHex(s.to_string()));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ParseError::InvalidHex(s.to_string()))
        })
        .collect()
}

/// Parse a byte written as decimal or `0x` hex
pub fn parse_u8(s: &str) -> Option<u8> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl MessageRequest for Probe {
        const DEVICE_TYPE: DeviceType = DeviceType::FA;

        fn message_type(&self) -> MessageType {
            MessageType::Set
        }

        fn body_type(&self) -> Option<u8> {
            Some(body_type::X00)
        }

        fn payload(&self) -> Vec<u8> {
            vec![0xAB, 0xCD]
        }
    }

    #[derive(Debug)]
    struct TwoBytes(u8);

    impl MessageBody for TwoBytes {
        const MIN_LEN: usize = 2;

        fn from_body(body: &[u8]) -> Self {
            TwoBytes(body[1])
        }
    }

    #[test]
    fn test_message_type_codes() {
        for code in [0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x0A, 0xA0] {
            let message_type = MessageType::from_u8(code);
            assert!(!matches!(message_type, MessageType::Unknown(_)));
            assert_eq!(message_type.as_u8(), code);
        }
        assert_eq!(MessageType::from_u8(0x42), MessageType::Unknown(0x42));
        assert_eq!(MessageType::Unknown(0x42).as_u8(), 0x42);
    }

    #[test]
    fn test_message_type_from_str() {
        assert_eq!("notify1".parse::<MessageType>(), Ok(MessageType::Notify1));
        assert_eq!("SET".parse::<MessageType>(), Ok(MessageType::Set));
        assert_eq!("0x03".parse::<MessageType>(), Ok(MessageType::Query));
        assert_eq!("5".parse::<MessageType>(), Ok(MessageType::Notify2));
        assert!("bogus".parse::<MessageType>().is_err());
    }

    #[test]
    fn test_request_body_prefixes_body_type() {
        let message = Probe.to_message(3);
        assert_eq!(message.device_type(), DeviceType::FA);
        assert_eq!(message.protocol_version(), 3);
        assert_eq!(message.payload(), &[0xAB, 0xCD]);
        assert_eq!(&message.body()[..], &[0x00, 0xAB, 0xCD]);
    }

    #[test]
    fn test_body_without_body_type() {
        let message = Message::new(DeviceType::FA, MessageType::Query, None, 0, Vec::new());
        assert!(message.body().is_empty());
    }

    #[test]
    fn test_message_body_length_check() {
        assert_eq!(
            TwoBytes::parse(&[0x01]).unwrap_err(),
            ParseError::TooShort { expected: 2, got: 1 }
        );
        assert_eq!(TwoBytes::parse(&[0x01, 0x7F]).unwrap().0, 0x7F);
    }

    #[test]
    fn test_response_body_type() {
        let response = Response::new(MessageType::Notify1, vec![0x01, 0x84]);
        assert_eq!(response.body_type(), Some(0x01));
        assert_eq!(Response::new(MessageType::Query, Vec::new()).body_type(), None);
    }

    #[test]
    fn test_hex() {
        assert_eq!(to_hex(&[0x00, 0xC3, 0xFF]), "00:c3:ff");
        assert_eq!(from_hex("00:c3:FF").unwrap(), vec![0x00, 0xC3, 0xFF]);
        assert_eq!(from_hex("00c3 ff").unwrap(), vec![0x00, 0xC3, 0xFF]);
        assert!(from_hex("0").is_err());
        assert!(from_hex("zz").is_err());
    }

    #[test]
    fn test_display() {
        let message = Probe.to_message(0);
        assert_eq!(
            message.to_string(),
            "set device_type=0xFA protocol_version=0 body=00:ab:cd"
        );
    }
}

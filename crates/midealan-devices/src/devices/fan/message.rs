//! Fan unit (0xFA) message bodies
//!
//! Status layout (index 0 is the body-type byte):
//!
//! | byte | bits | field                           |
//! |------|------|---------------------------------|
//! | 4    | 0    | power                           |
//! | 4    | 1-4  | mode, shifted nibble            |
//! | 5    | all  | fan speed, valid in `[1, 26]`   |
//! | 8    | 0    | oscillate                       |
//!
//! The set payload is one byte behind: payload byte 3 lands at status byte 4.

use crate::codec;
use crate::message::{
    body_type, DeviceType, MessageBody, MessageRequest, MessageType, ParseError, Response,
};

/// Highest fan speed the protocol accepts
pub const MAX_FAN_SPEED: u8 = 26;

/// Short set layout length
pub const SHORT_PAYLOAD_LEN: usize = 18;

/// Long set layout length
pub const LONG_PAYLOAD_LEN: usize = 50;

/// Value of the power/mode and oscillate bytes when they are left unchanged
pub const NO_CHANGE: u8 = 0x80;

const POWER_MODE_BYTE: usize = 3;
const FAN_SPEED_BYTE: usize = 4;
const OSCILLATE_BYTE: usize = 7;
const SHORT_LAYOUT_MARKER_BYTE: usize = 13;

/// Whether a subtype uses the 18-byte set layout
pub fn uses_short_layout(subtype: u16) -> bool {
    (1..=u16::from(body_type::X0A)).contains(&subtype) || subtype == u16::from(body_type::A1)
}

/// Query command; the fan query has an empty body
#[derive(Debug, Clone, Copy, Default)]
pub struct FanQuery;

impl MessageRequest for FanQuery {
    const DEVICE_TYPE: DeviceType = DeviceType::FA;

    fn message_type(&self) -> MessageType {
        MessageType::Query
    }

    fn body_type(&self) -> Option<u8> {
        None
    }

    fn payload(&self) -> Vec<u8> {
        Vec::new()
    }
}

/// Set command draft
///
/// Fields left as `None` serialize to the layout's no-op value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FanSet {
    /// Appliance subtype, selects the layout
    pub subtype: u16,
    /// Requested power state
    pub power: Option<bool>,
    /// Requested wire mode; also asserts power on the wire
    pub mode: Option<u8>,
    /// Requested fan speed, written only inside `[1, MAX_FAN_SPEED]`
    pub fan_speed: Option<i64>,
    /// Requested oscillation
    pub oscillate: Option<bool>,
}

impl FanSet {
    /// Empty draft for a subtype
    pub fn new(subtype: u16) -> Self {
        Self {
            subtype,
            ..Self::default()
        }
    }

    fn template(&self) -> Vec<u8> {
        let short = uses_short_layout(self.subtype);
        let mut body = vec![0x00; if short { SHORT_PAYLOAD_LEN } else { LONG_PAYLOAD_LEN }];
        body[POWER_MODE_BYTE] = NO_CHANGE;
        body[OSCILLATE_BYTE] = NO_CHANGE;
        if short && self.subtype != u16::from(body_type::X0A) {
            body[SHORT_LAYOUT_MARKER_BYTE] = 0xFF;
        }
        body
    }
}

impl MessageRequest for FanSet {
    const DEVICE_TYPE: DeviceType = DeviceType::FA;

    fn message_type(&self) -> MessageType {
        MessageType::Set
    }

    fn body_type(&self) -> Option<u8> {
        Some(body_type::X00)
    }

    fn payload(&self) -> Vec<u8> {
        let mut body = self.template();
        if let Some(power) = self.power {
            body[POWER_MODE_BYTE] = u8::from(power);
        }
        if let Some(mode) = self.mode {
            body[POWER_MODE_BYTE] = codec::encode_shifted_mode(mode);
        }
        let fan_speed = self
            .fan_speed
            .and_then(|speed| codec::range_gate(speed, MAX_FAN_SPEED));
        if let Some(fan_speed) = fan_speed {
            body[FAN_SPEED_BYTE] = fan_speed;
        }
        if let Some(oscillate) = self.oscillate {
            body[OSCILLATE_BYTE] = u8::from(oscillate);
        }
        body
    }
}

/// Decoded status body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanStatus {
    /// Power state
    pub power: bool,
    /// Wire mode, `None` when the nibble is clear
    pub mode: Option<u8>,
    /// Fan speed, 0 when outside `[1, MAX_FAN_SPEED]`
    pub fan_speed: u8,
    /// Oscillation
    pub oscillate: bool,
}

impl MessageBody for FanStatus {
    const MIN_LEN: usize = 9;

    fn from_body(body: &[u8]) -> Self {
        Self {
            power: codec::flag(body[4], 0x01),
            mode: codec::decode_shifted_mode(body[4]),
            fan_speed: codec::range_gate(i64::from(body[5]), MAX_FAN_SPEED).unwrap_or(0),
            oscillate: codec::flag(body[8], 0x01),
        }
    }
}

impl FanStatus {
    /// Decode a response if its message type carries fan status.
    ///
    /// Query, set and notify1 frames decode whatever their body type.
    pub fn decode(response: &Response) -> Result<Option<Self>, ParseError> {
        match response.message_type() {
            MessageType::Query | MessageType::Set | MessageType::Notify1 => {
                Self::parse(response.body()).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_status(set: &FanSet) -> FanStatus {
        let body = set.to_message(0).body();
        FanStatus::parse(&body).unwrap()
    }

    #[test]
    fn test_short_layout_scenario() {
        let set = FanSet {
            power: Some(true),
            fan_speed: Some(10),
            ..FanSet::new(5)
        };
        let payload = set.payload();
        assert_eq!(payload.len(), SHORT_PAYLOAD_LEN);
        assert_eq!(payload[3], 0x01);
        assert_eq!(payload[4], 10);
        assert_eq!(payload[13], 0xFF);
        assert_eq!(payload[7], NO_CHANGE);
    }

    #[test]
    fn test_layout_selection() {
        for subtype in [1u16, 5, 9, 0xA1] {
            let payload = FanSet::new(subtype).payload();
            assert_eq!(payload.len(), SHORT_PAYLOAD_LEN, "subtype {}", subtype);
            assert_eq!(payload[13], 0xFF);
        }

        let payload = FanSet::new(0x0A).payload();
        assert_eq!(payload.len(), SHORT_PAYLOAD_LEN);
        assert_eq!(payload[13], 0x00);

        for subtype in [0u16, 0x0B, 0xA0, 0xA2, 0x1234] {
            let payload = FanSet::new(subtype).payload();
            assert_eq!(payload.len(), LONG_PAYLOAD_LEN, "subtype {}", subtype);
            assert_eq!(payload[13], 0x00);
        }
    }

    #[test]
    fn test_empty_draft_is_no_op() {
        let payload = FanSet::new(0).payload();
        assert_eq!(payload[3], NO_CHANGE);
        assert_eq!(payload[4], 0x00);
        assert_eq!(payload[7], NO_CHANGE);
    }

    #[test]
    fn test_mode_forces_power_bit() {
        let set = FanSet {
            power: Some(false),
            mode: Some(2),
            ..FanSet::new(5)
        };
        assert_eq!(set.payload()[3], 0x07);
        let status = as_status(&set);
        assert!(status.power);
        assert_eq!(status.mode, Some(2));
    }

    #[test]
    fn test_out_of_range_speed_left_unset() {
        for fan_speed in [0i64, 27, 283, -1] {
            let set = FanSet {
                fan_speed: Some(fan_speed),
                ..FanSet::new(5)
            };
            assert_eq!(set.payload()[4], 0x00, "speed {}", fan_speed);
        }
    }

    #[test]
    fn test_set_round_trips_through_status_decode() {
        for subtype in [5u16, 0x20] {
            for fan_speed in 1..=MAX_FAN_SPEED {
                for oscillate in [false, true] {
                    let set = FanSet {
                        power: Some(true),
                        fan_speed: Some(i64::from(fan_speed)),
                        oscillate: Some(oscillate),
                        ..FanSet::new(subtype)
                    };
                    let status = as_status(&set);
                    assert!(status.power);
                    assert_eq!(status.mode, None);
                    assert_eq!(status.fan_speed, fan_speed);
                    assert_eq!(status.oscillate, oscillate);
                }
            }
            for mode in 0..=14u8 {
                let set = FanSet {
                    mode: Some(mode),
                    ..FanSet::new(subtype)
                };
                assert_eq!(as_status(&set).mode, Some(mode));
            }
        }
    }

    #[test]
    fn test_decode_classification() {
        let body = vec![0x00, 0, 0, 0, 0x05, 12, 0, 0, 0x01];
        for message_type in [MessageType::Query, MessageType::Set, MessageType::Notify1] {
            let status = FanStatus::decode(&Response::new(message_type, body.clone()))
                .unwrap()
                .unwrap();
            assert!(status.power);
            assert_eq!(status.mode, Some(1));
            assert_eq!(status.fan_speed, 12);
            assert!(status.oscillate);
        }
        let ignored = [
            MessageType::Notify2,
            MessageType::Exception,
            MessageType::Unknown(0x42),
        ];
        for message_type in ignored {
            assert!(FanStatus::decode(&Response::new(message_type, body.clone()))
                .unwrap()
                .is_none());
        }
    }

    #[test]
    fn test_decode_out_of_range_speed() {
        let status = FanStatus::parse(&[0x00, 0, 0, 0, 0x01, 27, 0, 0, 0]).unwrap();
        assert_eq!(status.fan_speed, 0);
        assert_eq!(status.mode, None);
    }

    #[test]
    fn test_decode_short_body() {
        let response = Response::new(MessageType::Notify1, vec![0x00, 0x01]);
        assert_eq!(
            FanStatus::decode(&response).unwrap_err(),
            ParseError::TooShort { expected: 9, got: 2 }
        );
    }

    #[test]
    fn test_query_is_empty() {
        let message = FanQuery.to_message(2);
        assert!(message.body().is_empty());
        assert_eq!(message.message_type(), MessageType::Query);
        assert_eq!(message.protocol_version(), 2);
    }
}

//! Climate unit (0xCC) message bodies
//!
//! Status layout (index 0 is the body-type byte):
//!
//! | byte | bits | field                              |
//! |------|------|------------------------------------|
//! | 1    | 7    | power                              |
//! | 1    | 0-4  | mode, bit position                 |
//! | 2    | all  | fan speed                          |
//! | 3    | all  | target temperature, integer part   |
//! | 4    | all  | indoor temperature, `(b - 40) / 2` |
//! | 13   | 0    | eco mode                           |
//! | 13   | 1    | auto aux heat running              |
//! | 13   | 2    | swing                              |
//! | 13   | 3    | ventilation                        |
//! | 13   | 6    | fan speed level                    |
//! | 14   | 3    | night light                        |
//! | 14   | 4    | sleep mode                         |
//! | 14   | 5-6  | aux heat status                    |
//! | 14   | 7    | precision 1.0 (set) / 0.5 (clear)  |
//! | 19   | all  | target temperature, tenths         |
//! | 20   | 7    | Fahrenheit display                 |

use crate::codec;
use crate::message::{
    body_type, DeviceType, MessageBody, MessageRequest, MessageType, ParseError, Response,
};

/// Length of the set and query payloads
pub const PAYLOAD_LEN: usize = 23;

/// Non-stepless fan speed marker, always sent in set byte 6
pub const NON_STEPLESS_FAN_SPEED: u8 = 0xFF;

/// Fan speed value meaning "automatic"
pub const FAN_SPEED_AUTO: u8 = 0x80;

const POWER_BIT: u8 = 0x80;
const MODE_MASK: u8 = 0x1F;

/// Auxiliary heater stage 1
pub const AUX_HEAT_STAGE_1: u8 = 1;
/// Auxiliary heater stage 2
pub const AUX_HEAT_STAGE_2: u8 = 2;

/// Query command: a zero body asking for the current state
#[derive(Debug, Clone, Copy, Default)]
pub struct ClimateQuery;

impl MessageRequest for ClimateQuery {
    const DEVICE_TYPE: DeviceType = DeviceType::CC;

    fn message_type(&self) -> MessageType {
        MessageType::Query
    }

    fn body_type(&self) -> Option<u8> {
        Some(body_type::X01)
    }

    fn payload(&self) -> Vec<u8> {
        vec![0x00; PAYLOAD_LEN]
    }
}

/// Set command carrying the complete desired state
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateSet {
    /// Power state
    pub power: bool,
    /// Operating mode (1-5)
    pub mode: u8,
    /// Raw fan speed byte
    pub fan_speed: u8,
    /// Target temperature in degrees
    pub target_temperature: f64,
    /// Eco mode
    pub eco_mode: bool,
    /// Sleep mode
    pub sleep_mode: bool,
    /// Night light
    pub night_light: bool,
    /// Ventilation
    pub ventilation: bool,
    /// Auxiliary heater stage (0-2)
    pub aux_heat_status: u8,
    /// Louver swing
    pub swing: bool,
}

impl Default for ClimateSet {
    fn default() -> Self {
        Self {
            power: false,
            mode: 4,
            fan_speed: FAN_SPEED_AUTO,
            target_temperature: 26.0,
            eco_mode: false,
            sleep_mode: false,
            night_light: false,
            ventilation: false,
            aux_heat_status: 0,
            swing: false,
        }
    }
}

impl MessageRequest for ClimateSet {
    const DEVICE_TYPE: DeviceType = DeviceType::CC;

    fn message_type(&self) -> MessageType {
        MessageType::Set
    }

    fn body_type(&self) -> Option<u8> {
        Some(body_type::C3)
    }

    fn payload(&self) -> Vec<u8> {
        let (temperature_integer, temperature_tenths) =
            codec::split_tenths(self.target_temperature);
        let aux_heating = match self.aux_heat_status {
            AUX_HEAT_STAGE_1 => 0x10,
            AUX_HEAT_STAGE_2 => 0x20,
            _ => 0x00,
        };

        let mut body = vec![0x00; PAYLOAD_LEN];
        body[0] = codec::encode_flag(self.power, POWER_BIT)
            | codec::encode_bit_position(self.mode);
        body[1] = self.fan_speed;
        body[2] = temperature_integer;
        // bytes 3-4: timer, unused
        body[5] = codec::encode_flag(self.eco_mode, 0x01)
            | codec::encode_flag(self.swing, 0x04)
            | codec::encode_flag(self.ventilation, 0x08)
            | aux_heating;
        body[6] = NON_STEPLESS_FAN_SPEED;
        body[7] = codec::encode_flag(self.sleep_mode, 0x10)
            | codec::encode_flag(self.night_light, 0x08);
        body[10] = temperature_tenths;
        body
    }
}

/// Decoded status body
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateStatus {
    /// Power state
    pub power: bool,
    /// Operating mode (1-5)
    pub mode: u8,
    /// Raw fan speed byte
    pub fan_speed: u8,
    /// Target temperature in degrees
    pub target_temperature: f64,
    /// Measured indoor temperature
    pub indoor_temperature: f64,
    /// Eco mode
    pub eco_mode: bool,
    /// Sleep mode
    pub sleep_mode: bool,
    /// Night light
    pub night_light: bool,
    /// Ventilation
    pub ventilation: bool,
    /// Auxiliary heater stage (0-2)
    pub aux_heat_status: u8,
    /// Automatic aux heat is running
    pub auto_aux_heat_running: bool,
    /// Fan speed level flag
    pub fan_speed_level: bool,
    /// Display precision, 1.0 or 0.5
    pub temperature_precision: f64,
    /// Louver swing
    pub swing: bool,
    /// Display in Fahrenheit
    pub temp_fahrenheit: bool,
}

impl MessageBody for ClimateStatus {
    const MIN_LEN: usize = 21;

    fn from_body(body: &[u8]) -> Self {
        Self {
            power: codec::flag(body[1], POWER_BIT),
            mode: codec::decode_bit_position(body[1], MODE_MASK),
            fan_speed: body[2],
            target_temperature: codec::join_tenths(body[3], body[19]),
            indoor_temperature: (f64::from(body[4]) - 40.0) / 2.0,
            eco_mode: codec::flag(body[13], 0x01),
            auto_aux_heat_running: codec::flag(body[13], 0x02),
            swing: codec::flag(body[13], 0x04),
            ventilation: codec::flag(body[13], 0x08),
            fan_speed_level: codec::flag(body[13], 0x40),
            night_light: codec::flag(body[14], 0x08),
            sleep_mode: codec::flag(body[14], 0x10),
            aux_heat_status: (body[14] & 0x60) >> 5,
            temperature_precision: if codec::flag(body[14], 0x80) { 1.0 } else { 0.5 },
            temp_fahrenheit: codec::flag(body[20], 0x80),
        }
    }
}

impl ClimateStatus {
    /// Decode a response if its (message type, body type) pair carries status.
    ///
    /// Unrecognised pairs return `Ok(None)`.
    pub fn decode(response: &Response) -> Result<Option<Self>, ParseError> {
        let recognized = matches!(
            (response.message_type(), response.body_type()),
            (
                MessageType::Query | MessageType::Notify1 | MessageType::Notify2,
                Some(body_type::X01)
            ) | (MessageType::Set, Some(body_type::C3))
        );
        if !recognized {
            return Ok(None);
        }
        Self::parse(response.body()).map(Some)
    }
}

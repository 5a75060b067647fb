/*!
 * Climate unit (0xCC) adapter.
 *
 * The climate set command has no per-field no-op value, so every command is
 * built from the adapter's full current state with the requested change
 * applied on top.
 */

pub mod message;

use serde::Deserialize;
use tracing::{debug, error, warn};

use midealan_core::config::DeviceEntry;
use midealan_core::logging::{device_span, Span};
use midealan_core::types::Value;

use crate::attribute::{changed, Attribute, AttributeDelta, AttributeMap, Tracker};
use crate::device::{
    expect_bool, expect_float, expect_integer, DeviceAdapter, DeviceError, DeviceInfo, Result,
};
use crate::message::{Message, MessageRequest, Response};

pub use message::{ClimateQuery, ClimateSet, ClimateStatus};

/// Climate operating modes, numbered as on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimateMode {
    /// Fan only
    FanOnly = 1,
    /// Dehumidify
    Dry = 2,
    /// Heat
    Heat = 3,
    /// Cool
    Cool = 4,
    /// Automatic
    Auto = 5,
}

impl ClimateMode {
    /// Every mode in wire order
    pub const ALL: [ClimateMode; 5] = [
        ClimateMode::FanOnly,
        ClimateMode::Dry,
        ClimateMode::Heat,
        ClimateMode::Cool,
        ClimateMode::Auto,
    ];

    /// Wire value
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Convert to string
    pub fn as_str(self) -> &'static str {
        match self {
            ClimateMode::FanOnly => "fan_only",
            ClimateMode::Dry => "dry",
            ClimateMode::Heat => "heat",
            ClimateMode::Cool => "cool",
            ClimateMode::Auto => "auto",
        }
    }

    /// Look up a wire value
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Parse from string
    pub fn from_name(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        Self::ALL.into_iter().find(|m| m.as_str() == lower)
    }
}

impl TryFrom<&Value> for ClimateMode {
    type Error = DeviceError;

    fn try_from(value: &Value) -> std::result::Result<Self, Self::Error> {
        let mode = match value {
            Value::String(s) => ClimateMode::from_name(s).or_else(|| {
                s.trim()
                    .parse::<u8>()
                    .ok()
                    .and_then(ClimateMode::from_code)
            }),
            other => other
                .as_integer()
                .and_then(|code| u8::try_from(code).ok())
                .and_then(ClimateMode::from_code),
        };
        mode.ok_or_else(|| DeviceError::UnknownMode(value.to_string()))
    }
}

/// Attributes of the climate family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimateAttribute {
    /// Power state
    Power,
    /// Operating mode, wire value 1-5
    Mode,
    /// Raw fan speed byte
    FanSpeed,
    /// Target temperature
    TargetTemperature,
    /// Indoor temperature (read-only)
    IndoorTemperature,
    /// Eco mode
    EcoMode,
    /// Sleep mode
    SleepMode,
    /// Night light
    NightLight,
    /// Ventilation
    Ventilation,
    /// Auxiliary heater stage
    AuxHeatStatus,
    /// Automatic aux heat running (read-only)
    AutoAuxHeatRunning,
    /// Fan speed level flag (read-only)
    FanSpeedLevel,
    /// Temperature precision (read-only)
    TemperaturePrecision,
    /// Louver swing
    Swing,
    /// Fahrenheit display (read-only)
    TempFahrenheit,
}

impl Attribute for ClimateAttribute {
    const ALL: &'static [Self] = &[
        ClimateAttribute::Power,
        ClimateAttribute::Mode,
        ClimateAttribute::FanSpeed,
        ClimateAttribute::TargetTemperature,
        ClimateAttribute::IndoorTemperature,
        ClimateAttribute::EcoMode,
        ClimateAttribute::SleepMode,
        ClimateAttribute::NightLight,
        ClimateAttribute::Ventilation,
        ClimateAttribute::AuxHeatStatus,
        ClimateAttribute::AutoAuxHeatRunning,
        ClimateAttribute::FanSpeedLevel,
        ClimateAttribute::TemperaturePrecision,
        ClimateAttribute::Swing,
        ClimateAttribute::TempFahrenheit,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ClimateAttribute::Power => "power",
            ClimateAttribute::Mode => "mode",
            ClimateAttribute::FanSpeed => "fan_speed",
            ClimateAttribute::TargetTemperature => "target_temperature",
            ClimateAttribute::IndoorTemperature => "indoor_temperature",
            ClimateAttribute::EcoMode => "eco_mode",
            ClimateAttribute::SleepMode => "sleep_mode",
            ClimateAttribute::NightLight => "night_light",
            ClimateAttribute::Ventilation => "ventilation",
            ClimateAttribute::AuxHeatStatus => "aux_heat_status",
            ClimateAttribute::AutoAuxHeatRunning => "auto_aux_heat_running",
            ClimateAttribute::FanSpeedLevel => "fan_speed_level",
            ClimateAttribute::TemperaturePrecision => "temperature_precision",
            ClimateAttribute::Swing => "swing",
            ClimateAttribute::TempFahrenheit => "temp_fahrenheit",
        }
    }
}

/// Last decoded climate state
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateState {
    /// Power state
    pub power: bool,
    /// Operating mode
    pub mode: u8,
    /// Fan speed, 0 while off
    pub fan_speed: u8,
    /// Target temperature
    pub target_temperature: f64,
    /// Indoor temperature, unknown until the first status frame
    pub indoor_temperature: Option<f64>,
    /// Eco mode
    pub eco_mode: bool,
    /// Sleep mode
    pub sleep_mode: bool,
    /// Night light
    pub night_light: bool,
    /// Ventilation
    pub ventilation: bool,
    /// Auxiliary heater stage
    pub aux_heat_status: u8,
    /// Automatic aux heat running
    pub auto_aux_heat_running: bool,
    /// Fan speed level flag, unknown until the first status frame
    pub fan_speed_level: Option<bool>,
    /// Temperature precision
    pub temperature_precision: f64,
    /// Louver swing
    pub swing: bool,
    /// Fahrenheit display
    pub temp_fahrenheit: bool,
    /// Last fan speed byte the unit reported, kept while it is off
    wire_fan_speed: u8,
    /// Whether a status frame has been merged
    observed: bool,
}

impl Default for ClimateState {
    fn default() -> Self {
        let set = ClimateSet::default();
        Self {
            power: set.power,
            mode: set.mode,
            fan_speed: set.fan_speed,
            target_temperature: set.target_temperature,
            indoor_temperature: None,
            eco_mode: false,
            sleep_mode: false,
            night_light: false,
            ventilation: false,
            aux_heat_status: 0,
            auto_aux_heat_running: false,
            fan_speed_level: None,
            temperature_precision: 1.0,
            swing: false,
            temp_fahrenheit: false,
            wire_fan_speed: set.fan_speed,
            observed: false,
        }
    }
}

impl ClimateState {
    /// Current value of one attribute
    pub fn value(&self, attribute: ClimateAttribute) -> Value {
        match attribute {
            ClimateAttribute::Power => self.power.into(),
            ClimateAttribute::Mode => self.mode.into(),
            ClimateAttribute::FanSpeed => self.fan_speed.into(),
            ClimateAttribute::TargetTemperature => self.target_temperature.into(),
            ClimateAttribute::IndoorTemperature => self.indoor_temperature.into(),
            ClimateAttribute::EcoMode => self.eco_mode.into(),
            ClimateAttribute::SleepMode => self.sleep_mode.into(),
            ClimateAttribute::NightLight => self.night_light.into(),
            ClimateAttribute::Ventilation => self.ventilation.into(),
            ClimateAttribute::AuxHeatStatus => self.aux_heat_status.into(),
            ClimateAttribute::AutoAuxHeatRunning => self.auto_aux_heat_running.into(),
            ClimateAttribute::FanSpeedLevel => self.fan_speed_level.into(),
            ClimateAttribute::TemperaturePrecision => self.temperature_precision.into(),
            ClimateAttribute::Swing => self.swing.into(),
            ClimateAttribute::TempFahrenheit => self.temp_fahrenheit.into(),
        }
    }

    /// Merge a decoded status body, returning the attributes that changed
    /// or were observed for the first time
    pub fn merge(&mut self, status: &ClimateStatus) -> AttributeDelta {
        use ClimateAttribute as A;

        let fan_speed = if status.power { status.fan_speed } else { 0 };
        self.wire_fan_speed = status.fan_speed;

        let mut tracker = Tracker::new(self.observed);
        self.observed = true;
        tracker.track(A::Power.as_str(), &mut self.power, status.power);
        tracker.track(A::Mode.as_str(), &mut self.mode, status.mode);
        tracker.track(A::FanSpeed.as_str(), &mut self.fan_speed, fan_speed);
        tracker.track(
            A::TargetTemperature.as_str(),
            &mut self.target_temperature,
            status.target_temperature,
        );
        tracker.track(
            A::IndoorTemperature.as_str(),
            &mut self.indoor_temperature,
            Some(status.indoor_temperature),
        );
        tracker.track(A::EcoMode.as_str(), &mut self.eco_mode, status.eco_mode);
        tracker.track(A::SleepMode.as_str(), &mut self.sleep_mode, status.sleep_mode);
        tracker.track(A::NightLight.as_str(), &mut self.night_light, status.night_light);
        tracker.track(A::Ventilation.as_str(), &mut self.ventilation, status.ventilation);
        tracker.track(
            A::AuxHeatStatus.as_str(),
            &mut self.aux_heat_status,
            status.aux_heat_status,
        );
        tracker.track(
            A::AutoAuxHeatRunning.as_str(),
            &mut self.auto_aux_heat_running,
            status.auto_aux_heat_running,
        );
        tracker.track(
            A::FanSpeedLevel.as_str(),
            &mut self.fan_speed_level,
            Some(status.fan_speed_level),
        );
        tracker.track(
            A::TemperaturePrecision.as_str(),
            &mut self.temperature_precision,
            status.temperature_precision,
        );
        tracker.track(A::Swing.as_str(), &mut self.swing, status.swing);
        tracker.track(
            A::TempFahrenheit.as_str(),
            &mut self.temp_fahrenheit,
            status.temp_fahrenheit,
        );
        tracker.finish()
    }

    /// A set command re-sending the whole current state
    ///
    /// The fan speed byte is the one last reported on the wire, not the 0
    /// reported while the unit is off.
    pub fn to_set(&self) -> ClimateSet {
        ClimateSet {
            power: self.power,
            mode: self.mode,
            fan_speed: self.wire_fan_speed,
            target_temperature: self.target_temperature,
            eco_mode: self.eco_mode,
            sleep_mode: self.sleep_mode,
            night_light: self.night_light,
            ventilation: self.ventilation,
            aux_heat_status: self.aux_heat_status,
            swing: self.swing,
        }
    }
}

/// Recognised customisation keys; the climate family has none yet
#[derive(Debug, Deserialize)]
struct ClimateCustomize {
    #[serde(flatten)]
    unknown: serde_json::Map<String, serde_json::Value>,
}

/// Climate unit adapter
#[derive(Debug)]
pub struct ClimateDevice {
    info: DeviceInfo,
    state: ClimateState,
    span: Span,
}

impl ClimateDevice {
    /// Create a new climate adapter with default state
    pub fn new(info: DeviceInfo) -> Self {
        let span = device_span(info.device_id, info.device_type.code());
        Self {
            info,
            state: ClimateState::default(),
            span,
        }
    }

    /// Registry constructor
    pub fn boxed(entry: &DeviceEntry) -> Box<dyn DeviceAdapter> {
        Box::new(Self::new(DeviceInfo::from(entry)))
    }

    /// Last decoded state
    pub fn state(&self) -> &ClimateState {
        &self.state
    }

    /// Build one set command changing the target temperature and, when
    /// given, the mode (which also powers the unit on)
    pub fn set_target_temperature(&self, value: f64, mode: Option<u8>) -> Option<Message> {
        let _enter = self.span.enter();

        let mut draft = self.state.to_set();
        draft.target_temperature = value;
        if let Some(mode) = mode {
            let Some(mode) = ClimateMode::from_code(mode) else {
                warn!("Ignoring target temperature request with unknown mode {}", mode);
                return None;
            };
            draft.mode = mode.code();
            draft.power = true;
        }
        Some(self.send(draft))
    }

    fn send(&self, draft: ClimateSet) -> Message {
        let message = draft.to_message(self.info.protocol_version);
        debug!("Built {}", message);
        message
    }

    fn build_set(&self, attribute: ClimateAttribute, value: &Value) -> Result<Option<ClimateSet>> {
        use ClimateAttribute as A;

        let name = attribute.as_str();
        let state = &self.state;
        let mut draft = state.to_set();

        match attribute {
            A::Power => {
                let Some(power) = changed(state.power, expect_bool(name, value)?) else {
                    return Ok(None);
                };
                draft.power = power;
            }
            A::Mode => {
                let mode = ClimateMode::try_from(value)?.code();
                let Some(mode) = changed(state.mode, mode) else {
                    return Ok(None);
                };
                draft.mode = mode;
                draft.power = true;
            }
            A::FanSpeed => {
                let requested = expect_integer(name, value)?;
                let fan_speed = u8::try_from(requested)
                    .map_err(|_| DeviceError::Rejected(format!("fan speed {}", requested)))?;
                if fan_speed == 0 && !state.power {
                    return Err(DeviceError::Rejected(
                        "fan speed 0 while powered off".to_string(),
                    ));
                }
                let Some(fan_speed) = changed(state.fan_speed, fan_speed) else {
                    return Ok(None);
                };
                draft.fan_speed = fan_speed;
                if !state.power {
                    draft.power = true;
                }
            }
            A::TargetTemperature => {
                let requested = expect_float(name, value)?;
                let Some(target) = changed(state.target_temperature, requested) else {
                    return Ok(None);
                };
                draft.target_temperature = target;
            }
            A::EcoMode => {
                let Some(on) = changed(state.eco_mode, expect_bool(name, value)?) else {
                    return Ok(None);
                };
                draft.eco_mode = on;
            }
            A::SleepMode => {
                let Some(on) = changed(state.sleep_mode, expect_bool(name, value)?) else {
                    return Ok(None);
                };
                draft.sleep_mode = on;
            }
            A::NightLight => {
                let Some(on) = changed(state.night_light, expect_bool(name, value)?) else {
                    return Ok(None);
                };
                draft.night_light = on;
            }
            A::Ventilation => {
                let Some(on) = changed(state.ventilation, expect_bool(name, value)?) else {
                    return Ok(None);
                };
                draft.ventilation = on;
            }
            A::Swing => {
                let Some(on) = changed(state.swing, expect_bool(name, value)?) else {
                    return Ok(None);
                };
                draft.swing = on;
            }
            A::AuxHeatStatus => {
                let requested = expect_integer(name, value)?;
                let stage = u8::try_from(requested)
                    .ok()
                    .filter(|stage| *stage <= message::AUX_HEAT_STAGE_2)
                    .ok_or_else(|| {
                        DeviceError::Rejected(format!("aux heat stage {}", requested))
                    })?;
                let Some(stage) = changed(state.aux_heat_status, stage) else {
                    return Ok(None);
                };
                draft.aux_heat_status = stage;
            }
            A::IndoorTemperature
            | A::AutoAuxHeatRunning
            | A::FanSpeedLevel
            | A::TemperaturePrecision
            | A::TempFahrenheit => return Err(DeviceError::ReadOnlyAttribute(name)),
        }

        Ok(Some(draft))
    }
}

impl DeviceAdapter for ClimateDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        ClimateAttribute::from_name(name).map(|a| self.state.value(a))
    }

    fn attributes(&self) -> AttributeMap {
        let mut map = AttributeMap::new();
        for attribute in ClimateAttribute::ALL {
            map.insert(attribute.as_str(), self.state.value(*attribute));
        }
        map
    }

    fn build_query(&self) -> Vec<Message> {
        vec![ClimateQuery.to_message(self.info.protocol_version)]
    }

    fn process_message(&mut self, response: &Response) -> AttributeDelta {
        let _enter = self.span.enter();
        debug!("Received {}", response);

        match ClimateStatus::decode(response) {
            Ok(Some(status)) => {
                let delta = self.state.merge(&status);
                debug!("Status changed {} attribute(s)", delta.len());
                delta
            }
            Ok(None) => {
                debug!(
                    "No status layout for {} with body type {:?}",
                    response.message_type(),
                    response.body_type()
                );
                AttributeDelta::new()
            }
            Err(e) => {
                warn!("Dropping frame: {}", DeviceError::from(e));
                AttributeDelta::new()
            }
        }
    }

    fn set_attribute(&mut self, name: &str, value: Value) -> Option<Message> {
        let _enter = self.span.enter();

        let Some(attribute) = ClimateAttribute::from_name(name) else {
            warn!("{}", DeviceError::UnsupportedAttribute(name.to_string()));
            return None;
        };

        match self.build_set(attribute, &value) {
            Ok(Some(draft)) => Some(self.send(draft)),
            Ok(None) => {
                debug!("{} already {}, nothing to send", name, value);
                None
            }
            Err(e) => {
                warn!("Ignoring {} = {}: {}", name, value, e);
                None
            }
        }
    }

    fn set_customize(&mut self, customize: &str) {
        let _enter = self.span.enter();

        if customize.trim().is_empty() {
            return;
        }
        match serde_json::from_str::<ClimateCustomize>(customize) {
            Ok(options) => {
                for key in options.unknown.keys() {
                    debug!("Ignoring unknown customize option {}", key);
                }
            }
            Err(e) => error!("{}", DeviceError::from(e)),
        }
    }
}

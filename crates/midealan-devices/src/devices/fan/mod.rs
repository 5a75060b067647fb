/*!
 * Fan unit (0xFA) adapter.
 *
 * One adapter serves both the default fan layout and the 560000AG model;
 * they differ only in the mode vocabulary, carried by a [`FanProfile`].
 */

pub mod message;

use serde::Deserialize;
use tracing::{debug, error, warn};

use midealan_core::config::DeviceEntry;
use midealan_core::logging::{device_span, Span};
use midealan_core::types::Value;

use crate::attribute::{changed, Attribute, AttributeDelta, AttributeMap, Tracker};
use crate::device::{expect_bool, expect_integer, DeviceAdapter, DeviceError, DeviceInfo, Result};
use crate::message::{Message, MessageRequest, Response};

pub use message::{FanQuery, FanSet, FanStatus, MAX_FAN_SPEED};

/// Selectable speed count when not customised
pub const DEFAULT_SPEED_COUNT: u8 = 10;

/// Mode vocabulary and registry key of one fan layout
#[derive(Debug, PartialEq, Eq)]
pub struct FanProfile {
    /// Registry key
    pub key: &'static str,
    /// Mode names with their wire values
    pub modes: &'static [(&'static str, u8)],
}

impl FanProfile {
    /// Wire value of a mode name
    pub fn mode_code(&self, name: &str) -> Option<u8> {
        self.modes
            .iter()
            .find(|(mode, _)| *mode == name)
            .map(|(_, code)| *code)
    }

    /// Mode name of a wire value
    pub fn mode_name(&self, code: u8) -> Option<&'static str> {
        self.modes
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(mode, _)| *mode)
    }
}

/// Default fan layout
pub static DEFAULT_PROFILE: FanProfile = FanProfile {
    key: "fa",
    modes: &[
        ("Normal", 0),
        ("Natural", 1),
        ("Sleep", 2),
        ("Comfort", 3),
        ("Silent", 4),
        ("Baby", 5),
        ("Induction", 6),
        ("Circulation", 7),
        ("Strong Wind", 8),
        ("Soft", 9),
        ("Customize", 10),
        ("Warm", 11),
        ("Smart", 12),
    ],
};

/// Layout of the 560000AG model
pub static PROFILE_560000AG: FanProfile = FanProfile {
    key: "fa_560000AG",
    modes: &[("Normal", 0), ("Sleep", 2), ("Smart", 12), ("ION", 13)],
};

/// Attributes of the fan family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanAttribute {
    /// Power state
    Power,
    /// Preset mode name
    Mode,
    /// Fan speed, 0 while off
    FanSpeed,
    /// Oscillation
    Oscillate,
}

impl Attribute for FanAttribute {
    const ALL: &'static [Self] = &[
        FanAttribute::Power,
        FanAttribute::Mode,
        FanAttribute::FanSpeed,
        FanAttribute::Oscillate,
    ];

    fn as_str(self) -> &'static str {
        match self {
            FanAttribute::Power => "power",
            FanAttribute::Mode => "mode",
            FanAttribute::FanSpeed => "fan_speed",
            FanAttribute::Oscillate => "oscillate",
        }
    }
}

/// Last decoded fan state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanState {
    /// Power state
    pub power: bool,
    /// Preset mode, `None` until decoded or when the wire value is unknown
    pub mode: Option<&'static str>,
    /// Fan speed
    pub fan_speed: u8,
    /// Oscillation
    pub oscillate: bool,
    /// Whether a status frame has been merged
    observed: bool,
}

impl FanState {
    /// Current value of one attribute
    pub fn value(&self, attribute: FanAttribute) -> Value {
        match attribute {
            FanAttribute::Power => self.power.into(),
            FanAttribute::Mode => self.mode.into(),
            FanAttribute::FanSpeed => self.fan_speed.into(),
            FanAttribute::Oscillate => self.oscillate.into(),
        }
    }

    /// Merge a decoded status body, returning the attributes that changed
    /// or were observed for the first time
    pub fn merge(&mut self, status: &FanStatus, profile: &FanProfile) -> AttributeDelta {
        let mut tracker = Tracker::new(self.observed);
        self.observed = true;
        tracker.track(FanAttribute::Power.as_str(), &mut self.power, status.power);
        if let Some(code) = status.mode {
            tracker.track(FanAttribute::Mode.as_str(), &mut self.mode, profile.mode_name(code));
        }
        let fan_speed = if status.power { status.fan_speed } else { 0 };
        tracker.track(FanAttribute::FanSpeed.as_str(), &mut self.fan_speed, fan_speed);
        tracker.track(FanAttribute::Oscillate.as_str(), &mut self.oscillate, status.oscillate);
        tracker.finish()
    }
}

#[derive(Debug, Deserialize)]
struct FanCustomize {
    speed_count: Option<u8>,
}

/// Fan unit adapter
#[derive(Debug)]
pub struct FanDevice {
    info: DeviceInfo,
    profile: &'static FanProfile,
    state: FanState,
    speed_count: u8,
    span: Span,
}

impl FanDevice {
    /// Create a new fan adapter with default state
    pub fn new(info: DeviceInfo, profile: &'static FanProfile) -> Self {
        let span = device_span(info.device_id, info.device_type.code());
        Self {
            info,
            profile,
            state: FanState::default(),
            speed_count: DEFAULT_SPEED_COUNT,
            span,
        }
    }

    /// Registry constructor for the default layout
    pub fn boxed(entry: &DeviceEntry) -> Box<dyn DeviceAdapter> {
        Box::new(Self::new(DeviceInfo::from(entry), &DEFAULT_PROFILE))
    }

    /// Registry constructor for the 560000AG layout
    pub fn boxed_560000ag(entry: &DeviceEntry) -> Box<dyn DeviceAdapter> {
        Box::new(Self::new(DeviceInfo::from(entry), &PROFILE_560000AG))
    }

    /// Layout profile
    pub fn profile(&self) -> &'static FanProfile {
        self.profile
    }

    /// Last decoded state
    pub fn state(&self) -> &FanState {
        &self.state
    }

    /// Number of selectable speeds
    pub fn speed_count(&self) -> u8 {
        self.speed_count
    }

    /// Mode names this layout accepts
    pub fn preset_modes(&self) -> Vec<&'static str> {
        self.profile.modes.iter().map(|(mode, _)| *mode).collect()
    }

    /// Build one set command powering the fan on with an optional speed and mode
    pub fn turn_on(&self, fan_speed: Option<i64>, mode: Option<&str>) -> Option<Message> {
        let _enter = self.span.enter();

        let mut draft = self.draft();
        draft.power = Some(true);
        draft.fan_speed = fan_speed;
        if let Some(name) = mode {
            match self.mode_code(name) {
                Ok(code) => draft.mode = Some(code),
                Err(e) => {
                    warn!("Ignoring turn on request: {}", e);
                    return None;
                }
            }
        }
        Some(self.send(draft))
    }

    fn draft(&self) -> FanSet {
        FanSet::new(self.info.subtype)
    }

    fn mode_code(&self, name: &str) -> Result<u8> {
        self.profile
            .mode_code(name)
            .ok_or_else(|| DeviceError::UnknownMode(name.to_string()))
    }

    fn send(&self, draft: FanSet) -> Message {
        let message = draft.to_message(self.info.protocol_version);
        debug!("Built {}", message);
        message
    }

    fn build_set(&self, attribute: FanAttribute, value: &Value) -> Result<Option<FanSet>> {
        let name = attribute.as_str();
        let state = &self.state;
        let mut draft = self.draft();

        match attribute {
            FanAttribute::Oscillate => {
                let Some(oscillate) = changed(state.oscillate, expect_bool(name, value)?) else {
                    return Ok(None);
                };
                draft.oscillate = Some(oscillate);
            }
            FanAttribute::FanSpeed => {
                let fan_speed = expect_integer(name, value)?;
                if fan_speed == 0 {
                    return Err(DeviceError::Rejected("fan speed 0".to_string()));
                }
                if fan_speed > 0 && !state.power {
                    draft.power = Some(true);
                } else if changed(i64::from(state.fan_speed), fan_speed).is_none() {
                    return Ok(None);
                }
                draft.fan_speed = Some(fan_speed);
            }
            FanAttribute::Mode => {
                let requested = match value {
                    Value::String(s) => s.as_str(),
                    other => return Err(DeviceError::UnknownMode(other.to_string())),
                };
                let code = self.mode_code(requested)?;
                if state.mode == Some(requested) {
                    return Ok(None);
                }
                draft.mode = Some(code);
            }
            FanAttribute::Power => {
                let Some(power) = changed(state.power, expect_bool(name, value)?) else {
                    return Ok(None);
                };
                draft.power = Some(power);
            }
        }

        Ok(Some(draft))
    }
}

impl DeviceAdapter for FanDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        FanAttribute::from_name(name).map(|a| self.state.value(a))
    }

    fn attributes(&self) -> AttributeMap {
        let mut map = AttributeMap::new();
        for attribute in FanAttribute::ALL {
            map.insert(attribute.as_str(), self.state.value(*attribute));
        }
        map
    }

    fn build_query(&self) -> Vec<Message> {
        vec![FanQuery.to_message(self.info.protocol_version)]
    }

    fn process_message(&mut self, response: &Response) -> AttributeDelta {
        let _enter = self.span.enter();
        debug!("Received {}", response);

        match FanStatus::decode(response) {
            Ok(Some(status)) => {
                if let Some(code) = status.mode.filter(|c| self.profile.mode_name(*c).is_none()) {
                    debug!("Mode {} is not in the {} vocabulary", code, self.profile.key);
                }
                let delta = self.state.merge(&status, self.profile);
                debug!("Status changed {} attribute(s)", delta.len());
                delta
            }
            Ok(None) => {
                debug!("No status layout for {}", response.message_type());
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

        let Some(attribute) = FanAttribute::from_name(name) else {
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

        self.speed_count = DEFAULT_SPEED_COUNT;
        if customize.trim().is_empty() {
            return;
        }

        let parsed = serde_json::from_str::<FanCustomize>(customize)
            .map_err(DeviceError::from)
            .and_then(|options| match options.speed_count {
                Some(count) if !(1..=MAX_FAN_SPEED).contains(&count) => Err(
                    DeviceError::Customize(format!("speed_count {} out of range", count)),
                ),
                other => Ok(other),
            });
        match parsed {
            Ok(Some(count)) => {
                self.speed_count = count;
                debug!("Speed count set to {}", count);
            }
            Ok(None) => {}
            Err(e) => error!("{}", e),
        }
    }
}

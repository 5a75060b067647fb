/*!
 * Device registry.
 *
 * A static table maps a lookup key built from the device class code (and,
 * for known variants, the model) to an adapter constructor. An unsupported
 * device resolves to `None`.
 */
use std::fmt;

use tracing::{debug, info};

use midealan_core::config::DeviceEntry;

use crate::device::DeviceAdapter;
use crate::devices::{ClimateDevice, FanDevice};
use crate::message::DeviceType;

/// Constructor producing a boxed adapter from a device entry
pub type AdapterFactory = fn(&DeviceEntry) -> Box<dyn DeviceAdapter>;

/// One registry entry
#[derive(Clone, Copy)]
pub struct AdapterConstructor {
    key: &'static str,
    factory: AdapterFactory,
}

impl AdapterConstructor {
    /// Lookup key this entry is registered under
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Build an adapter with default state
    pub fn construct(&self, entry: &DeviceEntry) -> Box<dyn DeviceAdapter> {
        (self.factory)(entry)
    }
}

impl fmt::Debug for AdapterConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConstructor")
            .field("key", &self.key)
            .finish()
    }
}

/// Models whose layout differs from the rest of their device class
///
/// A model suffix is only added for a listed `(class, model)` pair, not for
/// any class at or above 0xA0 reporting the model, so other classes sharing
/// a model string keep their default adapter.
const MODEL_VARIANTS: &[(DeviceType, &str)] = &[(DeviceType::FA, "560000AG")];

static ADAPTERS: &[AdapterConstructor] = &[
    AdapterConstructor {
        key: "cc",
        factory: ClimateDevice::boxed,
    },
    AdapterConstructor {
        key: "fa",
        factory: FanDevice::boxed,
    },
    AdapterConstructor {
        key: "fa_560000AG",
        factory: FanDevice::boxed_560000ag,
    },
];

/// Build the lookup key for a device class code and optional model
///
/// Codes below 0xA0 are formatted `x{code:02x}`, the rest `{code:02x}`. The
/// `_{model}` suffix is appended only for pairs listed in `MODEL_VARIANTS`.
pub fn device_key(device_type: u8, model: Option<&str>) -> String {
    let device_type = DeviceType(device_type);
    let mut key = if device_type < DeviceType::A0 {
        format!("x{:02x}", device_type.code())
    } else {
        format!("{:02x}", device_type.code())
    };
    if let Some(model) = model {
        if MODEL_VARIANTS
            .iter()
            .any(|(variant_type, variant)| *variant_type == device_type && *variant == model)
        {
            key.push('_');
            key.push_str(model);
        }
    }
    key
}

/// Resolve the adapter constructor for a device class code and model
pub fn select(device_type: u8, model: Option<&str>) -> Option<&'static AdapterConstructor> {
    let key = device_key(device_type, model);
    let found = ADAPTERS.iter().find(|adapter| adapter.key == key);
    match found {
        Some(adapter) => debug!(
            "Selected adapter {} for {}",
            adapter.key,
            DeviceType(device_type)
        ),
        None => info!(
            "Device type {} (model {:?}) is not supported",
            DeviceType(device_type),
            model.unwrap_or("")
        ),
    }
    found
}

/// Build and customise the adapter for a configured device
pub fn create(entry: &DeviceEntry) -> Option<Box<dyn DeviceAdapter>> {
    let model = (!entry.model.is_empty()).then_some(entry.model.as_str());
    let constructor = select(entry.device_type, model)?;
    let mut adapter = constructor.construct(entry);
    adapter.set_customize(&entry.customize);
    Some(adapter)
}

/// Build adapters for every supported configured device
pub fn create_all(entries: &[DeviceEntry]) -> Vec<Box<dyn DeviceAdapter>> {
    entries.iter().filter_map(create).collect()
}

/// Every registered key
pub fn supported_keys() -> Vec<&'static str> {
    ADAPTERS.iter().map(|adapter| adapter.key).collect()
}

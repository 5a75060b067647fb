/*!
 * midealan Devices
 *
 * This crate provides the Midea LAN message codecs, the device adapters
 * built on them and the registry that picks an adapter for a device.
 */

#![warn(missing_docs)]

// Re-export core types
pub use midealan_core::prelude;

pub mod attribute;
pub mod codec;
pub mod device;
pub mod devices;
pub mod message;
pub mod registry;

// Re-export the adapter contract and envelope types
pub use attribute::{Attribute, AttributeDelta, AttributeMap};
pub use device::{DeviceAdapter, DeviceError, DeviceInfo};
pub use message::{DeviceType, Message, MessageType, ParseError, Response};
pub use registry::{create, select, supported_keys, AdapterConstructor};

/// midealan devices crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the device system
pub fn init() -> Result<(), midealan_core::error::Error> {
    tracing::info!(
        "midealan devices {} initialized ({} adapters)",
        VERSION,
        supported_keys().len()
    );
    Ok(())
}

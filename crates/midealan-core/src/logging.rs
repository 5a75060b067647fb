/*!
 * Logging functionality for midealan.
 *
 * This module provides tracing setup and the per-device span used by
 * device adapters.
 */
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Initialize the logging system with default configuration
pub fn init() -> Result<()> {
    init_with_filter("info")
}

/// Initialize the logging system with a specific filter
///
/// `RUST_LOG` takes precedence over `filter` when it is set.
///
/// # Arguments
///
/// * `filter` - The log filter string (e.g., "info", "debug", "midealan_devices=trace")
pub fn init_with_filter(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .map_err(|e| Error::logging(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Initialize the logging system from the `[logging]` configuration section
pub fn init_from_config(config: &LoggingConfig) -> Result<()> {
    if !config.json_format {
        return init_with_filter(&config.level);
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(fmt::layer().json().with_target(true))
        .with(filter)
        .try_init()
        .map_err(|e| Error::logging(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// A type alias for a tracing span
pub type Span = tracing::Span;

/// Create the span a device adapter logs within
///
/// # Arguments
///
/// * `device_id` - The appliance identifier
/// * `device_type` - The device class code
pub fn device_span(device_id: u64, device_type: u8) -> Span {
    tracing::debug_span!(
        "device",
        id = device_id,
        device_type = %format!("0x{:02X}", device_type)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_an_error_not_a_panic() {
        let _ = init();
        assert!(matches!(init_with_filter("debug"), Err(Error::Logging(_))));
    }

    #[test]
    fn test_device_span() {
        // No subscriber enables debug spans in this test binary
        let span = device_span(42, 0xFA);
        let _guard = span.enter();
    }
}

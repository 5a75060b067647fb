/*!
 * Prelude module for midealan core.
 *
 * Re-exports commonly used types so downstream crates can import them in one line.
 */

// Re-export error types
pub use crate::error::{Error, Result};

// Re-export core types
pub use crate::types::Value;

// Re-export config types
pub use crate::config::{Config, ConfigBuilder, DeviceEntry, LoggingConfig, SharedConfig};

// Re-export logging macros
pub use tracing::{debug, error, info, trace, warn};

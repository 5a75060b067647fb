/*!
 * midealan Core
 *
 * This crate provides the ambient pieces shared by the midealan crates:
 * configuration, logging, error types and the attribute value type.
 */

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod types;

/// midealan core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

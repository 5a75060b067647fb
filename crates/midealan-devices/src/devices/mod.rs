/*!
 * Device family implementations.
 */

pub mod climate;
pub mod fan;

pub use climate::{ClimateAttribute, ClimateDevice, ClimateMode, ClimateState};
pub use fan::{FanAttribute, FanDevice, FanProfile, FanState};

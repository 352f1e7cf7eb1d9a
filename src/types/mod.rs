//! Data types for hubs and devices.
//!
//! This module contains the plain data structures used throughout the library:
//! - Hub classification and cached hub properties
//! - Device type codes
//! - Colors, button states and motor end states

pub mod device;
pub mod hub;

pub use device::{BrakingStyle, Color, DeviceType};
pub use hub::{ButtonState, HubInfo, HubType, MacAddress, Version};

//! # lpf2
//!
//! An async Rust client library for LEGO Powered Up hubs speaking the LEGO
//! Wireless Protocol (LPF2).
//!
//! A hub exposes a single BLE characteristic that carries hub property
//! updates, port attach/detach events, sensor telemetry and command
//! feedback, all interleaved. This crate turns that stream into typed
//! devices and events, and correlates property requests with their
//! responses.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Port table with attach, detach and virtual ports
//! - Typed motors, sensors and lights with hub-specific calibration
//! - Event-driven notifications with filtering
//! - Transport-agnostic: bring any BLE stack through [`RadioLink`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::collections::HashMap;
//!
//! use lpf2::{ChannelLink, ConnectedHub, HubConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lpf2::Error> {
//!     // The peer side is driven by your BLE stack
//!     let (link, _peer) = ChannelLink::pair();
//!     let manufacturer_data = HashMap::from([(0x0397, vec![0x00, 64])]);
//!
//!     let Some(hub) = ConnectedHub::connect(link, &manufacturer_data, HubConfig::new()).await?
//!     else {
//!         return Ok(());
//!     };
//!
//!     if let Some(motor) = hub.device_by_name("A").await {
//!         motor.set_speed(50, None).await?;
//!     }
//!
//!     let mut events = hub.subscribe();
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`protocol`] - Frame codec, message enums, command builders and parsers
//! - [`types`] - Plain data (hub info, device types, colors)
//! - [`device`] - Device objects and the device type registry
//! - [`event`] - Async event system for handling notifications
//! - [`transport`] - Radio link abstraction and an in-memory link
//! - [`hub`] - Hub engine and hub models

pub mod device;
pub mod error;
pub mod event;
pub mod hub;
pub mod protocol;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use device::{Device, DeviceEvent, DeviceKind, Motor, Sensor, TiltSensor};
pub use error::{Error, FrameError, Result};
pub use event::{Event, EventDispatcher, EventFilter, EventKind, Subscription};
pub use hub::{
    ConnectedHub, DeviceRef, Hub, HubConfig, HubModel, MoveHub, SessionState, TechnicMediumHub,
    VirtualPort,
};
pub use protocol::{HubPropertyType, HubPropertyValue, MessageType};
pub use transport::{ChannelLink, LinkPeer, RadioLink};
pub use types::{BrakingStyle, ButtonState, Color, DeviceType, HubInfo, HubType};

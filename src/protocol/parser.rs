//! Parsers for inbound LPF2 payloads.
//!
//! Each function takes the frame payload (without the 3-byte header).

use bytes::Buf;

use crate::error::{Error, Result};
use crate::protocol::message::{AttachedIoEvent, ErrorCode, HubActionType, HubPropertyType};
use crate::types::{ButtonState, MacAddress, Version};

/// Offset of the value inside a `HubProperties` payload (`[property, operation, value...]`).
const PROPERTY_VALUE_OFFSET: usize = 2;

/// A decoded hub property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubPropertyValue {
    /// Advertising name.
    AdvertisingName(String),
    /// Button state.
    Button(ButtonState),
    /// Firmware version.
    FirmwareVersion(Version),
    /// Hardware version.
    HardwareVersion(Version),
    /// Signal strength in dBm.
    Rssi(i8),
    /// Battery level in percent.
    BatteryVoltage(u8),
    /// Primary MAC address.
    PrimaryMacAddress(MacAddress),
    /// Any property without a typed decoding.
    Other {
        /// Property type.
        property: HubPropertyType,
        /// Raw value bytes.
        data: Vec<u8>,
    },
}

impl HubPropertyValue {
    /// Returns the property this value belongs to.
    #[must_use]
    pub const fn property(&self) -> HubPropertyType {
        match self {
            Self::AdvertisingName(_) => HubPropertyType::AdvertisingName,
            Self::Button(_) => HubPropertyType::Button,
            Self::FirmwareVersion(_) => HubPropertyType::FirmwareVersion,
            Self::HardwareVersion(_) => HubPropertyType::HardwareVersion,
            Self::Rssi(_) => HubPropertyType::Rssi,
            Self::BatteryVoltage(_) => HubPropertyType::BatteryVoltage,
            Self::PrimaryMacAddress(_) => HubPropertyType::PrimaryMacAddress,
            Self::Other { property, .. } => *property,
        }
    }
}

fn too_short(what: &str, len: usize) -> Error {
    Error::Protocol {
        message: format!("{what} too short: {len} bytes"),
    }
}

/// Parses a `HubProperties` payload.
///
/// Format: `[property:1] [operation:1] [value...]`
pub fn parse_hub_property(payload: &[u8]) -> Result<HubPropertyValue> {
    if payload.len() < PROPERTY_VALUE_OFFSET {
        return Err(too_short("HubProperties", payload.len()));
    }

    let property = HubPropertyType::from_byte(payload[0]).ok_or_else(|| Error::Protocol {
        message: format!("unknown hub property 0x{:02X}", payload[0]),
    })?;
    let value = &payload[PROPERTY_VALUE_OFFSET..];

    let parsed = match property {
        HubPropertyType::AdvertisingName => {
            let len = value.iter().position(|&b| b == 0).unwrap_or(value.len());
            HubPropertyValue::AdvertisingName(String::from_utf8_lossy(&value[..len]).into_owned())
        }
        HubPropertyType::Button => {
            let byte = *value.first().ok_or_else(|| too_short("Button", payload.len()))?;
            let state = ButtonState::from_byte(byte).ok_or_else(|| Error::Protocol {
                message: format!("unknown button state {byte}"),
            })?;
            HubPropertyValue::Button(state)
        }
        HubPropertyType::FirmwareVersion | HubPropertyType::HardwareVersion => {
            if value.len() < 4 {
                return Err(too_short("Version", payload.len()));
            }
            let version = Version((&value[..4]).get_u32_le());
            if property == HubPropertyType::FirmwareVersion {
                HubPropertyValue::FirmwareVersion(version)
            } else {
                HubPropertyValue::HardwareVersion(version)
            }
        }
        HubPropertyType::Rssi => {
            let byte = *value.first().ok_or_else(|| too_short("RSSI", payload.len()))?;
            HubPropertyValue::Rssi(byte as i8)
        }
        HubPropertyType::BatteryVoltage => {
            let byte = *value
                .first()
                .ok_or_else(|| too_short("BatteryVoltage", payload.len()))?;
            HubPropertyValue::BatteryVoltage(byte)
        }
        HubPropertyType::PrimaryMacAddress => {
            let mac = MacAddress::try_from_bytes(value)
                .ok_or_else(|| too_short("PrimaryMacAddress", payload.len()))?;
            HubPropertyValue::PrimaryMacAddress(mac)
        }
        _ => HubPropertyValue::Other {
            property,
            data: value.to_vec(),
        },
    };

    Ok(parsed)
}

/// A decoded `HubAttachedIO` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachedIo {
    /// Port the event concerns.
    pub port_id: u8,
    /// Attach, detach or virtual attach.
    pub event: AttachedIoEvent,
    /// Device type code; zero for detach.
    pub device_type_code: u16,
    /// First constituent port of a virtual port.
    pub first_port: Option<u8>,
    /// Second constituent port of a virtual port.
    pub second_port: Option<u8>,
}

/// Parses a `HubAttachedIO` payload.
///
/// Format:
/// ```text
/// [port:1] [event:1] [type:2LE] ...
/// event 2: [port:1] [event:1] [type:2LE] [first:1] [second:1]
/// ```
pub fn parse_attached_io(payload: &[u8]) -> Result<AttachedIo> {
    if payload.len() < 2 {
        return Err(too_short("HubAttachedIO", payload.len()));
    }

    let port_id = payload[0];
    let event = AttachedIoEvent::from_byte(payload[1]).ok_or_else(|| Error::Protocol {
        message: format!("unknown attached IO event {} on port {port_id}", payload[1]),
    })?;

    if event == AttachedIoEvent::Detached {
        return Ok(AttachedIo {
            port_id,
            event,
            device_type_code: 0,
            first_port: None,
            second_port: None,
        });
    }

    if payload.len() < 4 {
        return Err(too_short("HubAttachedIO", payload.len()));
    }
    let device_type_code = (&payload[2..4]).get_u16_le();

    let (first_port, second_port) = if event == AttachedIoEvent::AttachedVirtual {
        if payload.len() < 6 {
            return Err(too_short("HubAttachedIO virtual", payload.len()));
        }
        (Some(payload[4]), Some(payload[5]))
    } else {
        (None, None)
    };

    Ok(AttachedIo {
        port_id,
        event,
        device_type_code,
        first_port,
        second_port,
    })
}

/// Parses a `PortOutputCommandFeedback` payload into `(port, feedback)`.
///
/// Only the first port/feedback pair is returned.
pub fn parse_command_feedback(payload: &[u8]) -> Result<(u8, u8)> {
    match payload {
        [port, feedback, ..] => Ok((*port, *feedback)),
        _ => Err(too_short("PortOutputCommandFeedback", payload.len())),
    }
}

/// Parses a `GenericErrorMessage` payload into `(command, code)`.
///
/// Format: `[command_type:1] [error_code:1]`
pub fn parse_generic_error(payload: &[u8]) -> Result<(u8, Option<ErrorCode>)> {
    match payload {
        [command, code, ..] => Ok((*command, ErrorCode::from_byte(*code))),
        _ => Err(too_short("GenericErrorMessage", payload.len())),
    }
}

/// Parses an upstream `HubActions` payload.
pub fn parse_hub_action(payload: &[u8]) -> Result<HubActionType> {
    let byte = *payload
        .first()
        .ok_or_else(|| too_short("HubActions", payload.len()))?;
    HubActionType::from_byte(byte).ok_or_else(|| Error::Protocol {
        message: format!("unknown hub action 0x{byte:02X}"),
    })
}

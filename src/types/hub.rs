//! Hub-level data structures.

use std::fmt;

/// Length of a MAC address in bytes.
pub const MAC_ADDRESS_LEN: usize = 6;

/// Hub model classification, used for sensor calibration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HubType {
    /// Unknown hub.
    #[default]
    Unknown = 0,
    /// `WeDo` 2.0 Smart Hub.
    WeDo2SmartHub = 1,
    /// Boost Move Hub (88006).
    MoveHub = 2,
    /// Powered Up Hub (88009).
    Hub = 3,
    /// Powered Up Remote Control (88010).
    RemoteControl = 4,
    /// Duplo Train Base.
    DuploTrainBase = 5,
    /// Technic Medium Hub / Control+ Hub (88012).
    TechnicMediumHub = 6,
}

/// State reported by a hub or remote button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ButtonState {
    /// Button released.
    Released = 0,
    /// Up button (remote).
    Up = 1,
    /// Button pressed.
    Pressed = 2,
    /// Stop button (remote).
    Stop = 127,
    /// Down button (remote).
    Down = 255,
}

impl ButtonState {
    /// Parses a button state from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Released),
            1 => Some(Self::Up),
            2 => Some(Self::Pressed),
            127 => Some(Self::Stop),
            255 => Some(Self::Down),
            _ => None,
        }
    }
}

/// A firmware or hardware version, packed as in the protocol.
///
/// Displayed as `major.minor.bugfix.build`, e.g. `1.0.00.0224`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Version(pub u32);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = format!("{:08X}", self.0);
        write!(f, "{}.{}.{}.{}", &s[0..1], &s[1..2], &s[2..4], &s[4..])
    }
}

/// A 6-byte Bluetooth MAC address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; MAC_ADDRESS_LEN]);

impl MacAddress {
    /// Tries to create a MAC address from bytes.
    ///
    /// Returns `None` if the slice is shorter than 6 bytes.
    #[must_use]
    pub fn try_from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..MAC_ADDRESS_LEN)?;
        let mut mac = [0u8; MAC_ADDRESS_LEN];
        mac.copy_from_slice(bytes);
        Some(Self(mac))
    }

    /// Returns the address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; MAC_ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|b| hex::encode_upper([*b])).collect();
        f.write_str(&parts.join(":"))
    }
}

/// Cached hub properties, refreshed by updates and one-shot requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubInfo {
    /// Hub model classification.
    pub hub_type: HubType,
    /// Advertising name, if requested.
    pub name: Option<String>,
    /// Firmware version.
    pub firmware_version: Option<Version>,
    /// Hardware version.
    pub hardware_version: Option<Version>,
    /// Signal strength in dBm.
    pub rssi: Option<i8>,
    /// Battery level in percent.
    pub battery_level: Option<u8>,
    /// Primary MAC address.
    pub primary_mac_address: Option<MacAddress>,
    /// Last reported button state.
    pub button: Option<ButtonState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_display() {
        assert_eq!(Version(0x1000_0224).to_string(), "1.0.00.0224");
        assert_eq!(Version(0x0100_0000).to_string(), "0.1.00.0000");
    }

    #[test]
    fn test_mac_address_display() {
        let mac = MacAddress::try_from_bytes(&[0x90, 0x84, 0x2B, 0x4E, 0x8E, 0x43]).unwrap();
        assert_eq!(mac.to_string(), "90:84:2B:4E:8E:43");
    }

    #[test]
    fn test_mac_address_too_short() {
        assert_eq!(MacAddress::try_from_bytes(&[1, 2, 3]), None);
    }

    #[test]
    fn test_button_state() {
        assert_eq!(ButtonState::from_byte(0), Some(ButtonState::Released));
        assert_eq!(ButtonState::from_byte(2), Some(ButtonState::Pressed));
        assert_eq!(ButtonState::from_byte(3), None);
    }
}

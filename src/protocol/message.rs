//! Message type definitions for the LPF2 protocol.
//!
//! The message type is the third byte of every frame and indicates how the
//! payload is laid out.

/// Frame message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    // Hub related (0x01-0x13)
    /// Hub property set, request or update.
    HubProperties = 0x01,
    /// Hub action (switch off, disconnect, busy indication).
    HubActions = 0x02,
    /// Hub alert (low voltage, high current, ...).
    HubAlerts = 0x03,
    /// Port attach/detach event.
    HubAttachedIO = 0x04,
    /// Generic error report for a previous command.
    GenericErrorMessage = 0x05,
    /// Hardware network commands.
    HardwareNetworkCommands = 0x08,
    /// Firmware update: go into boot mode.
    FirmwareUpdateGoIntoBootMode = 0x10,
    /// Firmware update: lock memory.
    FirmwareUpdateLockMemory = 0x11,
    /// Firmware update: lock status request.
    FirmwareUpdateLockStatusReport = 0x12,
    /// Firmware update: lock status.
    FirmwareLockStatus = 0x13,

    // Port related (0x21-0x82)
    /// Port information request.
    PortInformationRequest = 0x21,
    /// Port mode information request.
    PortModeInformationRequest = 0x22,
    /// Single-mode input format setup (notification enable/disable).
    PortInputFormatSetupSingle = 0x41,
    /// Combined-mode input format setup.
    PortInputFormatSetupCombined = 0x42,
    /// Port information.
    PortInformation = 0x43,
    /// Port mode information.
    PortModeInformation = 0x44,
    /// Single-mode sensor value.
    PortValueSingle = 0x45,
    /// Combined-mode sensor value.
    PortValueCombined = 0x46,
    /// Single-mode input format acknowledgement.
    PortInputFormatSingle = 0x47,
    /// Combined-mode input format acknowledgement.
    PortInputFormatCombined = 0x48,
    /// Virtual port setup.
    VirtualPortSetup = 0x61,
    /// Port output command.
    PortOutputCommand = 0x81,
    /// Port output command feedback.
    PortOutputCommandFeedback = 0x82,
}

impl MessageType {
    /// Attempts to parse a message type from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::HubProperties),
            0x02 => Some(Self::HubActions),
            0x03 => Some(Self::HubAlerts),
            0x04 => Some(Self::HubAttachedIO),
            0x05 => Some(Self::GenericErrorMessage),
            0x08 => Some(Self::HardwareNetworkCommands),
            0x10 => Some(Self::FirmwareUpdateGoIntoBootMode),
            0x11 => Some(Self::FirmwareUpdateLockMemory),
            0x12 => Some(Self::FirmwareUpdateLockStatusReport),
            0x13 => Some(Self::FirmwareLockStatus),
            0x21 => Some(Self::PortInformationRequest),
            0x22 => Some(Self::PortModeInformationRequest),
            0x41 => Some(Self::PortInputFormatSetupSingle),
            0x42 => Some(Self::PortInputFormatSetupCombined),
            0x43 => Some(Self::PortInformation),
            0x44 => Some(Self::PortModeInformation),
            0x45 => Some(Self::PortValueSingle),
            0x46 => Some(Self::PortValueCombined),
            0x47 => Some(Self::PortInputFormatSingle),
            0x48 => Some(Self::PortInputFormatCombined),
            0x61 => Some(Self::VirtualPortSetup),
            0x81 => Some(Self::PortOutputCommand),
            0x82 => Some(Self::PortOutputCommandFeedback),
            _ => None,
        }
    }

    /// Returns true if this message type concerns a port rather than the hub.
    #[must_use]
    pub const fn is_port_message(&self) -> bool {
        (*self as u8) >= 0x21
    }
}

impl From<MessageType> for u8 {
    fn from(msg: MessageType) -> Self {
        msg as Self
    }
}

/// Hub property types, carried in the first payload byte of `HubProperties`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HubPropertyType {
    /// Advertising name.
    AdvertisingName = 0x01,
    /// Green button state.
    Button = 0x02,
    /// Firmware version.
    FirmwareVersion = 0x03,
    /// Hardware version.
    HardwareVersion = 0x04,
    /// Received signal strength.
    Rssi = 0x05,
    /// Battery level in percent.
    BatteryVoltage = 0x06,
    /// Battery type.
    BatteryType = 0x07,
    /// Manufacturer name.
    ManufactureName = 0x08,
    /// Radio firmware version.
    RadioFirmwareVersion = 0x09,
    /// LEGO Wireless Protocol version.
    LegoWirelessProtocolVersion = 0x0A,
    /// System type id.
    SystemTypeId = 0x0B,
    /// Hardware network id.
    HardwareNetworkId = 0x0C,
    /// Primary MAC address.
    PrimaryMacAddress = 0x0D,
    /// Secondary MAC address.
    SecondaryMacAddress = 0x0E,
    /// Hardware network family.
    HardwareNetworkFamily = 0x0F,
}

impl HubPropertyType {
    /// Attempts to parse a property type from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::AdvertisingName),
            0x02 => Some(Self::Button),
            0x03 => Some(Self::FirmwareVersion),
            0x04 => Some(Self::HardwareVersion),
            0x05 => Some(Self::Rssi),
            0x06 => Some(Self::BatteryVoltage),
            0x07 => Some(Self::BatteryType),
            0x08 => Some(Self::ManufactureName),
            0x09 => Some(Self::RadioFirmwareVersion),
            0x0A => Some(Self::LegoWirelessProtocolVersion),
            0x0B => Some(Self::SystemTypeId),
            0x0C => Some(Self::HardwareNetworkId),
            0x0D => Some(Self::PrimaryMacAddress),
            0x0E => Some(Self::SecondaryMacAddress),
            0x0F => Some(Self::HardwareNetworkFamily),
            _ => None,
        }
    }
}

impl From<HubPropertyType> for u8 {
    fn from(prop: HubPropertyType) -> Self {
        prop as Self
    }
}

/// Operations on a hub property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HubPropertyOperation {
    /// Set the property (downstream).
    Set = 0x01,
    /// Enable update notifications (downstream).
    EnableUpdates = 0x02,
    /// Disable update notifications (downstream).
    DisableUpdates = 0x03,
    /// Reset the property (downstream).
    Reset = 0x04,
    /// Request a one-shot update (downstream).
    RequestUpdate = 0x05,
    /// Property value update (upstream).
    Update = 0x06,
}

impl From<HubPropertyOperation> for u8 {
    fn from(op: HubPropertyOperation) -> Self {
        op as Self
    }
}

/// Hub action types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HubActionType {
    // Downstream
    /// Switch the hub off.
    SwitchOffHub = 0x01,
    /// Disconnect the BLE link.
    Disconnect = 0x02,
    /// Turn VCC port control on.
    VccPortControlOn = 0x03,
    /// Turn VCC port control off.
    VccPortControlOff = 0x04,
    /// Activate busy indication.
    ActivateBusyIndication = 0x05,
    /// Reset busy indication.
    ResetBusyIndication = 0x06,
    /// Shutdown (production use).
    Shutdown = 0x2F,

    // Upstream
    /// The hub is about to switch off.
    HubWillSwitchOff = 0x30,
    /// The hub is about to disconnect.
    HubWillDisconnect = 0x31,
    /// The hub is about to enter boot mode.
    HubWillGoIntoBootMode = 0x32,
}

impl HubActionType {
    /// Attempts to parse an action type from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::SwitchOffHub),
            0x02 => Some(Self::Disconnect),
            0x03 => Some(Self::VccPortControlOn),
            0x04 => Some(Self::VccPortControlOff),
            0x05 => Some(Self::ActivateBusyIndication),
            0x06 => Some(Self::ResetBusyIndication),
            0x2F => Some(Self::Shutdown),
            0x30 => Some(Self::HubWillSwitchOff),
            0x31 => Some(Self::HubWillDisconnect),
            0x32 => Some(Self::HubWillGoIntoBootMode),
            _ => None,
        }
    }
}

impl From<HubActionType> for u8 {
    fn from(action: HubActionType) -> Self {
        action as Self
    }
}

/// Event kinds carried by `HubAttachedIO` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttachedIoEvent {
    /// A device was removed from the port.
    Detached = 0x00,
    /// A device was attached to a physical port.
    Attached = 0x01,
    /// A virtual port was created from two physical ports.
    AttachedVirtual = 0x02,
}

impl AttachedIoEvent {
    /// Attempts to parse an attached IO event from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Detached),
            0x01 => Some(Self::Attached),
            0x02 => Some(Self::AttachedVirtual),
            _ => None,
        }
    }
}

/// Error codes carried by `GenericErrorMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// Acknowledged.
    Ack = 0x01,
    /// Multiple acknowledged.
    Mack = 0x02,
    /// Buffer overflow.
    BufferOverflow = 0x03,
    /// Timeout.
    Timeout = 0x04,
    /// Command not recognized.
    CommandNotRecognized = 0x05,
    /// Invalid use (e.g. parameter error).
    InvalidUse = 0x06,
    /// Overcurrent.
    Overcurrent = 0x07,
    /// Internal error.
    InternalError = 0x08,
}

impl ErrorCode {
    /// Attempts to parse an error code from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Ack),
            0x02 => Some(Self::Mack),
            0x03 => Some(Self::BufferOverflow),
            0x04 => Some(Self::Timeout),
            0x05 => Some(Self::CommandNotRecognized),
            0x06 => Some(Self::InvalidUse),
            0x07 => Some(Self::Overcurrent),
            0x08 => Some(Self::InternalError),
            _ => None,
        }
    }
}

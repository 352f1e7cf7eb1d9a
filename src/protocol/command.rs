//! Outbound command payloads for the LPF2 protocol.
//!
//! Every builder here is a pure function returning a [`Command`]; nothing is
//! sent until the hub engine encodes and writes it.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FrameError;
use crate::protocol::frame::{self, Frame};
use crate::protocol::message::{HubActionType, HubPropertyOperation, HubPropertyType, MessageType};

/// Startup/completion byte: execute immediately, request command feedback.
pub const STARTUP_AND_COMPLETION: u8 = 0x11;

/// Maximum power byte used by speed and position commands (100%).
pub const MAX_POWER: u8 = 0x64;

/// Port output sub-commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OutputSubCommand {
    /// Run at speed until told otherwise.
    StartSpeed = 0x07,
    /// Run both motors of a virtual port at individual speeds.
    StartSpeedDual = 0x08,
    /// Run at speed for a time.
    StartSpeedForTime = 0x09,
    /// Run both motors of a virtual port for a time.
    StartSpeedForTimeDual = 0x0A,
    /// Go to an absolute position.
    GotoAbsolutePosition = 0x0D,
    /// Move both motors of a virtual port to absolute positions.
    GotoAbsolutePositionDual = 0x0E,
    /// Write raw data in a given mode (power, LED color, brightness).
    WriteDirectModeData = 0x51,
}

impl From<OutputSubCommand> for u8 {
    fn from(cmd: OutputSubCommand) -> Self {
        cmd as Self
    }
}

/// A message ready to be framed and written to the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Frame message type.
    pub message_type: MessageType,
    /// Frame payload.
    pub payload: Bytes,
}

impl Command {
    /// Creates a command from a message type and payload.
    #[must_use]
    pub fn new(message_type: MessageType, payload: impl Into<Bytes>) -> Self {
        Self {
            message_type,
            payload: payload.into(),
        }
    }

    /// Encodes the command into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] if the payload does not fit.
    pub fn encode(&self) -> Result<Frame, FrameError> {
        frame::encode(self.message_type, &self.payload)
    }
}

/// Builds a hub property operation: `[property, operation]`.
#[must_use]
pub fn hub_property(property: HubPropertyType, operation: HubPropertyOperation) -> Command {
    Command::new(
        MessageType::HubProperties,
        vec![property as u8, operation as u8],
    )
}

/// Builds a hub action: `[action]`.
#[must_use]
pub fn hub_action(action: HubActionType) -> Command {
    Command::new(MessageType::HubActions, vec![action as u8])
}

/// Enables or disables value notifications for a port in a mode.
///
/// Format: `[port, mode, delta:4LE = 1, enable]`
#[must_use]
pub fn input_format_setup(port_id: u8, mode: u8, enable: bool) -> Command {
    let mut buf = BytesMut::with_capacity(7);
    buf.put_u8(port_id);
    buf.put_u8(mode);
    buf.put_u32_le(1); // Delta interval
    buf.put_u8(u8::from(enable));
    Command::new(MessageType::PortInputFormatSetupSingle, buf.freeze())
}

/// Asks the hub to combine two ports into a virtual port.
#[must_use]
pub fn virtual_port_setup(first_port: u8, second_port: u8) -> Command {
    // 0x01 = connect
    Command::new(
        MessageType::VirtualPortSetup,
        vec![0x01, first_port, second_port],
    )
}

/// Requests port information (`info_type` 0x01 = mode info, 0x02 = combinations).
#[must_use]
pub fn port_information_request(port_id: u8, info_type: u8) -> Command {
    Command::new(MessageType::PortInformationRequest, vec![port_id, info_type])
}

/// Requests information about one mode of a port.
#[must_use]
pub fn port_mode_information_request(port_id: u8, mode: u8, info_type: u8) -> Command {
    Command::new(
        MessageType::PortModeInformationRequest,
        vec![port_id, mode, info_type],
    )
}

fn output_header(buf: &mut BytesMut, port_id: u8, sub: OutputSubCommand) {
    buf.put_u8(port_id);
    buf.put_u8(STARTUP_AND_COMPLETION);
    buf.put_u8(sub as u8);
}

/// Writes raw mode data: `[port, 0x11, 0x51, mode, data...]`.
#[must_use]
pub fn write_direct_mode_data(port_id: u8, mode: u8, data: &[u8]) -> Command {
    let mut buf = BytesMut::with_capacity(4 + data.len());
    output_header(&mut buf, port_id, OutputSubCommand::WriteDirectModeData);
    buf.put_u8(mode);
    buf.put_slice(data);
    Command::new(MessageType::PortOutputCommand, buf.freeze())
}

/// Sets motor power: `[port, 0x11, 0x51, 0x00, power]`.
#[must_use]
pub fn start_power(port_id: u8, power: u8) -> Command {
    write_direct_mode_data(port_id, 0x00, &[power])
}

/// Runs a motor at a speed until changed.
#[must_use]
pub fn start_speed(port_id: u8, speed: u8, end_state: u8) -> Command {
    let mut buf = BytesMut::with_capacity(9);
    output_header(&mut buf, port_id, OutputSubCommand::StartSpeed);
    buf.put_u8(speed);
    buf.put_u8(MAX_POWER);
    buf.put_u8(0x03); // Use acceleration and deceleration profiles
    buf.put_u8(MAX_POWER);
    buf.put_u8(end_state);
    buf.put_u8(0x00);
    Command::new(MessageType::PortOutputCommand, buf.freeze())
}

/// Runs both motors of a virtual port at individual speeds.
#[must_use]
pub fn start_speed_dual(port_id: u8, speed1: u8, speed2: u8, end_state: u8) -> Command {
    let mut buf = BytesMut::with_capacity(8);
    output_header(&mut buf, port_id, OutputSubCommand::StartSpeedDual);
    buf.put_u8(speed1);
    buf.put_u8(speed2);
    buf.put_u8(MAX_POWER);
    buf.put_u8(end_state);
    buf.put_u8(0x00);
    Command::new(MessageType::PortOutputCommand, buf.freeze())
}

/// Runs a motor at a speed for `time_ms` milliseconds.
///
/// Format: `[port, 0x11, 0x09, time:2LE, speed, 0x64, end_state, 0x00]`
#[must_use]
pub fn start_speed_for_time(port_id: u8, time_ms: u16, speed: u8, end_state: u8) -> Command {
    let mut buf = BytesMut::with_capacity(9);
    output_header(&mut buf, port_id, OutputSubCommand::StartSpeedForTime);
    buf.put_u16_le(time_ms);
    buf.put_u8(speed);
    buf.put_u8(MAX_POWER);
    buf.put_u8(end_state);
    buf.put_u8(0x00);
    Command::new(MessageType::PortOutputCommand, buf.freeze())
}

/// Runs both motors of a virtual port for `time_ms` milliseconds.
#[must_use]
pub fn start_speed_for_time_dual(
    port_id: u8,
    time_ms: u16,
    speed1: u8,
    speed2: u8,
    end_state: u8,
) -> Command {
    let mut buf = BytesMut::with_capacity(10);
    output_header(&mut buf, port_id, OutputSubCommand::StartSpeedForTimeDual);
    buf.put_u16_le(time_ms);
    buf.put_u8(speed1);
    buf.put_u8(speed2);
    buf.put_u8(MAX_POWER);
    buf.put_u8(end_state);
    buf.put_u8(0x00);
    Command::new(MessageType::PortOutputCommand, buf.freeze())
}

/// Moves a motor to an absolute position.
///
/// Format: `[port, 0x11, 0x0D, angle:4LE, speed, 0x64, end_state, 0x00]`
#[must_use]
pub fn goto_absolute_position(port_id: u8, angle: i32, speed: u8, end_state: u8) -> Command {
    let mut buf = BytesMut::with_capacity(11);
    output_header(&mut buf, port_id, OutputSubCommand::GotoAbsolutePosition);
    buf.put_i32_le(angle);
    buf.put_u8(speed);
    buf.put_u8(MAX_POWER);
    buf.put_u8(end_state);
    buf.put_u8(0x00);
    Command::new(MessageType::PortOutputCommand, buf.freeze())
}

/// Moves both motors of a virtual port to absolute positions.
#[must_use]
pub fn goto_absolute_position_dual(
    port_id: u8,
    angle1: i32,
    angle2: i32,
    speed: u8,
    end_state: u8,
) -> Command {
    let mut buf = BytesMut::with_capacity(15);
    output_header(&mut buf, port_id, OutputSubCommand::GotoAbsolutePositionDual);
    buf.put_i32_le(angle1);
    buf.put_i32_le(angle2);
    buf.put_u8(speed);
    buf.put_u8(MAX_POWER);
    buf.put_u8(end_state);
    buf.put_u8(0x00);
    Command::new(MessageType::PortOutputCommand, buf.freeze())
}

//! Protocol definitions for LPF2 communication.
//!
//! This module contains the low-level protocol types including:
//! - Frame encoding/decoding
//! - Message, property and event codes
//! - Outbound command payloads
//! - Inbound payload parsing

pub mod command;
pub mod frame;
pub mod message;
pub mod parser;

pub use command::{Command, OutputSubCommand};
pub use frame::{Frame, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, decode as decode_frame, encode as encode_frame};
pub use message::{
    AttachedIoEvent, ErrorCode, HubActionType, HubPropertyOperation, HubPropertyType, MessageType,
};
pub use parser::{
    AttachedIo, HubPropertyValue, parse_attached_io, parse_command_feedback, parse_generic_error,
    parse_hub_action, parse_hub_property,
};

//! Tacho and absolute motors.

use tracing::debug;

use crate::device::{DeviceEvent, Motor, Sensor, read_i16, read_i32};
use crate::types::{BrakingStyle, HubType};

/// Rotation mode: cumulative degrees since attach.
pub const MODE_ROTATION: u8 = 0x02;

/// Absolute mode: position relative to the motor's zero mark.
pub const MODE_ABSOLUTE: u8 = 0x03;

/// Power value that makes the hub actively brake the motor.
pub const BRAKE_POWER: i32 = 127;

/// Maps a signed speed or power to its wire byte.
///
/// Values are clamped to `[-100, 100]`; `127` passes through as the brake
/// sentinel.
#[must_use]
pub const fn map_speed(value: i32) -> u8 {
    if value == BRAKE_POWER {
        return BRAKE_POWER as u8;
    }
    let clamped = if value > 100 {
        100
    } else if value < -100 {
        -100
    } else {
        value
    };
    clamped as i8 as u8
}

/// Normalizes an angle to `[-180, 180]` degrees.
///
/// Angles in `[-180, 180)` are returned unchanged and `180` maps to `-180`.
/// Inputs of `-540`, `-900` and so on land exactly on `180`.
#[must_use]
pub const fn normalize_angle(angle: i32) -> i32 {
    if angle >= 180 {
        angle - 360 * ((angle + 180) / 360)
    } else if angle < -180 {
        angle + 360 * ((180 - angle) / 360)
    } else {
        angle
    }
}

/// State shared by every motor variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotorState {
    /// End state used by speed and position commands.
    pub braking_style: BrakingStyle,
    /// Number of commands the hub reported as finished.
    pub actions_finished: u64,
}

fn decode_rotation(mode: u8, payload: &[u8]) -> Vec<DeviceEvent> {
    if mode != MODE_ROTATION {
        return Vec::new();
    }
    match read_i32(payload, 1) {
        Some(degrees) => vec![DeviceEvent::Rotation { degrees }],
        None => {
            debug!("Short rotation value: {} bytes", payload.len());
            Vec::new()
        }
    }
}

/// Motor with a rotation sensor (Boost medium motor, Move Hub internal motors).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TachoMotor {
    state: MotorState,
}

impl Sensor for TachoMotor {
    fn default_mode(&self) -> u8 {
        MODE_ROTATION
    }

    fn auto_subscribe(&self) -> bool {
        false
    }

    fn decode(&self, mode: u8, _hub_type: HubType, payload: &[u8]) -> Vec<DeviceEvent> {
        decode_rotation(mode, payload)
    }
}

impl Motor for TachoMotor {
    fn state(&self) -> &MotorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut MotorState {
        &mut self.state
    }
}

/// Motor with an absolute position encoder (Technic L and XL motors).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbsoluteMotor {
    state: MotorState,
}

impl Sensor for AbsoluteMotor {
    fn default_mode(&self) -> u8 {
        MODE_ABSOLUTE
    }

    fn auto_subscribe(&self) -> bool {
        false
    }

    fn decode(&self, mode: u8, _hub_type: HubType, payload: &[u8]) -> Vec<DeviceEvent> {
        if mode != MODE_ABSOLUTE {
            return decode_rotation(mode, payload);
        }
        match read_i16(payload, 1) {
            Some(raw) => vec![DeviceEvent::Position {
                angle: normalize_angle(i32::from(raw)),
            }],
            None => {
                debug!("Short position value: {} bytes", payload.len());
                Vec::new()
            }
        }
    }
}

impl Motor for AbsoluteMotor {
    fn state(&self) -> &MotorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut MotorState {
        &mut self.state
    }

    fn supports_absolute_position(&self) -> bool {
        true
    }
}

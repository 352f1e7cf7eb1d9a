//! Devices attached to hub ports.
//!
//! A [`Device`] is one entry of the hub's port table: a typed variant
//! ([`DeviceKind`]) carrying its own state, plus the port it is bound to and
//! its current mode. Cross-cutting behavior is exposed through capability
//! traits checked at dispatch time:
//!
//! - [`Sensor`]: decodes `PortValueSingle` telemetry, may auto-subscribe
//! - [`Motor`]: accepts output commands, tracks completion
//! - [`TiltSensor`]: reports orientation

pub mod motor;
pub mod registry;
pub mod sensor;

use tracing::{debug, trace};

use crate::protocol::Frame;
use crate::types::{BrakingStyle, Color, DeviceType, HubType};

pub use motor::{AbsoluteMotor, MotorState, TachoMotor, map_speed, normalize_angle};
pub use registry::create;
pub use sensor::{
    Accelerometer, ColorDistanceSensor, CurrentSensor, GyroSensor, ThreeAxisTiltSensor,
    TwoAxisTiltSensor, VoltageSensor,
};

/// Hub LED modes.
pub const LED_MODE_COLOR: u8 = 0x00;
/// Hub LED RGB mode.
pub const LED_MODE_RGB: u8 = 0x01;

/// A value decoded from device telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceEvent {
    /// Cumulative rotation of a tacho motor.
    Rotation {
        /// Degrees rotated since attach.
        degrees: i32,
    },
    /// Absolute position of an absolute motor.
    Position {
        /// Normalized angle in degrees.
        angle: i32,
    },
    /// Detected color.
    Color(Color),
    /// Detected distance.
    Distance {
        /// Distance in millimeters.
        millimeters: f64,
    },
    /// Two-axis tilt in degrees.
    Tilt {
        /// X axis.
        x: i32,
        /// Y axis.
        y: i32,
    },
    /// Three-axis tilt in degrees.
    Tilt3 {
        /// X axis.
        x: i32,
        /// Y axis.
        y: i32,
        /// Z axis.
        z: i32,
    },
    /// Battery voltage.
    Voltage {
        /// Volts.
        volts: f64,
    },
    /// Motor current draw.
    Current {
        /// Milliamps.
        milliamps: f64,
    },
    /// Acceleration in milli-g.
    Acceleration {
        /// X axis.
        x: i32,
        /// Y axis.
        y: i32,
        /// Z axis.
        z: i32,
    },
    /// Angular velocity in degrees per second.
    Gyro {
        /// X axis.
        x: i32,
        /// Y axis.
        y: i32,
        /// Z axis.
        z: i32,
    },
}

/// A device that produces telemetry.
pub trait Sensor {
    /// Mode the device is placed in on attach.
    fn default_mode(&self) -> u8;

    /// Whether the hub enables notifications for the default mode on attach.
    fn auto_subscribe(&self) -> bool;

    /// Decodes a `PortValueSingle` payload received in `mode`.
    fn decode(&self, mode: u8, hub_type: HubType, payload: &[u8]) -> Vec<DeviceEvent>;
}

/// A device that accepts motor output commands.
pub trait Motor {
    /// Shared motor state.
    fn state(&self) -> &MotorState;

    /// Mutable shared motor state.
    fn state_mut(&mut self) -> &mut MotorState;

    /// End state applied when a movement finishes.
    fn braking_style(&self) -> BrakingStyle {
        self.state().braking_style
    }

    /// Sets the end state applied when a movement finishes.
    fn set_braking_style(&mut self, style: BrakingStyle) {
        self.state_mut().braking_style = style;
    }

    /// Records that the hub reported a command as finished.
    fn action_finished(&mut self) {
        let state = self.state_mut();
        state.actions_finished = state.actions_finished.saturating_add(1);
    }

    /// Number of commands the hub reported as finished.
    fn actions_finished(&self) -> u64 {
        self.state().actions_finished
    }

    /// Whether the motor can go to an absolute angle.
    fn supports_absolute_position(&self) -> bool {
        false
    }
}

/// A sensor reporting orientation.
pub trait TiltSensor: Sensor {
    /// Number of reported axes.
    fn axes(&self) -> usize;
}

/// The closed set of modeled device variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    /// Motor with rotation feedback.
    TachoMotor(TachoMotor),
    /// Motor with absolute position feedback.
    AbsoluteMotor(AbsoluteMotor),
    /// Hub status LED.
    HubLed,
    /// Powered Up LED light.
    Light,
    /// Boost color and distance sensor.
    ColorDistanceSensor(ColorDistanceSensor),
    /// Hub voltage sensor.
    VoltageSensor(VoltageSensor),
    /// Hub current sensor.
    CurrentSensor(CurrentSensor),
    /// Two-axis tilt sensor.
    TiltSensor(TwoAxisTiltSensor),
    /// Technic Medium Hub three-axis tilt sensor.
    HubTiltSensor(ThreeAxisTiltSensor),
    /// Technic Medium Hub accelerometer.
    Accelerometer(Accelerometer),
    /// Technic Medium Hub gyro sensor.
    GyroSensor(GyroSensor),
}

impl DeviceKind {
    /// Returns the sensor capability, if any.
    #[must_use]
    pub fn as_sensor(&self) -> Option<&dyn Sensor> {
        match self {
            Self::TachoMotor(m) => Some(m),
            Self::AbsoluteMotor(m) => Some(m),
            Self::ColorDistanceSensor(s) => Some(s),
            Self::VoltageSensor(s) => Some(s),
            Self::CurrentSensor(s) => Some(s),
            Self::TiltSensor(s) => Some(s),
            Self::HubTiltSensor(s) => Some(s),
            Self::Accelerometer(s) => Some(s),
            Self::GyroSensor(s) => Some(s),
            Self::HubLed | Self::Light => None,
        }
    }

    /// Returns the motor capability, if any.
    #[must_use]
    pub fn as_motor(&self) -> Option<&dyn Motor> {
        match self {
            Self::TachoMotor(m) => Some(m),
            Self::AbsoluteMotor(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the mutable motor capability, if any.
    pub fn as_motor_mut(&mut self) -> Option<&mut dyn Motor> {
        match self {
            Self::TachoMotor(m) => Some(m),
            Self::AbsoluteMotor(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the tilt capability, if any.
    #[must_use]
    pub fn as_tilt_sensor(&self) -> Option<&dyn TiltSensor> {
        match self {
            Self::TiltSensor(s) => Some(s),
            Self::HubTiltSensor(s) => Some(s),
            _ => None,
        }
    }
}

/// A device bound to a hub port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    device_type: DeviceType,
    port_id: u8,
    port_name: Option<String>,
    is_virtual_port: bool,
    mode: u8,
    hub_type: HubType,
    kind: DeviceKind,
}

impl Device {
    /// Creates a device, seeding its mode from the sensor default.
    #[must_use]
    pub fn new(
        device_type: DeviceType,
        kind: DeviceKind,
        hub_type: HubType,
        port_id: u8,
        port_name: Option<String>,
    ) -> Self {
        let mode = kind.as_sensor().map_or(0, |sensor| sensor.default_mode());
        Self {
            device_type,
            port_id,
            port_name,
            is_virtual_port: false,
            mode,
            hub_type,
            kind,
        }
    }

    /// Device type code.
    #[must_use]
    pub const fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// Port the device is attached to.
    #[must_use]
    pub const fn port_id(&self) -> u8 {
        self.port_id
    }

    /// Name of the port, if the hub model names it.
    #[must_use]
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// True if the port combines two physical ports.
    #[must_use]
    pub const fn is_virtual_port(&self) -> bool {
        self.is_virtual_port
    }

    pub(crate) fn set_virtual_port(&mut self, is_virtual: bool) {
        self.is_virtual_port = is_virtual;
    }

    /// Current mode used to decode telemetry.
    #[must_use]
    pub const fn mode(&self) -> u8 {
        self.mode
    }

    /// Sets the mode used to decode telemetry.
    pub fn set_mode(&mut self, mode: u8) {
        self.mode = mode;
    }

    /// Hub type used for calibration.
    #[must_use]
    pub const fn hub_type(&self) -> HubType {
        self.hub_type
    }

    /// Variant and per-variant state.
    #[must_use]
    pub const fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    /// Sensor capability.
    #[must_use]
    pub fn as_sensor(&self) -> Option<&dyn Sensor> {
        self.kind.as_sensor()
    }

    /// Motor capability.
    #[must_use]
    pub fn as_motor(&self) -> Option<&dyn Motor> {
        self.kind.as_motor()
    }

    /// Mutable motor capability.
    pub fn as_motor_mut(&mut self) -> Option<&mut dyn Motor> {
        self.kind.as_motor_mut()
    }

    /// Tilt capability.
    #[must_use]
    pub fn as_tilt_sensor(&self) -> Option<&dyn TiltSensor> {
        self.kind.as_tilt_sensor()
    }

    /// Decodes a `PortValueSingle` frame addressed to this device.
    pub fn receive(&mut self, frame: &Frame) -> Vec<DeviceEvent> {
        match self.kind.as_sensor() {
            Some(sensor) => sensor.decode(self.mode, self.hub_type, frame.payload()),
            None => {
                trace!(
                    "Ignoring value for {:?} on port {}",
                    self.device_type, self.port_id
                );
                Vec::new()
            }
        }
    }

    /// Called when the hub reports that the last output command finished.
    pub fn last_action_finished(&mut self) {
        if let Some(motor) = self.kind.as_motor_mut() {
            motor.action_finished();
            debug!("Action finished on port {}", self.port_id);
        }
    }
}

pub(crate) fn read_u16(payload: &[u8], offset: usize) -> Option<u16> {
    let bytes = payload.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn read_i16(payload: &[u8], offset: usize) -> Option<i16> {
    read_u16(payload, offset).map(|v| v as i16)
}

pub(crate) fn read_i32(payload: &[u8], offset: usize) -> Option<i32> {
    let bytes = payload.get(offset..offset + 4)?;
    Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

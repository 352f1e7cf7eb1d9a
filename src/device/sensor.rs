//! Sensor variants and their value decoders.
//!
//! Every decoder takes the full `PortValueSingle` payload, so the value starts
//! at offset 1 (offset 0 is the port id).

use tracing::debug;

use crate::device::{DeviceEvent, Sensor, TiltSensor, read_i16, read_u16};
use crate::types::{Color, HubType};

/// Color/distance mode: detected color only.
pub const MODE_COLOR: u8 = 0x00;
/// Color/distance mode: distance only.
pub const MODE_DISTANCE: u8 = 0x01;
/// Color/distance mode: color and distance combined.
pub const MODE_COLOR_AND_DISTANCE: u8 = 0x08;

/// Single mode used by voltage, current, tilt, accelerometer and gyro sensors.
pub const MODE_DEFAULT: u8 = 0x00;

/// Raw value at which the current sensor reports its maximum.
pub const MAX_CURRENT_RAW: u16 = 4095;

/// Maximum voltage in volts for a hub type.
#[must_use]
pub const fn max_voltage(hub_type: HubType) -> f64 {
    match hub_type {
        HubType::DuploTrainBase | HubType::RemoteControl => 6.4,
        _ => 9.615,
    }
}

/// Raw value at which the voltage sensor reports [`max_voltage`].
#[must_use]
pub const fn max_voltage_raw(hub_type: HubType) -> u16 {
    match hub_type {
        HubType::DuploTrainBase => 3047,
        HubType::RemoteControl => 3200,
        HubType::TechnicMediumHub => 4095,
        _ => 3893,
    }
}

/// Maximum current in milliamps for a hub type.
#[must_use]
pub const fn max_current(hub_type: HubType) -> f64 {
    match hub_type {
        HubType::TechnicMediumHub => 4175.0,
        _ => 2444.0,
    }
}

/// Scales a raw reading linearly: `raw * max_value / max_raw`.
#[must_use]
pub fn scale(raw: u16, max_value: f64, max_raw: u16) -> f64 {
    f64::from(raw) * max_value / f64::from(max_raw)
}

/// Converts a coarse distance reading to millimeters.
fn distance_mm(value: f64) -> f64 {
    (value * 25.4).floor() - 20.0
}

fn short(kind: &str, payload: &[u8]) -> Vec<DeviceEvent> {
    debug!("Short {} value: {} bytes", kind, payload.len());
    Vec::new()
}

/// Boost color and distance sensor (88007).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorDistanceSensor;

impl Sensor for ColorDistanceSensor {
    fn default_mode(&self) -> u8 {
        MODE_COLOR_AND_DISTANCE
    }

    fn auto_subscribe(&self) -> bool {
        true
    }

    fn decode(&self, mode: u8, _hub_type: HubType, payload: &[u8]) -> Vec<DeviceEvent> {
        let Some(&first) = payload.get(1) else {
            return short("color/distance", payload);
        };

        match mode {
            MODE_COLOR => Color::from_byte(first)
                .filter(|_| first <= 10)
                .map(DeviceEvent::Color)
                .into_iter()
                .collect(),
            MODE_DISTANCE if first <= 10 => vec![DeviceEvent::Distance {
                millimeters: distance_mm(f64::from(first)),
            }],
            MODE_COLOR_AND_DISTANCE => {
                let (Some(&coarse), Some(&partial)) = (payload.get(2), payload.get(4)) else {
                    return short("color/distance", payload);
                };
                let mut events = Vec::with_capacity(2);
                if let Some(color) = Color::from_byte(first).filter(|_| first <= 10) {
                    events.push(DeviceEvent::Color(color));
                }
                let mut distance = f64::from(coarse);
                if partial > 0 {
                    distance += 1.0 / f64::from(partial);
                }
                events.push(DeviceEvent::Distance {
                    millimeters: distance_mm(distance),
                });
                events
            }
            _ => Vec::new(),
        }
    }
}

/// Hub-internal battery voltage sensor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoltageSensor;

impl Sensor for VoltageSensor {
    fn default_mode(&self) -> u8 {
        MODE_DEFAULT
    }

    fn auto_subscribe(&self) -> bool {
        true
    }

    fn decode(&self, _mode: u8, hub_type: HubType, payload: &[u8]) -> Vec<DeviceEvent> {
        match read_u16(payload, 1) {
            Some(raw) => vec![DeviceEvent::Voltage {
                volts: scale(raw, max_voltage(hub_type), max_voltage_raw(hub_type)),
            }],
            None => short("voltage", payload),
        }
    }
}

/// Hub-internal current sensor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentSensor;

impl Sensor for CurrentSensor {
    fn default_mode(&self) -> u8 {
        MODE_DEFAULT
    }

    fn auto_subscribe(&self) -> bool {
        true
    }

    fn decode(&self, _mode: u8, hub_type: HubType, payload: &[u8]) -> Vec<DeviceEvent> {
        match read_u16(payload, 1) {
            Some(raw) => vec![DeviceEvent::Current {
                milliamps: scale(raw, max_current(hub_type), MAX_CURRENT_RAW),
            }],
            None => short("current", payload),
        }
    }
}

/// Two-axis tilt sensor: the external `WeDo` 2.0 sensor and the Move Hub internal one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwoAxisTiltSensor;

impl Sensor for TwoAxisTiltSensor {
    fn default_mode(&self) -> u8 {
        MODE_DEFAULT
    }

    fn auto_subscribe(&self) -> bool {
        true
    }

    fn decode(&self, _mode: u8, _hub_type: HubType, payload: &[u8]) -> Vec<DeviceEvent> {
        match (payload.get(1), payload.get(2)) {
            (Some(&x), Some(&y)) => vec![DeviceEvent::Tilt {
                x: -i32::from(x as i8),
                y: i32::from(y as i8),
            }],
            _ => short("tilt", payload),
        }
    }
}

impl TiltSensor for TwoAxisTiltSensor {
    fn axes(&self) -> usize {
        2
    }
}

fn read_axes(payload: &[u8]) -> Option<(i16, i16, i16)> {
    Some((
        read_i16(payload, 1)?,
        read_i16(payload, 3)?,
        read_i16(payload, 5)?,
    ))
}

/// Technic Medium Hub internal three-axis tilt sensor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreeAxisTiltSensor;

impl Sensor for ThreeAxisTiltSensor {
    fn default_mode(&self) -> u8 {
        MODE_DEFAULT
    }

    fn auto_subscribe(&self) -> bool {
        true
    }

    fn decode(&self, _mode: u8, _hub_type: HubType, payload: &[u8]) -> Vec<DeviceEvent> {
        match read_axes(payload) {
            // Wire order is z, x, y
            Some((z, x, y)) => vec![DeviceEvent::Tilt3 {
                x: i32::from(x),
                y: i32::from(y),
                z: -i32::from(z),
            }],
            None => short("tilt", payload),
        }
    }
}

impl TiltSensor for ThreeAxisTiltSensor {
    fn axes(&self) -> usize {
        3
    }
}

/// Technic Medium Hub internal accelerometer, reported in milli-g.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accelerometer;

impl Sensor for Accelerometer {
    fn default_mode(&self) -> u8 {
        MODE_DEFAULT
    }

    fn auto_subscribe(&self) -> bool {
        true
    }

    fn decode(&self, _mode: u8, _hub_type: HubType, payload: &[u8]) -> Vec<DeviceEvent> {
        let convert = |raw: i16| (f64::from(raw) / 4.096).round_ties_even() as i32;
        match read_axes(payload) {
            Some((x, y, z)) => vec![DeviceEvent::Acceleration {
                x: convert(x),
                y: convert(y),
                z: convert(z),
            }],
            None => short("acceleration", payload),
        }
    }
}

/// Technic Medium Hub internal gyro sensor, reported in degrees per second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GyroSensor;

impl Sensor for GyroSensor {
    fn default_mode(&self) -> u8 {
        MODE_DEFAULT
    }

    fn auto_subscribe(&self) -> bool {
        true
    }

    fn decode(&self, _mode: u8, _hub_type: HubType, payload: &[u8]) -> Vec<DeviceEvent> {
        let convert = |raw: u8| (7.0 * f64::from(raw) / 100.0).round_ties_even() as i32;
        match (payload.get(1), payload.get(3), payload.get(5)) {
            (Some(&x), Some(&y), Some(&z)) => vec![DeviceEvent::Gyro {
                x: convert(x),
                y: convert(y),
                z: convert(z),
            }],
            _ => short("gyro", payload),
        }
    }
}

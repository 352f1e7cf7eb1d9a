//! Device type registry.
//!
//! Maps the 16-bit device type code from a `HubAttachedIO` message to a
//! modeled device variant.

use tracing::{debug, warn};

use crate::device::{
    AbsoluteMotor, Accelerometer, ColorDistanceSensor, CurrentSensor, Device, DeviceKind,
    GyroSensor, TachoMotor, ThreeAxisTiltSensor, TwoAxisTiltSensor, VoltageSensor,
};
use crate::types::{DeviceType, HubType};

/// Returns the variant for a device type, or `None` if it is not modeled.
#[must_use]
pub fn kind_for(device_type: DeviceType) -> Option<DeviceKind> {
    let kind = match device_type {
        DeviceType::Light => DeviceKind::Light,
        DeviceType::VoltageSensor => DeviceKind::VoltageSensor(VoltageSensor),
        DeviceType::CurrentSensor => DeviceKind::CurrentSensor(CurrentSensor),
        DeviceType::HubLed => DeviceKind::HubLed,
        DeviceType::TiltSensor | DeviceType::MoveHubTiltSensor => {
            DeviceKind::TiltSensor(TwoAxisTiltSensor)
        }
        DeviceType::ColorDistanceSensor => DeviceKind::ColorDistanceSensor(ColorDistanceSensor),
        DeviceType::MediumLinearMotor | DeviceType::MoveHubMediumLinearMotor => {
            DeviceKind::TachoMotor(TachoMotor::default())
        }
        DeviceType::TechnicLargeLinearMotor | DeviceType::TechnicXLargeLinearMotor => {
            DeviceKind::AbsoluteMotor(AbsoluteMotor::default())
        }
        DeviceType::TechnicMediumHubAccelerometer => DeviceKind::Accelerometer(Accelerometer),
        DeviceType::TechnicMediumHubGyroSensor => DeviceKind::GyroSensor(GyroSensor),
        DeviceType::TechnicMediumHubTiltSensor => DeviceKind::HubTiltSensor(ThreeAxisTiltSensor),
        _ => return None,
    };
    Some(kind)
}

/// Creates the device for a type code attached to `port_id`.
///
/// Unknown and unmodeled codes return `None` and are logged; the session
/// carries on with the port left empty.
#[must_use]
pub fn create(
    device_type_code: u16,
    hub_type: HubType,
    port_id: u8,
    port_name: Option<String>,
) -> Option<Device> {
    let Some(device_type) = DeviceType::from_code(device_type_code) else {
        warn!("Unknown device type {device_type_code} on port {port_id}");
        return None;
    };

    let Some(kind) = kind_for(device_type) else {
        warn!("Unsupported device type {device_type:?} on port {port_id}");
        return None;
    };

    debug!("Creating {device_type:?} on port {port_id}");
    Some(Device::new(device_type, kind, hub_type, port_id, port_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{motor, sensor};

    #[test]
    fn test_create_known_devices() {
        let device = create(38, HubType::MoveHub, 1, Some("B".into())).unwrap();
        assert_eq!(device.device_type(), DeviceType::MediumLinearMotor);
        assert_eq!(device.mode(), motor::MODE_ROTATION);
        assert!(device.as_motor().is_some());

        let device = create(46, HubType::TechnicMediumHub, 0, Some("A".into())).unwrap();
        assert_eq!(device.mode(), motor::MODE_ABSOLUTE);
        assert!(device.as_motor().is_some_and(|m| m.supports_absolute_position()));

        let device = create(37, HubType::MoveHub, 2, None).unwrap();
        assert_eq!(device.mode(), sensor::MODE_COLOR_AND_DISTANCE);
    }

    #[test]
    fn test_internal_and_external_tilt() {
        let internal = create(40, HubType::MoveHub, 58, Some("TILT_SENSOR".into())).unwrap();
        let external = create(34, HubType::MoveHub, 3, None).unwrap();
        assert_eq!(internal.device_type(), DeviceType::MoveHubTiltSensor);
        assert_eq!(external.device_type(), DeviceType::TiltSensor);
        assert_eq!(internal.as_tilt_sensor().map(|t| t.axes()), Some(2));

        let technic = create(59, HubType::TechnicMediumHub, 99, None).unwrap();
        assert_eq!(technic.as_tilt_sensor().map(|t| t.axes()), Some(3));
    }

    #[test]
    fn test_unmodeled_and_unknown_codes() {
        // Train motor and Spike Prime sensors are defined but not modeled
        assert!(create(2, HubType::Hub, 0, None).is_none());
        assert!(create(61, HubType::TechnicMediumHub, 0, None).is_none());
        assert!(create(0x1234, HubType::MoveHub, 5, None).is_none());
    }
}

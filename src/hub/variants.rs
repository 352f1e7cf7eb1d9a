//! Hub models and their well-known ports.

use std::collections::HashMap;
use std::ops::Deref;

use tracing::debug;

use crate::error::Result;
use crate::hub::{DeviceRef, Hub, HubConfig};
use crate::transport::RadioLink;
use crate::types::{DeviceType, HubType};

/// LEGO's Bluetooth company identifier in manufacturer data.
pub const LEGO_COMPANY_ID: u16 = 0x0397;

/// System type byte of a Move Hub.
pub const SYSTEM_TYPE_MOVE_HUB: u8 = 64;

/// System type byte of a Technic Medium Hub.
pub const SYSTEM_TYPE_TECHNIC_MEDIUM_HUB: u8 = 128;

/// Move Hub port ids.
pub mod move_hub {
    /// Port A, internal motor.
    pub const PORT_A: u8 = 0;
    /// Port B, internal motor.
    pub const PORT_B: u8 = 1;
    /// Port C.
    pub const PORT_C: u8 = 2;
    /// Port D.
    pub const PORT_D: u8 = 3;
    /// Virtual port combining A and B.
    pub const PORT_AB: u8 = 16;
    /// Hub LED.
    pub const HUB_LED: u8 = 50;
    /// Internal tilt sensor.
    pub const TILT_SENSOR: u8 = 58;
    /// Current sensor.
    pub const CURRENT_SENSOR: u8 = 59;
    /// Voltage sensor.
    pub const VOLTAGE_SENSOR: u8 = 60;
}

/// Technic Medium Hub port ids.
pub mod technic_medium_hub {
    /// Port A.
    pub const PORT_A: u8 = 0;
    /// Port B.
    pub const PORT_B: u8 = 1;
    /// Port C.
    pub const PORT_C: u8 = 2;
    /// Port D.
    pub const PORT_D: u8 = 3;
    /// Hub LED.
    pub const HUB_LED: u8 = 50;
    /// Current sensor.
    pub const CURRENT_SENSOR: u8 = 59;
    /// Voltage sensor.
    pub const VOLTAGE_SENSOR: u8 = 60;
    /// Accelerometer.
    pub const ACCELEROMETER: u8 = 97;
    /// Gyro sensor.
    pub const GYRO_SENSOR: u8 = 98;
    /// Three-axis tilt sensor.
    pub const TILT_SENSOR: u8 = 99;
}

const MOVE_HUB_PORTS: &[(u8, &str)] = &[
    (move_hub::PORT_A, "A"),
    (move_hub::PORT_B, "B"),
    (move_hub::PORT_C, "C"),
    (move_hub::PORT_D, "D"),
    (move_hub::HUB_LED, "HUB_LED"),
    (move_hub::TILT_SENSOR, "TILT_SENSOR"),
    (move_hub::CURRENT_SENSOR, "CURRENT_SENSOR"),
    (move_hub::VOLTAGE_SENSOR, "VOLTAGE_SENSOR"),
];

const TECHNIC_MEDIUM_HUB_PORTS: &[(u8, &str)] = &[
    (technic_medium_hub::PORT_A, "A"),
    (technic_medium_hub::PORT_B, "B"),
    (technic_medium_hub::PORT_C, "C"),
    (technic_medium_hub::PORT_D, "D"),
    (technic_medium_hub::HUB_LED, "HUB_LED"),
    (technic_medium_hub::CURRENT_SENSOR, "CURRENT_SENSOR"),
    (technic_medium_hub::VOLTAGE_SENSOR, "VOLTAGE_SENSOR"),
    (technic_medium_hub::ACCELEROMETER, "ACCELEROMETER"),
    (technic_medium_hub::GYRO_SENSOR, "GYRO_SENSOR"),
    (technic_medium_hub::TILT_SENSOR, "TILT_SENSOR"),
];

/// Supported hub models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HubModel {
    /// Boost Move Hub (88006).
    MoveHub,
    /// Technic Medium Hub / Control+ (88012).
    TechnicMediumHub,
}

impl HubModel {
    /// Hub type used for calibration.
    #[must_use]
    pub const fn hub_type(self) -> HubType {
        match self {
            Self::MoveHub => HubType::MoveHub,
            Self::TechnicMediumHub => HubType::TechnicMediumHub,
        }
    }

    /// Pre-assigned port names.
    #[must_use]
    pub const fn port_names(self) -> &'static [(u8, &'static str)] {
        match self {
            Self::MoveHub => MOVE_HUB_PORTS,
            Self::TechnicMediumHub => TECHNIC_MEDIUM_HUB_PORTS,
        }
    }

    /// Identifies the model from advertised manufacturer data.
    ///
    /// Byte 1 of LEGO's manufacturer data is the system type. Other LEGO
    /// hubs (Duplo train base, Powered Up hub, remote) are not supported
    /// and yield `None`.
    #[must_use]
    pub fn from_manufacturer_data(data: &HashMap<u16, Vec<u8>>) -> Option<Self> {
        let system_type = *data.get(&LEGO_COMPANY_ID)?.get(1)?;
        match system_type {
            SYSTEM_TYPE_MOVE_HUB => Some(Self::MoveHub),
            SYSTEM_TYPE_TECHNIC_MEDIUM_HUB => Some(Self::TechnicMediumHub),
            other => {
                debug!("unsupported LEGO system type {}", other);
                None
            }
        }
    }
}

/// Returns `port_id` if it holds a device of `expected` type.
async fn resolve<T: RadioLink + 'static>(
    hub: &Hub<T>,
    port_id: u8,
    expected: DeviceType,
) -> Option<u8> {
    let found = hub.get_device(port_id).await.map(|d| d.device_type());
    if found == Some(expected) {
        Some(port_id)
    } else {
        debug!(
            "port {} holds {:?}, expected {:?}",
            port_id, found, expected
        );
        None
    }
}

fn accessor<T: RadioLink + 'static>(hub: &Hub<T>, port_id: Option<u8>) -> Option<DeviceRef<'_, T>> {
    port_id.map(|id| DeviceRef::new(hub, id))
}

/// Boost Move Hub.
pub struct MoveHub<T> {
    hub: Hub<T>,
    led: Option<u8>,
    tilt_sensor: Option<u8>,
    motor_a: Option<u8>,
    motor_b: Option<u8>,
    motor_ab: Option<u8>,
    current_sensor: Option<u8>,
    voltage_sensor: Option<u8>,
}

impl<T: RadioLink + 'static> MoveHub<T> {
    /// Connects to a Move Hub and resolves its built-in devices.
    pub async fn connect(link: T, config: HubConfig) -> Result<Self> {
        let hub = Hub::open(link, HubModel::MoveHub, config).await?;

        let motor = DeviceType::MoveHubMediumLinearMotor;
        let this = Self {
            led: resolve(&hub, move_hub::HUB_LED, DeviceType::HubLed).await,
            tilt_sensor: resolve(&hub, move_hub::TILT_SENSOR, DeviceType::MoveHubTiltSensor)
                .await,
            motor_a: resolve(&hub, move_hub::PORT_A, motor).await,
            motor_b: resolve(&hub, move_hub::PORT_B, motor).await,
            motor_ab: resolve(&hub, move_hub::PORT_AB, motor).await,
            current_sensor: resolve(&hub, move_hub::CURRENT_SENSOR, DeviceType::CurrentSensor)
                .await,
            voltage_sensor: resolve(&hub, move_hub::VOLTAGE_SENSOR, DeviceType::VoltageSensor)
                .await,
            hub,
        };

        this.hub.finish();
        Ok(this)
    }

    /// Hub LED.
    #[must_use]
    pub fn led(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.led)
    }

    /// Internal tilt sensor.
    #[must_use]
    pub fn tilt_sensor(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.tilt_sensor)
    }

    /// Internal motor on port A.
    #[must_use]
    pub fn motor_a(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.motor_a)
    }

    /// Internal motor on port B.
    #[must_use]
    pub fn motor_b(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.motor_b)
    }

    /// Internal motors A and B as one virtual port.
    #[must_use]
    pub fn motor_ab(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.motor_ab)
    }

    /// Current sensor.
    #[must_use]
    pub fn current_sensor(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.current_sensor)
    }

    /// Voltage sensor.
    #[must_use]
    pub fn voltage_sensor(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.voltage_sensor)
    }

    /// Returns the underlying hub.
    #[must_use]
    pub fn into_inner(self) -> Hub<T> {
        self.hub
    }
}

impl<T> Deref for MoveHub<T> {
    type Target = Hub<T>;

    fn deref(&self) -> &Hub<T> {
        &self.hub
    }
}

/// Technic Medium Hub.
pub struct TechnicMediumHub<T> {
    hub: Hub<T>,
    led: Option<u8>,
    current_sensor: Option<u8>,
    voltage_sensor: Option<u8>,
    accelerometer: Option<u8>,
    gyro_sensor: Option<u8>,
    tilt_sensor: Option<u8>,
}

impl<T: RadioLink + 'static> TechnicMediumHub<T> {
    /// Connects to a Technic Medium Hub and resolves its built-in devices.
    pub async fn connect(link: T, config: HubConfig) -> Result<Self> {
        let hub = Hub::open(link, HubModel::TechnicMediumHub, config).await?;

        let this = Self {
            led: resolve(&hub, technic_medium_hub::HUB_LED, DeviceType::HubLed).await,
            current_sensor: resolve(
                &hub,
                technic_medium_hub::CURRENT_SENSOR,
                DeviceType::CurrentSensor,
            )
            .await,
            voltage_sensor: resolve(
                &hub,
                technic_medium_hub::VOLTAGE_SENSOR,
                DeviceType::VoltageSensor,
            )
            .await,
            accelerometer: resolve(
                &hub,
                technic_medium_hub::ACCELEROMETER,
                DeviceType::TechnicMediumHubAccelerometer,
            )
            .await,
            gyro_sensor: resolve(
                &hub,
                technic_medium_hub::GYRO_SENSOR,
                DeviceType::TechnicMediumHubGyroSensor,
            )
            .await,
            tilt_sensor: resolve(
                &hub,
                technic_medium_hub::TILT_SENSOR,
                DeviceType::TechnicMediumHubTiltSensor,
            )
            .await,
            hub,
        };

        this.hub.finish();
        Ok(this)
    }

    /// Hub LED.
    #[must_use]
    pub fn led(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.led)
    }

    /// Current sensor.
    #[must_use]
    pub fn current_sensor(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.current_sensor)
    }

    /// Voltage sensor.
    #[must_use]
    pub fn voltage_sensor(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.voltage_sensor)
    }

    /// Accelerometer.
    #[must_use]
    pub fn accelerometer(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.accelerometer)
    }

    /// Gyro sensor.
    #[must_use]
    pub fn gyro_sensor(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.gyro_sensor)
    }

    /// Three-axis tilt sensor.
    #[must_use]
    pub fn tilt_sensor(&self) -> Option<DeviceRef<'_, T>> {
        accessor(&self.hub, self.tilt_sensor)
    }

    /// Returns the underlying hub.
    #[must_use]
    pub fn into_inner(self) -> Hub<T> {
        self.hub
    }
}

impl<T> Deref for TechnicMediumHub<T> {
    type Target = Hub<T>;

    fn deref(&self) -> &Hub<T> {
        &self.hub
    }
}

/// A connected hub of any supported model.
pub enum ConnectedHub<T> {
    /// Boost Move Hub.
    MoveHub(MoveHub<T>),
    /// Technic Medium Hub.
    TechnicMediumHub(TechnicMediumHub<T>),
}

impl<T: RadioLink + 'static> ConnectedHub<T> {
    /// Picks the model from manufacturer data and connects.
    ///
    /// Returns `Ok(None)` without touching the link if the data does not
    /// describe a supported hub.
    pub async fn connect(
        link: T,
        manufacturer_data: &HashMap<u16, Vec<u8>>,
        config: HubConfig,
    ) -> Result<Option<Self>> {
        let Some(model) = HubModel::from_manufacturer_data(manufacturer_data) else {
            return Ok(None);
        };

        let hub = match model {
            HubModel::MoveHub => Self::MoveHub(MoveHub::connect(link, config).await?),
            HubModel::TechnicMediumHub => {
                Self::TechnicMediumHub(TechnicMediumHub::connect(link, config).await?)
            }
        };
        Ok(Some(hub))
    }

    /// Model of the connected hub.
    #[must_use]
    pub const fn model(&self) -> HubModel {
        match self {
            Self::MoveHub(_) => HubModel::MoveHub,
            Self::TechnicMediumHub(_) => HubModel::TechnicMediumHub,
        }
    }
}

impl<T> Deref for ConnectedHub<T> {
    type Target = Hub<T>;

    fn deref(&self) -> &Hub<T> {
        match self {
            Self::MoveHub(hub) => &hub.hub,
            Self::TechnicMediumHub(hub) => &hub.hub,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lego_data(system_type: u8) -> HashMap<u16, Vec<u8>> {
        HashMap::from([(LEGO_COMPANY_ID, vec![0x00, system_type, 0x00, 0x00])])
    }

    #[test]
    fn test_model_from_manufacturer_data() {
        assert_eq!(
            HubModel::from_manufacturer_data(&lego_data(64)),
            Some(HubModel::MoveHub)
        );
        assert_eq!(
            HubModel::from_manufacturer_data(&lego_data(128)),
            Some(HubModel::TechnicMediumHub)
        );
    }

    #[test]
    fn test_unsupported_manufacturer_data() {
        // Duplo train base, Powered Up hub, remote
        for system_type in [32, 65, 66, 0] {
            assert_eq!(HubModel::from_manufacturer_data(&lego_data(system_type)), None);
        }

        let other_company = HashMap::from([(0x004C, vec![0x00, 64])]);
        assert_eq!(HubModel::from_manufacturer_data(&other_company), None);

        let truncated = HashMap::from([(LEGO_COMPANY_ID, vec![0x00])]);
        assert_eq!(HubModel::from_manufacturer_data(&truncated), None);
    }

    #[test]
    fn test_port_names() {
        let names = HubModel::MoveHub.port_names();
        assert!(names.contains(&(58, "TILT_SENSOR")));
        assert_eq!(HubModel::MoveHub.hub_type(), HubType::MoveHub);

        let names = HubModel::TechnicMediumHub.port_names();
        assert!(names.contains(&(99, "TILT_SENSOR")));
        assert!(names.contains(&(97, "ACCELEROMETER")));
        assert_eq!(names.len(), 10);
    }
}

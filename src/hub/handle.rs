//! Command handle for a device on a hub port.

use std::time::Duration;

use tracing::debug;

use crate::device::{self, Device, DeviceKind, map_speed, normalize_angle};
use crate::error::{Error, Result};
use crate::hub::Hub;
use crate::protocol::command;
use crate::transport::RadioLink;
use crate::types::{BrakingStyle, Color};

/// Saturates a duration to the 16-bit millisecond field of timed commands.
fn duration_ms(duration: Duration) -> u16 {
    u16::try_from(duration.as_millis()).unwrap_or(u16::MAX)
}

/// Sends commands to the device attached to one port.
///
/// The handle borrows the hub; every call checks the port again, so a
/// device detached in the meantime yields [`Error::PortNotFound`].
pub struct DeviceRef<'a, T> {
    hub: &'a Hub<T>,
    port_id: u8,
}

impl<'a, T: RadioLink + 'static> DeviceRef<'a, T> {
    pub(crate) const fn new(hub: &'a Hub<T>, port_id: u8) -> Self {
        Self { hub, port_id }
    }

    /// Port the handle addresses.
    #[must_use]
    pub const fn port_id(&self) -> u8 {
        self.port_id
    }

    fn not_found(&self) -> Error {
        Error::PortNotFound {
            port: self.port_id.to_string(),
        }
    }

    async fn with_device<R>(&self, f: impl FnOnce(&Device) -> R) -> Result<R> {
        let ports = self.hub.shared.ports.read().await;
        let device = ports.device(self.port_id).ok_or_else(|| self.not_found())?;
        Ok(f(device))
    }

    async fn with_device_mut<R>(&self, f: impl FnOnce(&mut Device) -> R) -> Result<R> {
        let mut ports = self.hub.shared.ports.write().await;
        let device = ports
            .device_mut(self.port_id)
            .ok_or_else(|| self.not_found())?;
        Ok(f(device))
    }

    /// Returns a snapshot of the device.
    pub async fn snapshot(&self) -> Result<Device> {
        self.with_device(Device::clone).await
    }

    /// Enables value notifications for `mode`.
    pub async fn enable_notification(&self, mode: u8) -> Result<()> {
        self.with_device(|_| ()).await?;
        self.hub
            .send(&command::input_format_setup(self.port_id, mode, true))
            .await
    }

    /// Disables value notifications for `mode`.
    pub async fn disable_notification(&self, mode: u8) -> Result<()> {
        self.with_device(|_| ()).await?;
        self.hub
            .send(&command::input_format_setup(self.port_id, mode, false))
            .await
    }

    /// Sets the mode used to decode incoming values.
    pub async fn set_mode(&self, mode: u8) -> Result<()> {
        self.with_device_mut(|device| device.set_mode(mode)).await
    }

    // ==================== Motors ====================

    /// Checks for a motor and returns its braking style and virtual flag.
    async fn motor(&self, operation: &str) -> Result<(BrakingStyle, bool)> {
        self.with_device(|device| {
            device
                .as_motor()
                .map(|motor| (motor.braking_style(), device.is_virtual_port()))
        })
        .await?
        .ok_or_else(|| Error::unsupported(format!("{operation} on port {}", self.port_id)))
    }

    /// Like [`Self::motor`], but also requires a virtual port.
    async fn dual_motor(&self, operation: &str) -> Result<BrakingStyle> {
        let (braking, is_virtual) = self.motor(operation).await?;
        if !is_virtual {
            return Err(Error::unsupported(format!(
                "{operation} needs a virtual port, port {} is physical",
                self.port_id
            )));
        }
        Ok(braking)
    }

    /// Sets motor power in percent; `127` brakes.
    pub async fn set_power(&self, power: i32) -> Result<()> {
        self.motor("set_power").await?;
        self.hub
            .send(&command::start_power(self.port_id, map_speed(power)))
            .await
    }

    /// Cuts motor power.
    pub async fn stop(&self) -> Result<()> {
        self.set_power(0).await
    }

    /// Actively brakes the motor.
    pub async fn brake(&self) -> Result<()> {
        self.set_power(device::motor::BRAKE_POWER).await
    }

    /// Runs the motor at `speed` percent, optionally for a duration.
    ///
    /// The motor's braking style is applied when the movement ends.
    pub async fn set_speed(&self, speed: i32, duration: Option<Duration>) -> Result<()> {
        let (braking, _) = self.motor("set_speed").await?;
        let end_state = braking as u8;
        let command = match duration {
            None => command::start_speed(self.port_id, map_speed(speed), end_state),
            Some(duration) => command::start_speed_for_time(
                self.port_id,
                duration_ms(duration),
                map_speed(speed),
                end_state,
            ),
        };
        self.hub.send(&command).await
    }

    /// Runs both motors of a virtual port at individual speeds.
    pub async fn set_speeds(
        &self,
        speed1: i32,
        speed2: i32,
        duration: Option<Duration>,
    ) -> Result<()> {
        let end_state = self.dual_motor("set_speeds").await? as u8;
        let (speed1, speed2) = (map_speed(speed1), map_speed(speed2));
        let command = match duration {
            None => command::start_speed_dual(self.port_id, speed1, speed2, end_state),
            Some(duration) => command::start_speed_for_time_dual(
                self.port_id,
                duration_ms(duration),
                speed1,
                speed2,
                end_state,
            ),
        };
        self.hub.send(&command).await
    }

    /// Moves an absolute motor to `angle` degrees.
    pub async fn go_to_angle(&self, angle: i32, speed: i32) -> Result<()> {
        let end_state = self.absolute_motor("go_to_angle", false).await? as u8;
        self.hub
            .send(&command::goto_absolute_position(
                self.port_id,
                normalize_angle(angle),
                map_speed(speed),
                end_state,
            ))
            .await
    }

    /// Moves both absolute motors of a virtual port.
    pub async fn go_to_angles(&self, angle1: i32, angle2: i32, speed: i32) -> Result<()> {
        let end_state = self.absolute_motor("go_to_angles", true).await? as u8;
        self.hub
            .send(&command::goto_absolute_position_dual(
                self.port_id,
                normalize_angle(angle1),
                normalize_angle(angle2),
                map_speed(speed),
                end_state,
            ))
            .await
    }

    async fn absolute_motor(&self, operation: &str, dual: bool) -> Result<BrakingStyle> {
        let supported = self
            .with_device(|device| {
                device
                    .as_motor()
                    .is_some_and(|motor| motor.supports_absolute_position())
            })
            .await?;
        if !supported {
            return Err(Error::unsupported(format!(
                "{operation} on port {}",
                self.port_id
            )));
        }

        if dual {
            self.dual_motor(operation).await
        } else {
            self.motor(operation).await.map(|(braking, _)| braking)
        }
    }

    /// Sets the end state used by speed and position commands.
    pub async fn set_braking_style(&self, style: BrakingStyle) -> Result<()> {
        let applied = self
            .with_device_mut(|device| {
                if let Some(motor) = device.as_motor_mut() {
                    motor.set_braking_style(style);
                    true
                } else {
                    false
                }
            })
            .await?;
        if applied {
            Ok(())
        } else {
            Err(Error::unsupported(format!(
                "set_braking_style on port {}",
                self.port_id
            )))
        }
    }

    /// Returns the end state used by speed and position commands.
    pub async fn braking_style(&self) -> Result<BrakingStyle> {
        self.motor("braking_style").await.map(|(braking, _)| braking)
    }

    // ==================== Lights ====================

    async fn expect_kind(&self, operation: &str, matches: fn(&DeviceKind) -> bool) -> Result<()> {
        let ok = self.with_device(|device| matches(device.kind())).await?;
        if ok {
            Ok(())
        } else {
            Err(Error::unsupported(format!(
                "{operation} on port {}",
                self.port_id
            )))
        }
    }

    /// Sets the hub LED to a palette color.
    pub async fn set_color(&self, color: Color) -> Result<()> {
        self.expect_kind("set_color", |kind| matches!(kind, DeviceKind::HubLed))
            .await?;
        self.enable_notification(device::LED_MODE_COLOR).await?;
        self.send_led(device::LED_MODE_COLOR, &[color as u8]).await
    }

    /// Sets the hub LED to an RGB color.
    pub async fn set_rgb(&self, red: u8, green: u8, blue: u8) -> Result<()> {
        self.expect_kind("set_rgb", |kind| matches!(kind, DeviceKind::HubLed))
            .await?;
        self.enable_notification(device::LED_MODE_RGB).await?;
        self.send_led(device::LED_MODE_RGB, &[red, green, blue])
            .await
    }

    async fn send_led(&self, mode: u8, data: &[u8]) -> Result<()> {
        debug!("LED on port {} mode {}: {:02X?}", self.port_id, mode, data);
        self.hub
            .send(&command::write_direct_mode_data(self.port_id, mode, data))
            .await
    }

    /// Sets the brightness of a Powered Up light.
    pub async fn set_brightness(&self, brightness: u8) -> Result<()> {
        self.expect_kind("set_brightness", |kind| matches!(kind, DeviceKind::Light))
            .await?;
        self.hub
            .send(&command::write_direct_mode_data(
                self.port_id,
                0x00,
                &[brightness],
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_saturates() {
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms(Duration::from_secs(120)), u16::MAX);
        assert_eq!(duration_ms(Duration::ZERO), 0);
    }
}

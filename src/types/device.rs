//! Device type codes and device-level value types.

/// Device type codes reported in `HubAttachedIO` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum DeviceType {
    /// Unknown device.
    Unknown = 0,
    /// WeDo 2.0 medium motor.
    SimpleMediumLinearMotor = 1,
    /// Powered Up train motor.
    TrainMotor = 2,
    /// Powered Up LED light (88005).
    Light = 8,
    /// Hub-internal voltage sensor.
    VoltageSensor = 20,
    /// Hub-internal current sensor.
    CurrentSensor = 21,
    /// Piezo buzzer.
    PiezoBuzzer = 22,
    /// Hub RGB LED.
    HubLed = 23,
    /// WeDo 2.0 tilt sensor.
    TiltSensor = 34,
    /// WeDo 2.0 motion sensor.
    MotionSensor = 35,
    /// Boost color and distance sensor (88007).
    ColorDistanceSensor = 37,
    /// Boost medium tacho motor (88008).
    MediumLinearMotor = 38,
    /// Move Hub internal tacho motor.
    MoveHubMediumLinearMotor = 39,
    /// Move Hub internal tilt sensor.
    MoveHubTiltSensor = 40,
    /// Duplo train base motor.
    DuploTrainBaseMotor = 41,
    /// Duplo train base speaker.
    DuploTrainBaseSpeaker = 42,
    /// Duplo train base color sensor.
    DuploTrainBaseColorSensor = 43,
    /// Duplo train base speedometer.
    DuploTrainBaseSpeedometer = 44,
    /// Control+ large motor (22169).
    TechnicLargeLinearMotor = 46,
    /// Control+ XL motor (22172).
    TechnicXLargeLinearMotor = 47,
    /// Spike Prime medium angular motor.
    TechnicMediumAngularMotor = 48,
    /// Spike Prime large angular motor.
    TechnicLargeAngularMotor = 49,
    /// Control+ hub gesture sensor.
    TechnicMediumHubGestureSensor = 54,
    /// Remote control button.
    RemoteControlButton = 55,
    /// Remote control RSSI.
    RemoteControlRssi = 56,
    /// Control+ hub accelerometer.
    TechnicMediumHubAccelerometer = 57,
    /// Control+ hub gyro sensor.
    TechnicMediumHubGyroSensor = 58,
    /// Control+ hub tilt sensor.
    TechnicMediumHubTiltSensor = 59,
    /// Control+ hub temperature sensor.
    TechnicMediumHubTemperatureSensor = 60,
    /// Spike Prime color sensor.
    TechnicColorSensor = 61,
    /// Spike Prime distance sensor.
    TechnicDistanceSensor = 62,
    /// Spike Prime force sensor.
    TechnicForceSensor = 63,
}

impl DeviceType {
    /// Parses a device type from its 16-bit code.
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::SimpleMediumLinearMotor),
            2 => Some(Self::TrainMotor),
            8 => Some(Self::Light),
            20 => Some(Self::VoltageSensor),
            21 => Some(Self::CurrentSensor),
            22 => Some(Self::PiezoBuzzer),
            23 => Some(Self::HubLed),
            34 => Some(Self::TiltSensor),
            35 => Some(Self::MotionSensor),
            37 => Some(Self::ColorDistanceSensor),
            38 => Some(Self::MediumLinearMotor),
            39 => Some(Self::MoveHubMediumLinearMotor),
            40 => Some(Self::MoveHubTiltSensor),
            41 => Some(Self::DuploTrainBaseMotor),
            42 => Some(Self::DuploTrainBaseSpeaker),
            43 => Some(Self::DuploTrainBaseColorSensor),
            44 => Some(Self::DuploTrainBaseSpeedometer),
            46 => Some(Self::TechnicLargeLinearMotor),
            47 => Some(Self::TechnicXLargeLinearMotor),
            48 => Some(Self::TechnicMediumAngularMotor),
            49 => Some(Self::TechnicLargeAngularMotor),
            54 => Some(Self::TechnicMediumHubGestureSensor),
            55 => Some(Self::RemoteControlButton),
            56 => Some(Self::RemoteControlRssi),
            57 => Some(Self::TechnicMediumHubAccelerometer),
            58 => Some(Self::TechnicMediumHubGyroSensor),
            59 => Some(Self::TechnicMediumHubTiltSensor),
            60 => Some(Self::TechnicMediumHubTemperatureSensor),
            61 => Some(Self::TechnicColorSensor),
            62 => Some(Self::TechnicDistanceSensor),
            63 => Some(Self::TechnicForceSensor),
            _ => None,
        }
    }

    /// Returns the 16-bit protocol code.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// Colors understood by the hub LED and reported by color sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    /// Black.
    Black = 0,
    /// Pink.
    Pink = 1,
    /// Purple.
    Purple = 2,
    /// Blue.
    Blue = 3,
    /// Light blue.
    LightBlue = 4,
    /// Cyan.
    Cyan = 5,
    /// Green.
    Green = 6,
    /// Yellow.
    Yellow = 7,
    /// Orange.
    Orange = 8,
    /// Red.
    Red = 9,
    /// White.
    White = 10,
    /// No color / LED off.
    None = 255,
}

impl Color {
    /// Parses a color from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Black),
            1 => Some(Self::Pink),
            2 => Some(Self::Purple),
            3 => Some(Self::Blue),
            4 => Some(Self::LightBlue),
            5 => Some(Self::Cyan),
            6 => Some(Self::Green),
            7 => Some(Self::Yellow),
            8 => Some(Self::Orange),
            9 => Some(Self::Red),
            10 => Some(Self::White),
            255 => Some(Self::None),
            _ => None,
        }
    }
}

/// End state applied when a motor finishes a movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BrakingStyle {
    /// Cut power and let the motor coast.
    Float = 0,
    /// Actively hold the current position.
    Hold = 126,
    /// Short the motor windings.
    #[default]
    Brake = 127,
}

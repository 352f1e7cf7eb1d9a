//! End-to-end tests driving a hub over an in-memory link.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use lpf2::device::motor::MODE_ROTATION;
use lpf2::hub::variants::technic_medium_hub;
use lpf2::{
    ChannelLink, Color, ConnectedHub, DeviceEvent, DeviceType, Error, Event, EventFilter,
    EventKind, Hub, HubConfig, HubModel, HubPropertyType, HubPropertyValue, LinkPeer,
    SessionState, Subscription,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const WAIT: Duration = Duration::from_secs(2);

fn frame(message_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![(payload.len() + 3) as u8, 0x00, message_type];
    bytes.extend_from_slice(payload);
    bytes
}

fn property_update(property: u8, value: &[u8]) -> Vec<u8> {
    let mut payload = vec![property, 0x06];
    payload.extend_from_slice(value);
    frame(0x01, &payload)
}

fn attach(port: u8, device_type: u16) -> Vec<u8> {
    let [lo, hi] = device_type.to_le_bytes();
    frame(0x04, &[port, 0x01, lo, hi, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])
}

fn detach(port: u8) -> Vec<u8> {
    frame(0x04, &[port, 0x00])
}

fn property_value(property: u8) -> Option<&'static [u8]> {
    match property {
        0x03 => Some(&[0x24, 0x02, 0x00, 0x10]),
        0x04 => Some(&[0x00, 0x00, 0x00, 0x04]),
        0x05 => Some(&[0xC4]),
        0x06 => Some(&[0x5A]),
        0x0D => Some(&[0x90, 0x84, 0x2B, 0x4E, 0x8E, 0x43]),
        _ => None,
    }
}

/// Builds the hub's answer to a written frame, if it has one.
fn respond(write: &[u8]) -> Option<Vec<u8>> {
    match write {
        // RequestUpdate for a hub property
        [_, _, 0x01, property, 0x05] => {
            property_value(*property).map(|value| property_update(*property, value))
        }
        // VirtualPortSetup: the hub creates virtual port 16
        [_, _, 0x61, 0x01, first, second] => Some(frame(
            0x04,
            &[16, 0x02, 0x27, 0x00, *first, *second],
        )),
        _ => None,
    }
}

enum Control {
    Notify(Vec<u8>),
    DropLink,
}

/// Hub side of the link, answering property requests on its own.
struct FakeHub {
    control: mpsc::Sender<Control>,
    writes: mpsc::Receiver<Bytes>,
}

impl FakeHub {
    /// Starts the fake; `initial` frames are sent as soon as the engine subscribes.
    fn start(mut peer: LinkPeer, initial: Vec<Vec<u8>>) -> Self {
        let (control, mut control_rx) = mpsc::channel(64);
        let (writes_tx, writes) = mpsc::channel(256);

        tokio::spawn(async move {
            while !peer.is_subscribed() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            for frame in initial {
                let _ = peer.notify(frame).await;
            }

            loop {
                tokio::select! {
                    write = peer.next_write() => {
                        let Some(write) = write else { break };
                        if let Some(answer) = respond(&write) {
                            let _ = peer.notify(answer).await;
                        }
                        let _ = writes_tx.send(write).await;
                    }
                    control = control_rx.recv() => match control {
                        Some(Control::Notify(frame)) => {
                            let _ = peer.notify(frame).await;
                        }
                        Some(Control::DropLink) => peer.drop_link(),
                        None => break,
                    },
                }
            }
        });

        Self { control, writes }
    }

    async fn notify(&self, frame: Vec<u8>) {
        self.control.send(Control::Notify(frame)).await.unwrap();
    }

    async fn drop_link(&self) {
        self.control.send(Control::DropLink).await.unwrap();
    }

    /// Skips writes until `expected` shows up.
    async fn expect_write(&mut self, expected: &[u8]) {
        let found = tokio::time::timeout(WAIT, async {
            while let Some(write) = self.writes.recv().await {
                if write.as_ref() == expected {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false);
        assert!(found, "write {expected:02X?} not seen");
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config() -> HubConfig {
    init_tracing();
    HubConfig::new()
        .settle_delay(Duration::ZERO)
        .request_timeout(Duration::from_millis(200))
        .connect_timeout(Duration::from_secs(2))
}

async fn connect(model: HubModel, initial: Vec<Vec<u8>>) -> (Hub<ChannelLink>, FakeHub) {
    let (link, peer) = ChannelLink::pair();
    let fake = FakeHub::start(peer, initial);
    let hub = Hub::connect(link, model, config()).await.unwrap();
    (hub, fake)
}

async fn next(subscription: &mut Subscription) -> Event {
    tokio::time::timeout(WAIT, subscription.recv())
        .await
        .expect("event not received")
        .expect("dispatcher closed")
}

/// Returns once every frame notified before this call has been handled.
async fn flush(hub: &Hub<ChannelLink>, fake: &FakeHub) {
    let mut marker = hub.subscribe_filtered(EventFilter::port(7));
    fake.notify(attach(7, 38)).await;
    assert!(matches!(next(&mut marker).await, Event::DeviceAttached { .. }));
}

#[tokio::test]
async fn test_handshake_fills_hub_info() {
    let (hub, mut fake) = connect(HubModel::MoveHub, Vec::new()).await;

    assert_eq!(hub.state(), SessionState::Ready);
    assert!(hub.is_connected().await);

    let info = hub.info().await;
    assert_eq!(info.hub_type, lpf2::HubType::MoveHub);
    assert_eq!(
        info.firmware_version.map(|v| v.to_string()),
        Some("1.0.00.0224".to_string())
    );
    assert_eq!(
        info.primary_mac_address.map(|m| m.to_string()),
        Some("90:84:2B:4E:8E:43".to_string())
    );

    // Button, then RSSI and battery updates were enabled in order
    fake.expect_write(&[0x05, 0x00, 0x01, 0x02, 0x02]).await;
    fake.expect_write(&[0x05, 0x00, 0x01, 0x05, 0x02]).await;
    fake.expect_write(&[0x05, 0x00, 0x01, 0x06, 0x02]).await;
}

#[tokio::test]
async fn test_attach_detach_lifecycle() {
    let (hub, mut fake) = connect(HubModel::MoveHub, Vec::new()).await;
    let mut events = hub.subscribe_filtered(EventFilter::port(5));

    fake.notify(attach(5, 37)).await;
    assert_eq!(
        next(&mut events).await,
        Event::DeviceAttached {
            port_id: 5,
            port_name: None,
            device_type: DeviceType::ColorDistanceSensor,
        }
    );

    let device = hub.get_device(5).await.unwrap();
    assert_eq!(device.device_type(), DeviceType::ColorDistanceSensor);
    assert_eq!(hub.ports().await, vec![5]);

    // Color and distance mode is enabled automatically
    fake.expect_write(&[0x0A, 0x00, 0x41, 0x05, 0x08, 0x01, 0x00, 0x00, 0x00, 0x01])
        .await;

    fake.notify(frame(0x45, &[5, 0x09, 0x02, 0x00, 0x04])).await;
    assert_eq!(
        next(&mut events).await,
        Event::Device {
            port_id: 5,
            event: DeviceEvent::Color(Color::Red),
        }
    );
    assert_eq!(
        next(&mut events).await,
        Event::Device {
            port_id: 5,
            event: DeviceEvent::Distance { millimeters: 37.0 },
        }
    );

    fake.notify(detach(5)).await;
    assert_eq!(
        next(&mut events).await,
        Event::DeviceDetached {
            port_id: 5,
            port_name: None,
            device_type: DeviceType::ColorDistanceSensor,
        }
    );
    fake.expect_write(&[0x0A, 0x00, 0x41, 0x05, 0x08, 0x01, 0x00, 0x00, 0x00, 0x00])
        .await;

    assert!(hub.get_device(5).await.is_none());
    assert!(hub.device(5).await.is_none());
}

#[tokio::test]
async fn test_virtual_port() {
    let (hub, mut fake) = connect(HubModel::MoveHub, vec![attach(0, 39), attach(1, 39)]).await;

    let port_id = hub
        .create_virtual_port_and_wait("A", "B", WAIT)
        .await
        .unwrap();
    assert_eq!(port_id, 16);
    fake.expect_write(&[0x06, 0x00, 0x61, 0x01, 0x00, 0x01]).await;

    assert_eq!(hub.port_name(16).await.as_deref(), Some("A+B"));
    assert_eq!(hub.port_id("A+B").await, Some(16));
    let mapping = hub.virtual_port(16).await.unwrap();
    assert_eq!((mapping.first, mapping.second), (0, 1));

    let device = hub.get_device_by_name("A+B").await.unwrap();
    assert!(device.is_virtual_port());
    assert_eq!(device.port_name(), Some("A+B"));

    let motors = hub.device_by_name("A+B").await.unwrap();
    motors.set_speeds(50, -50, None).await.unwrap();
    fake.expect_write(&[0x0B, 0x00, 0x81, 16, 0x11, 0x08, 50, 0xCE, 0x64, 0x7F, 0x00])
        .await;

    // Dual commands need a virtual port
    let motor_a = hub.device_by_name("A").await.unwrap();
    assert!(matches!(
        motor_a.set_speeds(50, 50, None).await,
        Err(Error::UnsupportedOperation { .. })
    ));

    let mut events = hub.subscribe_filtered(EventFilter::kinds(vec![EventKind::DeviceDetached]));
    fake.notify(detach(16)).await;
    assert_eq!(
        next(&mut events).await,
        Event::DeviceDetached {
            port_id: 16,
            port_name: Some("A+B".into()),
            device_type: DeviceType::MoveHubMediumLinearMotor,
        }
    );
    assert_eq!(hub.port_name(16).await, None);
    assert!(hub.virtual_port(16).await.is_none());
}

#[tokio::test]
async fn test_virtual_port_with_unmodeled_device_is_removed() {
    let (hub, fake) = connect(HubModel::MoveHub, vec![attach(0, 39), attach(1, 39)]).await;

    fake.notify(frame(0x04, &[16, 0x02, 0x34, 0x12, 0, 1])).await;
    flush(&hub, &fake).await;

    assert!(hub.get_device(16).await.is_none());
    assert!(hub.virtual_port(16).await.is_none());
    assert_eq!(hub.port_name(16).await, None);
    assert_eq!(hub.port_id("A+B").await, None);

    fake.notify(detach(16)).await;
    flush(&hub, &fake).await;
    assert!(hub.virtual_port(16).await.is_none());
    assert!(!hub.port_names().await.contains(&"A+B".to_string()));
}

#[tokio::test]
async fn test_virtual_attach_needs_physical_constituents() {
    let (hub, fake) = connect(HubModel::MoveHub, vec![attach(0, 39)]).await;

    // Port B is empty
    fake.notify(frame(0x04, &[16, 0x02, 0x27, 0x00, 0, 1])).await;
    flush(&hub, &fake).await;
    assert!(hub.get_device(16).await.is_none());
    assert!(hub.virtual_port(16).await.is_none());
    assert_eq!(hub.port_name(16).await, None);

    // A virtual port cannot be a constituent
    fake.notify(attach(1, 39)).await;
    fake.notify(frame(0x04, &[16, 0x02, 0x27, 0x00, 0, 1])).await;
    fake.notify(frame(0x04, &[17, 0x02, 0x27, 0x00, 16, 1])).await;
    flush(&hub, &fake).await;
    assert_eq!(hub.port_name(16).await.as_deref(), Some("A+B"));
    assert!(hub.get_device(17).await.is_none());
    assert!(hub.virtual_port(17).await.is_none());
}

#[tokio::test]
async fn test_virtual_port_needs_attached_devices() {
    let (hub, _fake) = connect(HubModel::MoveHub, vec![attach(0, 39)]).await;

    let result = hub.create_virtual_port("A", "B").await;
    assert!(matches!(result, Err(Error::PortNotFound { port }) if port == "B"));
}

#[tokio::test]
async fn test_correlated_response_is_not_broadcast() {
    let (hub, fake) = connect(HubModel::TechnicMediumHub, Vec::new()).await;
    let mut events = hub.subscribe_filtered(EventFilter::kinds(vec![EventKind::RssiChanged]));

    let value = hub.request_property(HubPropertyType::Rssi).await.unwrap();
    assert_eq!(value, HubPropertyValue::Rssi(-60));
    assert_eq!(hub.info().await.rssi, Some(-60));

    // The first RSSI event is the unsolicited one
    fake.notify(property_update(0x05, &[0xC8])).await;
    assert_eq!(next(&mut events).await, Event::RssiChanged(-56));
}

#[tokio::test]
async fn test_unknown_device_type_leaves_slot_empty() {
    let (hub, fake) = connect(HubModel::MoveHub, Vec::new()).await;
    let mut events = hub.subscribe_filtered(EventFilter::kinds(vec![EventKind::DeviceAttached]));

    fake.notify(attach(5, 0x1234)).await;
    fake.notify(attach(6, 2)).await;
    fake.notify(attach(7, 38)).await;

    // Only the modeled device is announced
    let event = next(&mut events).await;
    assert_eq!(event.port_id(), Some(7));

    assert!(hub.get_device(5).await.is_none());
    assert!(hub.get_device(6).await.is_none());
    assert!(hub.find_first(DeviceType::TrainMotor).await.is_none());
    assert_eq!(hub.find_all(DeviceType::MediumLinearMotor).await.len(), 1);
}

#[tokio::test]
async fn test_second_request_rejected_while_pending() {
    let (hub, _fake) = connect(HubModel::MoveHub, Vec::new()).await;

    // Battery type is never answered
    let (first, second) = tokio::join!(
        hub.request_property(HubPropertyType::BatteryType),
        hub.request_property(HubPropertyType::BatteryType),
    );
    assert!(matches!(first, Err(Error::Timeout { timeout_ms: 200 })));
    assert!(matches!(
        second,
        Err(Error::RequestPending {
            property: HubPropertyType::BatteryType
        })
    ));

    // The slot is free again after the timeout
    let again = hub.request_property(HubPropertyType::BatteryType).await;
    assert!(matches!(again, Err(Error::Timeout { .. })));
}

#[tokio::test]
async fn test_undecodable_response_reaches_requester() {
    let (hub, fake) = connect(HubModel::MoveHub, Vec::new()).await;
    let mut raw = hub.subscribe_filtered(EventFilter::kinds(vec![EventKind::Raw]));

    // Button requests are not answered by the fake; 0x03 is no button state
    let started = tokio::time::Instant::now();
    let (result, ()) = tokio::join!(hub.request_property(HubPropertyType::Button), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        fake.notify(property_update(0x02, &[0x03])).await;
    });

    assert!(matches!(result, Err(Error::Protocol { .. })), "{result:?}");
    assert!(started.elapsed() < Duration::from_millis(200));
    assert_eq!(hub.info().await.button, None);

    // Claimed by the request, so not broadcast
    flush(&hub, &fake).await;
    let nothing = tokio::time::timeout(Duration::from_millis(50), raw.recv()).await;
    assert!(nothing.is_err(), "{nothing:?}");

    // Unclaimed undecodable updates are passed on raw
    fake.notify(property_update(0x02, &[0x03])).await;
    assert!(matches!(
        next(&mut raw).await,
        Event::Raw {
            message_type: 0x01,
            ..
        }
    ));
}

#[tokio::test]
async fn test_timeout_does_not_stall_dispatcher() {
    let (hub, fake) = connect(HubModel::MoveHub, Vec::new()).await;

    let result = hub.request_property(HubPropertyType::ManufactureName).await;
    assert!(matches!(result, Err(Error::Timeout { .. })));

    let value = hub.request_property(HubPropertyType::BatteryVoltage).await;
    assert_eq!(value.unwrap(), HubPropertyValue::BatteryVoltage(90));

    let mut events = hub.subscribe_filtered(EventFilter::port(3));
    fake.notify(attach(3, 38)).await;
    assert!(matches!(next(&mut events).await, Event::DeviceAttached { .. }));
}

#[tokio::test]
async fn test_motor_commands_and_feedback() {
    let (hub, mut fake) = connect(HubModel::TechnicMediumHub, vec![attach(0, 46)]).await;
    let motor = hub.device_by_name("A").await.unwrap();

    motor.go_to_angle(190, 150).await.unwrap();
    fake.expect_write(&[
        0x0E, 0x00, 0x81, 0x00, 0x11, 0x0D, 0x56, 0xFF, 0xFF, 0xFF, 0x64, 0x64, 0x7F, 0x00,
    ])
    .await;

    motor
        .set_speed(-20, Some(Duration::from_millis(1000)))
        .await
        .unwrap();
    fake.expect_write(&[
        0x0C, 0x00, 0x81, 0x00, 0x11, 0x09, 0xE8, 0x03, 0xEC, 0x64, 0x7F, 0x00,
    ])
    .await;

    motor.brake().await.unwrap();
    fake.expect_write(&[0x08, 0x00, 0x81, 0x00, 0x11, 0x51, 0x00, 0x7F])
        .await;

    let mut events = hub.subscribe_filtered(EventFilter::kinds(vec![EventKind::ActionFinished]));
    fake.notify(frame(0x82, &[0x00, 0x0A])).await;
    assert_eq!(next(&mut events).await, Event::ActionFinished { port_id: 0 });

    let snapshot = motor.snapshot().await.unwrap();
    assert_eq!(snapshot.as_motor().map(|m| m.actions_finished()), Some(1));

    // A motor is not a light
    assert!(matches!(
        motor.set_brightness(10).await,
        Err(Error::UnsupportedOperation { .. })
    ));

    motor.set_mode(MODE_ROTATION).await.unwrap();
    let mut values = hub.subscribe_filtered(EventFilter::kinds(vec![EventKind::Device]));
    fake.notify(frame(0x45, &[0x00, 0x68, 0x01, 0x00, 0x00])).await;
    assert_eq!(
        next(&mut values).await,
        Event::Device {
            port_id: 0,
            event: DeviceEvent::Rotation { degrees: 360 },
        }
    );
}

#[tokio::test]
async fn test_link_loss_disconnects() {
    let (hub, fake) = connect(HubModel::MoveHub, Vec::new()).await;
    let mut events = hub.subscribe_filtered(EventFilter::kinds(vec![EventKind::Disconnected]));
    let mut state = hub.state_changes();

    fake.drop_link().await;
    assert_eq!(next(&mut events).await, Event::Disconnected);

    tokio::time::timeout(WAIT, state.wait_for(|s| *s == SessionState::Disconnected))
        .await
        .unwrap()
        .unwrap();

    let result = hub.request_property(HubPropertyType::Rssi).await;
    assert!(matches!(result, Err(Error::NotConnected)));
}

#[tokio::test]
async fn test_explicit_disconnect() {
    let (mut hub, _fake) = connect(HubModel::MoveHub, Vec::new()).await;
    let mut events = hub.subscribe();

    hub.disconnect().await.unwrap();
    assert_eq!(next(&mut events).await, Event::Disconnected);
    assert_eq!(hub.state(), SessionState::Disconnected);
    assert!(!hub.is_connected().await);
    assert!(matches!(hub.switch_off().await, Err(Error::NotConnected)));
}

#[tokio::test]
async fn test_connect_fails_when_peer_is_gone() {
    let (link, peer) = ChannelLink::pair();
    drop(peer);

    let result = Hub::connect(link, HubModel::MoveHub, config()).await;
    assert!(matches!(result, Err(Error::Transport { .. })));
}

#[tokio::test]
async fn test_connected_hub_from_manufacturer_data() {
    let (link, peer) = ChannelLink::pair();
    let mut fake = FakeHub::start(
        peer,
        vec![
            attach(technic_medium_hub::HUB_LED, 23),
            attach(technic_medium_hub::ACCELEROMETER, 57),
            attach(technic_medium_hub::TILT_SENSOR, 59),
        ],
    );
    let data = HashMap::from([(0x0397, vec![0x00, 128, 0x00, 0x00])]);

    let hub = ConnectedHub::connect(link, &data, config())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hub.model(), HubModel::TechnicMediumHub);

    let ConnectedHub::TechnicMediumHub(technic) = &hub else {
        panic!("expected a Technic Medium Hub");
    };
    assert!(technic.accelerometer().is_some());
    assert!(technic.gyro_sensor().is_none());

    let led = technic.led().unwrap();
    led.set_color(Color::Red).await.unwrap();
    fake.expect_write(&[0x0A, 0x00, 0x41, 50, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01])
        .await;
    fake.expect_write(&[0x08, 0x00, 0x81, 50, 0x11, 0x51, 0x00, 0x09])
        .await;

    let mut events = hub.subscribe_filtered(EventFilter::port(technic_medium_hub::TILT_SENSOR));
    fake.notify(frame(0x45, &[99, 0x0A, 0x00, 0x14, 0x00, 0xE2, 0xFF]))
        .await;
    assert_eq!(
        next(&mut events).await,
        Event::Device {
            port_id: 99,
            event: DeviceEvent::Tilt3 { x: 20, y: -30, z: -10 },
        }
    );
}

#[tokio::test]
async fn test_unsupported_hub_is_not_connected() {
    let (link, peer) = ChannelLink::pair();
    let data = HashMap::from([(0x0397, vec![0x00, 65])]);

    let hub = ConnectedHub::connect(link, &data, config()).await.unwrap();
    assert!(hub.is_none());
    assert!(!peer.is_connected());
}

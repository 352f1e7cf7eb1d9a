//! Inbound frame handling for the hub dispatcher task.

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::device;
use crate::event::Event;
use crate::hub::ports::VirtualPort;
use crate::hub::{Shared, write_command};
use crate::protocol::command;
use crate::protocol::{
    AttachedIo, AttachedIoEvent, Frame, HubPropertyType, HubPropertyValue, MessageType,
    decode_frame,
    parse_attached_io, parse_command_feedback, parse_generic_error, parse_hub_action,
    parse_hub_property,
};
use crate::transport::RadioLink;
use crate::types::HubInfo;

/// Handles one notification from the link.
pub(super) async fn process_frame<T: RadioLink>(bytes: Bytes, shared: &Shared, link: &Mutex<T>) {
    trace!("rx: {}", hex::encode(&bytes));

    let frame = match decode_frame(bytes) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("dropping malformed frame: {}", e);
            return;
        }
    };

    match frame.message_type() {
        Some(MessageType::HubProperties) => handle_hub_property(&frame, shared).await,
        Some(MessageType::HubAttachedIO) => match parse_attached_io(frame.payload()) {
            Ok(io) => handle_attached_io(io, shared, link).await,
            Err(e) => {
                warn!("failed to parse HubAttachedIO: {}", e);
                dispatch_raw(&frame, shared);
            }
        },
        Some(MessageType::PortValueSingle) => handle_port_value(&frame, shared).await,
        Some(MessageType::PortOutputCommandFeedback) => {
            match parse_command_feedback(frame.payload()) {
                Ok((port_id, feedback)) => handle_feedback(port_id, feedback, shared).await,
                Err(e) => warn!("failed to parse command feedback: {}", e),
            }
        }
        Some(MessageType::GenericErrorMessage) => match parse_generic_error(frame.payload()) {
            Ok((command, code)) => {
                warn!("hub rejected command 0x{:02X}: {:?}", command, code);
                shared
                    .dispatcher
                    .dispatch(Event::ProtocolError { command, code });
            }
            Err(e) => {
                warn!("failed to parse GenericErrorMessage: {}", e);
                dispatch_raw(&frame, shared);
            }
        },
        Some(MessageType::HubActions) => match parse_hub_action(frame.payload()) {
            Ok(action) => {
                info!("hub action: {:?}", action);
                shared.dispatcher.dispatch(Event::HubAction(action));
            }
            Err(e) => {
                warn!("failed to parse HubActions: {}", e);
                dispatch_raw(&frame, shared);
            }
        },
        _ => dispatch_raw(&frame, shared),
    }
}

fn dispatch_raw(frame: &Frame, shared: &Shared) {
    shared.dispatcher.dispatch(Event::Raw {
        message_type: frame.message_type_byte(),
        data: frame.payload().to_vec(),
    });
}

fn update_info(info: &mut HubInfo, value: &HubPropertyValue) {
    match value {
        HubPropertyValue::AdvertisingName(name) => info.name = Some(name.clone()),
        HubPropertyValue::Button(state) => info.button = Some(*state),
        HubPropertyValue::FirmwareVersion(version) => info.firmware_version = Some(*version),
        HubPropertyValue::HardwareVersion(version) => info.hardware_version = Some(*version),
        HubPropertyValue::Rssi(rssi) => info.rssi = Some(*rssi),
        HubPropertyValue::BatteryVoltage(level) => info.battery_level = Some(*level),
        HubPropertyValue::PrimaryMacAddress(mac) => info.primary_mac_address = Some(*mac),
        HubPropertyValue::Other { .. } => {}
    }
}

fn property_event(value: HubPropertyValue) -> Event {
    match value {
        HubPropertyValue::Button(state) => Event::ButtonStateChanged(state),
        HubPropertyValue::Rssi(rssi) => Event::RssiChanged(rssi),
        HubPropertyValue::BatteryVoltage(level) => Event::BatteryLevelChanged(level),
        other => Event::PropertyChanged(other),
    }
}

async fn handle_hub_property(frame: &Frame, shared: &Shared) {
    let Some(property) = frame
        .payload()
        .first()
        .and_then(|&byte| HubPropertyType::from_byte(byte))
    else {
        warn!("HubProperties for unknown property: {:02X?}", frame.payload());
        dispatch_raw(frame, shared);
        return;
    };

    let response = parse_hub_property(frame.payload());
    match &response {
        Ok(value) => update_info(&mut *shared.info.write().await, value),
        Err(e) => warn!("failed to parse {:?}: {}", property, e),
    }

    // A claimed response goes to its requester only, decoded or not
    let unclaimed = shared.pending.lock().await.resolve(property, response);
    match unclaimed {
        Ok(()) => {}
        Err(Ok(value)) => shared.dispatcher.dispatch(property_event(value)),
        Err(Err(_)) => dispatch_raw(frame, shared),
    }
}

async fn handle_attached_io<T: RadioLink>(io: AttachedIo, shared: &Shared, link: &Mutex<T>) {
    match io.event {
        AttachedIoEvent::Detached => detach(io.port_id, shared, link).await,
        AttachedIoEvent::Attached => {
            attach(io.port_id, io.device_type_code, false, shared, link).await;
        }
        AttachedIoEvent::AttachedVirtual => {
            let (Some(first), Some(second)) = (io.first_port, io.second_port) else {
                warn!("virtual attach on port {} without constituents", io.port_id);
                return;
            };

            {
                let mut ports = shared.ports.write().await;
                if let Some(id) = [first, second]
                    .into_iter()
                    .find(|&id| ports.device(id).is_none() || ports.is_virtual(id))
                {
                    warn!(
                        "virtual port {} ignored: constituent port {} is not an attached physical device",
                        io.port_id, id
                    );
                    return;
                }

                let label = |id: u8| ports.name(id).map_or_else(|| id.to_string(), str::to_string);
                let name = format!("{}+{}", label(first), label(second));
                debug!("virtual port {} is {}", io.port_id, name);
                ports.add_virtual(
                    io.port_id,
                    VirtualPort {
                        first,
                        second,
                        name,
                    },
                );
            }

            attach(io.port_id, io.device_type_code, true, shared, link).await;
        }
    }
}

async fn attach<T: RadioLink>(
    port_id: u8,
    device_type_code: u16,
    is_virtual: bool,
    shared: &Shared,
    link: &Mutex<T>,
) {
    let (event, subscribe_mode) = {
        let mut ports = shared.ports.write().await;
        let port_name = ports.name(port_id).map(str::to_string);

        let Some(mut device) =
            device::create(device_type_code, shared.hub_type, port_id, port_name.clone())
        else {
            ports.remove(port_id);
            if is_virtual {
                ports.remove_virtual(port_id);
            }
            return;
        };

        device.set_virtual_port(is_virtual);
        let device_type = device.device_type();
        let subscribe_mode = device
            .as_sensor()
            .filter(|sensor| sensor.auto_subscribe())
            .map(|sensor| sensor.default_mode());

        if let Some(previous) = ports.insert(device) {
            debug!(
                "{:?} on port {} replaced by {:?}",
                previous.device_type(),
                port_id,
                device_type
            );
        }

        let event = Event::DeviceAttached {
            port_id,
            port_name,
            device_type,
        };
        (event, subscribe_mode)
    };

    debug!("attached {:?}", event);
    shared.dispatcher.dispatch(event);

    if let Some(mode) = subscribe_mode {
        let setup = command::input_format_setup(port_id, mode, true);
        if let Err(e) = write_command(link, &setup).await {
            warn!("failed to enable notifications on port {}: {}", port_id, e);
        }
    }
}

async fn detach<T: RadioLink>(port_id: u8, shared: &Shared, link: &Mutex<T>) {
    let unsubscribe_mode = {
        let mut ports = shared.ports.write().await;
        let Some(device) = ports.device(port_id) else {
            if ports.is_virtual(port_id) {
                ports.remove_virtual(port_id);
            }
            warn!("detach on empty port {}", port_id);
            return;
        };
        device
            .as_sensor()
            .filter(|sensor| sensor.auto_subscribe())
            .map(|sensor| sensor.default_mode())
    };

    if let Some(mode) = unsubscribe_mode {
        let setup = command::input_format_setup(port_id, mode, false);
        if let Err(e) = write_command(link, &setup).await {
            debug!("failed to disable notifications on port {}: {}", port_id, e);
        }
    }

    let event = {
        let mut ports = shared.ports.write().await;
        let Some(device) = ports.remove(port_id) else {
            return;
        };
        let port_name = ports.name(port_id).map(str::to_string);
        if let Some(port) = ports.remove_virtual(port_id) {
            debug!("virtual port {} ({}) removed", port_id, port.name);
        }
        Event::DeviceDetached {
            port_id,
            port_name,
            device_type: device.device_type(),
        }
    };

    debug!("detached {:?}", event);
    shared.dispatcher.dispatch(event);
}

async fn handle_port_value(frame: &Frame, shared: &Shared) {
    let Some(&port_id) = frame.payload().first() else {
        debug!("empty port value");
        return;
    };

    let events = {
        let mut ports = shared.ports.write().await;
        match ports.device_mut(port_id) {
            Some(device) => device.receive(frame),
            None => {
                debug!("value for empty port {}", port_id);
                return;
            }
        }
    };

    for event in events {
        shared.dispatcher.dispatch(Event::Device { port_id, event });
    }
}

async fn handle_feedback(port_id: u8, feedback: u8, shared: &Shared) {
    if feedback == 0 {
        return;
    }

    if let Some(device) = shared.ports.write().await.device_mut(port_id) {
        device.last_action_finished();
    }
    shared.dispatcher.dispatch(Event::ActionFinished { port_id });
}

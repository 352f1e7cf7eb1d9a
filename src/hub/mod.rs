//! Hub engine.
//!
//! A [`Hub`] owns one radio link. A background task consumes the link's
//! notifications strictly in order and keeps the port table, the cached hub
//! properties and the outstanding property requests up to date; callers read
//! that state and send commands through the same link.

pub mod config;
mod dispatch;
pub mod handle;
mod pending;
pub mod ports;
pub mod variants;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::device::Device;
use crate::error::{Error, Result};
use crate::event::{Event, EventDispatcher, EventFilter, Subscription};
use crate::protocol::command::{self, Command};
use crate::protocol::{
    HubActionType, HubPropertyOperation, HubPropertyType, HubPropertyValue, MessageType,
};
use crate::transport::RadioLink;
use crate::types::{DeviceType, HubInfo, HubType};

pub use config::HubConfig;
pub use handle::DeviceRef;
pub use ports::VirtualPort;
pub use variants::{ConnectedHub, HubModel, MoveHub, TechnicMediumHub};

use pending::PendingRequests;
use ports::PortTable;

/// Lifecycle of a hub session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Link is being established.
    Connecting,
    /// Link is up, initial properties are being read.
    HandshakeInProgress,
    /// Handshake done, the hub accepts commands.
    Ready,
    /// Session is over. Terminal.
    Disconnected,
}

/// State shared between the hub handle and its dispatcher task.
pub(crate) struct Shared {
    ports: RwLock<PortTable>,
    pending: Mutex<PendingRequests>,
    info: RwLock<HubInfo>,
    dispatcher: EventDispatcher,
    state: watch::Sender<SessionState>,
    hub_type: HubType,
}

impl Shared {
    fn set_state(&self, next: SessionState) {
        self.state.send_if_modified(|state| {
            if *state == SessionState::Disconnected || *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Enters `Disconnected` once; later calls are no-ops.
    async fn close(&self) {
        let changed = self.state.send_if_modified(|state| {
            if *state == SessionState::Disconnected {
                return false;
            }
            *state = SessionState::Disconnected;
            true
        });

        self.pending.lock().await.clear();

        if changed {
            info!("hub disconnected");
            self.dispatcher.dispatch(Event::Disconnected);
        }
    }
}

/// Encodes a command and writes it to the link.
pub(crate) async fn write_command<T: RadioLink>(link: &Mutex<T>, command: &Command) -> Result<()> {
    let frame = command.encode()?;
    trace!(
        "tx {:?}: {}",
        command.message_type,
        hex::encode(frame.as_bytes())
    );
    let mut link = link.lock().await;
    link.write(frame.into_bytes()).await
}

/// A connected LPF2 hub.
pub struct Hub<T> {
    link: Arc<Mutex<T>>,
    shared: Arc<Shared>,
    config: HubConfig,
    model: HubModel,
    process_task: Option<JoinHandle<()>>,
}

impl<T: RadioLink + 'static> Hub<T> {
    /// Connects to a hub over `link` and runs the handshake.
    ///
    /// On success the session is [`SessionState::Ready`] and
    /// [`Event::Connected`] has been dispatched.
    ///
    /// # Errors
    ///
    /// Returns an error if the link fails or the handshake does not finish
    /// within [`HubConfig::connect_timeout`]. The link is disconnected
    /// before returning.
    pub async fn connect(link: T, model: HubModel, config: HubConfig) -> Result<Self> {
        let hub = Self::open(link, model, config).await?;
        hub.finish();
        Ok(hub)
    }

    /// Connects and runs the handshake without entering `Ready`.
    pub(crate) async fn open(link: T, model: HubModel, config: HubConfig) -> Result<Self> {
        let (state, _) = watch::channel(SessionState::Connecting);
        let shared = Arc::new(Shared {
            ports: RwLock::new(PortTable::new(model.port_names())),
            pending: Mutex::new(PendingRequests::default()),
            info: RwLock::new(HubInfo {
                hub_type: model.hub_type(),
                ..HubInfo::default()
            }),
            dispatcher: EventDispatcher::new(config.event_capacity),
            state,
            hub_type: model.hub_type(),
        });

        let mut hub = Self {
            link: Arc::new(Mutex::new(link)),
            shared,
            config,
            model,
            process_task: None,
        };

        let timeout = hub.config.connect_timeout;
        let result = match tokio::time::timeout(timeout, hub.handshake()).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(timeout)),
        };

        if let Err(e) = result {
            warn!("handshake with {:?} failed: {}", model, e);
            hub.shutdown().await;
            return Err(e);
        }

        Ok(hub)
    }

    async fn handshake(&mut self) -> Result<()> {
        let (frame_tx, mut frame_rx) = mpsc::channel::<Bytes>(self.config.link_buffer.max(1));

        {
            let mut link = self.link.lock().await;
            link.connect().await?;
            link.subscribe(frame_tx)?;
        }
        info!("link to {:?} established", self.model);

        let shared = Arc::clone(&self.shared);
        let link = Arc::clone(&self.link);
        let process_task = tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                dispatch::process_frame(frame, &shared, &link).await;
            }
            debug!("notification stream ended");
            shared.close().await;
        });
        self.process_task = Some(process_task);

        self.shared.set_state(SessionState::HandshakeInProgress);

        // Let the hub report its attached devices first
        tokio::time::sleep(self.config.settle_delay).await;

        self.enable_property_updates(HubPropertyType::Button).await?;
        self.initial_read(HubPropertyType::FirmwareVersion).await?;
        self.initial_read(HubPropertyType::HardwareVersion).await?;
        self.enable_property_updates(HubPropertyType::Rssi).await?;
        self.enable_property_updates(HubPropertyType::BatteryVoltage)
            .await?;
        self.initial_read(HubPropertyType::PrimaryMacAddress).await?;

        Ok(())
    }

    /// One-shot read during the handshake; a timeout leaves the cache empty.
    async fn initial_read(&self, property: HubPropertyType) -> Result<()> {
        match self.request_property(property).await {
            Ok(value) => {
                debug!("initial {:?}: {:?}", property, value);
                Ok(())
            }
            Err(Error::Timeout { timeout_ms }) => {
                warn!("no {:?} reported within {}ms", property, timeout_ms);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Enters `Ready` and announces the connection.
    pub(crate) fn finish(&self) {
        if self.state() == SessionState::Disconnected {
            return;
        }
        self.shared.set_state(SessionState::Ready);
        info!("{:?} ready", self.model);
        self.shared.dispatcher.dispatch(Event::Connected);
    }

    async fn shutdown(&mut self) {
        if let Some(task) = self.process_task.take() {
            task.abort();
        }

        {
            let mut link = self.link.lock().await;
            if let Err(e) = link.disconnect().await {
                warn!("link disconnect failed: {}", e);
            }
        }

        self.shared.close().await;
    }

    /// Disconnects from the hub.
    ///
    /// Stops the dispatcher, closes the link and dispatches
    /// [`Event::Disconnected`]. Outstanding requests fail with
    /// [`Error::NotConnected`].
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(task) = self.process_task.take() {
            task.abort();
        }

        let result = {
            let mut link = self.link.lock().await;
            link.disconnect().await
        };

        self.shared.close().await;
        result
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state() == SessionState::Disconnected {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    pub(crate) async fn send(&self, command: &Command) -> Result<()> {
        self.ensure_open()?;
        write_command(&self.link, command).await
    }

    /// Writes an arbitrary message to the hub.
    pub async fn send_raw(&self, message_type: MessageType, payload: &[u8]) -> Result<()> {
        self.send(&Command::new(message_type, Bytes::copy_from_slice(payload)))
            .await
    }

    // ==================== Hub properties ====================

    /// Requests a one-shot update of a hub property and waits for it.
    ///
    /// The response is delivered to this caller only; no generic property
    /// event is raised for it.
    ///
    /// # Errors
    ///
    /// - [`Error::RequestPending`] if a request for `property` is outstanding
    /// - [`Error::Protocol`] if the hub's answer cannot be decoded
    /// - [`Error::Timeout`] if the hub does not answer within
    ///   [`HubConfig::request_timeout`]
    /// - [`Error::NotConnected`] if the session ends while waiting
    pub async fn request_property(&self, property: HubPropertyType) -> Result<HubPropertyValue> {
        self.ensure_open()?;

        let (generation, mut receiver) = self.shared.pending.lock().await.register(property)?;

        let request = command::hub_property(property, HubPropertyOperation::RequestUpdate);
        if let Err(e) = self.send(&request).await {
            self.shared.pending.lock().await.cancel(property, generation);
            return Err(e);
        }

        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, &mut receiver).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => Err(Error::NotConnected),
            Err(_) => {
                let cancelled = self.shared.pending.lock().await.cancel(property, generation);
                if !cancelled {
                    // Resolved between the timer firing and the cancel
                    if let Ok(response) = receiver.try_recv() {
                        return response;
                    }
                }
                debug!("request for {:?} timed out", property);
                Err(Error::timeout(timeout))
            }
        }
    }

    /// Asks the hub to report changes of a property.
    pub async fn enable_property_updates(&self, property: HubPropertyType) -> Result<()> {
        self.send(&command::hub_property(
            property,
            HubPropertyOperation::EnableUpdates,
        ))
        .await
    }

    /// Stops change reports for a property.
    pub async fn disable_property_updates(&self, property: HubPropertyType) -> Result<()> {
        self.send(&command::hub_property(
            property,
            HubPropertyOperation::DisableUpdates,
        ))
        .await
    }

    /// Returns the cached hub properties.
    pub async fn info(&self) -> HubInfo {
        self.shared.info.read().await.clone()
    }

    // ==================== Ports and devices ====================

    /// Returns a snapshot of the device on a port.
    pub async fn get_device(&self, port_id: u8) -> Option<Device> {
        self.shared.ports.read().await.device(port_id).cloned()
    }

    /// Returns a snapshot of the device on a named port.
    pub async fn get_device_by_name(&self, name: &str) -> Option<Device> {
        let ports = self.shared.ports.read().await;
        let port_id = ports.id_of(name)?;
        ports.device(port_id).cloned()
    }

    /// Returns a command handle for the device on a port.
    pub async fn device(&self, port_id: u8) -> Option<DeviceRef<'_, T>> {
        let attached = self.shared.ports.read().await.device(port_id).is_some();
        attached.then(|| DeviceRef::new(self, port_id))
    }

    /// Returns a command handle for the device on a named port.
    pub async fn device_by_name(&self, name: &str) -> Option<DeviceRef<'_, T>> {
        let port_id = self.shared.ports.read().await.attached_id_of(name)?;
        Some(DeviceRef::new(self, port_id))
    }

    /// Returns the first device of a type, in port order.
    pub async fn find_first(&self, device_type: DeviceType) -> Option<Device> {
        self.shared
            .ports
            .read()
            .await
            .find_first(device_type)
            .cloned()
    }

    /// Returns every device of a type, in port order.
    pub async fn find_all(&self, device_type: DeviceType) -> Vec<Device> {
        self.shared.ports.read().await.find_all(device_type)
    }

    /// Returns the name of a port.
    pub async fn port_name(&self, port_id: u8) -> Option<String> {
        self.shared
            .ports
            .read()
            .await
            .name(port_id)
            .map(str::to_string)
    }

    /// Returns the id of a named port.
    pub async fn port_id(&self, name: &str) -> Option<u8> {
        self.shared.ports.read().await.id_of(name)
    }

    /// Returns the ids of ports with a device attached.
    pub async fn ports(&self) -> Vec<u8> {
        self.shared.ports.read().await.ports()
    }

    /// Returns all port names, including virtual ports.
    pub async fn port_names(&self) -> Vec<String> {
        self.shared.ports.read().await.names()
    }

    /// Returns the virtual port mapping for a port.
    pub async fn virtual_port(&self, port_id: u8) -> Option<VirtualPort> {
        self.shared
            .ports
            .read()
            .await
            .virtual_port(port_id)
            .cloned()
    }

    async fn resolve_attached(&self, name: &str) -> Result<u8> {
        self.shared
            .ports
            .read()
            .await
            .attached_id_of(name)
            .ok_or_else(|| Error::PortNotFound {
                port: name.to_string(),
            })
    }

    /// Asks the hub to combine two ports into a virtual port.
    ///
    /// The hub answers with an attach message that adds the virtual port
    /// (named `first+second`) to the port table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PortNotFound`] if either name has no device attached.
    pub async fn create_virtual_port(&self, first: &str, second: &str) -> Result<()> {
        let first_id = self.resolve_attached(first).await?;
        let second_id = self.resolve_attached(second).await?;
        debug!("requesting virtual port {}+{}", first, second);
        self.send(&command::virtual_port_setup(first_id, second_id))
            .await
    }

    /// Creates a virtual port and waits until the hub has attached it.
    ///
    /// Returns the id of the virtual port.
    pub async fn create_virtual_port_and_wait(
        &self,
        first: &str,
        second: &str,
        timeout: Duration,
    ) -> Result<u8> {
        let subscription = self.subscribe_filtered(EventFilter::attached(format!("{first}+{second}")));
        self.create_virtual_port(first, second).await?;

        match EventDispatcher::wait_on(subscription, timeout).await {
            Some(Event::DeviceAttached { port_id, .. }) => Ok(port_id),
            _ => Err(Error::timeout(timeout)),
        }
    }

    // ==================== Hub actions ====================

    /// Switches the hub off.
    pub async fn switch_off(&self) -> Result<()> {
        self.send(&command::hub_action(HubActionType::SwitchOffHub))
            .await
    }

    /// Asks the hub to drop the link.
    pub async fn request_disconnect(&self) -> Result<()> {
        self.send(&command::hub_action(HubActionType::Disconnect))
            .await
    }

    /// Requests port information. The answer arrives as [`Event::Raw`].
    pub async fn request_port_information(&self, port_id: u8, info_type: u8) -> Result<()> {
        self.send(&command::port_information_request(port_id, info_type))
            .await
    }

    /// Requests port mode information. The answer arrives as [`Event::Raw`].
    pub async fn request_port_mode_information(
        &self,
        port_id: u8,
        mode: u8,
        info_type: u8,
    ) -> Result<()> {
        self.send(&command::port_mode_information_request(
            port_id, mode, info_type,
        ))
        .await
    }

    // ==================== Session ====================

    /// Subscribes to all events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.shared.dispatcher.subscribe(None)
    }

    /// Subscribes to events matching a filter.
    #[must_use]
    pub fn subscribe_filtered(&self, filter: EventFilter) -> Subscription {
        self.shared.dispatcher.subscribe(Some(filter))
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Watches session state transitions.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Returns true while the link is up.
    pub async fn is_connected(&self) -> bool {
        let link = self.link.lock().await;
        link.is_connected()
    }

    /// Hub model this session was opened for.
    #[must_use]
    pub const fn model(&self) -> HubModel {
        self.model
    }

    /// Hub type used for calibration.
    #[must_use]
    pub fn hub_type(&self) -> HubType {
        self.shared.hub_type
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &HubConfig {
        &self.config
    }
}

impl<T> Drop for Hub<T> {
    fn drop(&mut self) {
        if let Some(task) = self.process_task.take() {
            task.abort();
        }
    }
}

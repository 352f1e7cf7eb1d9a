//! Event system for hub notifications.
//!
//! The hub engine turns every inbound frame into zero or more [`Event`]s and
//! broadcasts them to all subscribers in arrival order.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::trace;

use crate::device::DeviceEvent;
use crate::protocol::{ErrorCode, HubActionType, HubPropertyValue};
use crate::types::{ButtonState, DeviceType};

/// Event types that can be dispatched.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Handshake finished, the hub is ready.
    Connected,
    /// Connection lost or closed.
    Disconnected,
    /// Hub button changed state.
    ButtonStateChanged(ButtonState),
    /// Signal strength update in dBm.
    RssiChanged(i8),
    /// Battery level update in percent.
    BatteryLevelChanged(u8),
    /// Unsolicited update of any other hub property.
    PropertyChanged(HubPropertyValue),
    /// A device was attached to a port.
    DeviceAttached {
        /// Port id.
        port_id: u8,
        /// Port name, if named.
        port_name: Option<String>,
        /// Attached device type.
        device_type: DeviceType,
    },
    /// A device was removed from a port.
    DeviceDetached {
        /// Port id.
        port_id: u8,
        /// Port name, if it was named.
        port_name: Option<String>,
        /// Removed device type.
        device_type: DeviceType,
    },
    /// Telemetry decoded by a device.
    Device {
        /// Port id.
        port_id: u8,
        /// Decoded value.
        event: DeviceEvent,
    },
    /// The hub reported that a port output command finished.
    ActionFinished {
        /// Port id.
        port_id: u8,
    },
    /// The hub rejected a command.
    ProtocolError {
        /// Message type of the rejected command.
        command: u8,
        /// Error code, if known.
        code: Option<ErrorCode>,
    },
    /// The hub announced an action (switch off, disconnect, boot mode).
    HubAction(HubActionType),
    /// Frame without typed handling.
    Raw { message_type: u8, data: Vec<u8> },
}

/// Discriminant of an [`Event`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`Event::Connected`]
    Connected,
    /// [`Event::Disconnected`]
    Disconnected,
    /// [`Event::ButtonStateChanged`]
    ButtonStateChanged,
    /// [`Event::RssiChanged`]
    RssiChanged,
    /// [`Event::BatteryLevelChanged`]
    BatteryLevelChanged,
    /// [`Event::PropertyChanged`]
    PropertyChanged,
    /// [`Event::DeviceAttached`]
    DeviceAttached,
    /// [`Event::DeviceDetached`]
    DeviceDetached,
    /// [`Event::Device`]
    Device,
    /// [`Event::ActionFinished`]
    ActionFinished,
    /// [`Event::ProtocolError`]
    ProtocolError,
    /// [`Event::HubAction`]
    HubAction,
    /// [`Event::Raw`]
    Raw,
}

impl Event {
    /// Returns the event discriminant.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connected,
            Self::Disconnected => EventKind::Disconnected,
            Self::ButtonStateChanged(_) => EventKind::ButtonStateChanged,
            Self::RssiChanged(_) => EventKind::RssiChanged,
            Self::BatteryLevelChanged(_) => EventKind::BatteryLevelChanged,
            Self::PropertyChanged(_) => EventKind::PropertyChanged,
            Self::DeviceAttached { .. } => EventKind::DeviceAttached,
            Self::DeviceDetached { .. } => EventKind::DeviceDetached,
            Self::Device { .. } => EventKind::Device,
            Self::ActionFinished { .. } => EventKind::ActionFinished,
            Self::ProtocolError { .. } => EventKind::ProtocolError,
            Self::HubAction(_) => EventKind::HubAction,
            Self::Raw { .. } => EventKind::Raw,
        }
    }

    /// Returns the port this event concerns, if any.
    #[must_use]
    pub const fn port_id(&self) -> Option<u8> {
        match self {
            Self::DeviceAttached { port_id, .. }
            | Self::DeviceDetached { port_id, .. }
            | Self::Device { port_id, .. }
            | Self::ActionFinished { port_id } => Some(*port_id),
            _ => None,
        }
    }

    /// Returns the port name this event concerns, if any.
    #[must_use]
    pub fn port_name(&self) -> Option<&str> {
        match self {
            Self::DeviceAttached { port_name, .. } | Self::DeviceDetached { port_name, .. } => {
                port_name.as_deref()
            }
            _ => None,
        }
    }
}

/// Subscription filter for specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Filter by event kinds.
    pub kinds: Option<Vec<EventKind>>,
    /// Filter by port id.
    pub port_id: Option<u8>,
    /// Filter by port name.
    pub port_name: Option<String>,
}

impl EventFilter {
    /// Creates a filter for specific event kinds.
    #[must_use]
    pub const fn kinds(kinds: Vec<EventKind>) -> Self {
        Self {
            kinds: Some(kinds),
            port_id: None,
            port_name: None,
        }
    }

    /// Creates a filter for all events concerning a port.
    #[must_use]
    pub const fn port(port_id: u8) -> Self {
        Self {
            kinds: None,
            port_id: Some(port_id),
            port_name: None,
        }
    }

    /// Creates a filter for a device attaching to a named port.
    #[must_use]
    pub fn attached(port_name: impl Into<String>) -> Self {
        Self {
            kinds: Some(vec![EventKind::DeviceAttached]),
            port_id: None,
            port_name: Some(port_name.into()),
        }
    }

    /// Restricts the filter to a port.
    #[must_use]
    pub const fn with_port(mut self, port_id: u8) -> Self {
        self.port_id = Some(port_id);
        self
    }

    /// Checks if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind()) {
                return false;
            }
        }

        if let Some(port_id) = self.port_id {
            if event.port_id() != Some(port_id) {
                return false;
            }
        }

        if let Some(ref name) = self.port_name {
            if event.port_name() != Some(name.as_str()) {
                return false;
            }
        }

        true
    }
}

/// A subscription to events.
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
    filter: Option<EventFilter>,
}

impl Subscription {
    /// Receives the next matching event.
    ///
    /// Returns `None` once the dispatcher is gone. Events missed because the
    /// subscriber lagged behind are skipped.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.as_ref().is_none_or(|f| f.matches(&event)) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    trace!("Subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

struct EventDispatcherInner {
    sender: broadcast::Sender<Event>,
}

/// Dispatches events to subscribers.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Arc<EventDispatcherInner>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(EventDispatcherInner { sender }),
        }
    }

    /// Dispatches an event to all subscribers.
    pub fn dispatch(&self, event: Event) {
        // No receivers is fine
        let _ = self.inner.sender.send(event);
    }

    /// Subscribes to events with an optional filter.
    #[must_use]
    pub fn subscribe(&self, filter: Option<EventFilter>) -> Subscription {
        Subscription {
            receiver: self.inner.sender.subscribe(),
            filter,
        }
    }

    /// Waits for an event matching the filter with timeout.
    ///
    /// Returns `None` if the timeout expires or the channel is closed.
    pub async fn wait_for(
        &self,
        filter: EventFilter,
        timeout: std::time::Duration,
    ) -> Option<Event> {
        let subscription = self.subscribe(Some(filter));
        Self::wait_on(subscription, timeout).await
    }

    /// Waits on an existing subscription with timeout.
    ///
    /// Subscribe before sending the request that triggers the event, then
    /// wait here, so the event cannot be missed.
    pub async fn wait_on(
        mut subscription: Subscription,
        timeout: std::time::Duration,
    ) -> Option<Event> {
        tokio::select! {
            biased;
            result = subscription.recv() => result,
            () = tokio::time::sleep(timeout) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_event_dispatch() {
        let dispatcher = EventDispatcher::new(16);
        let mut sub = dispatcher.subscribe(None);

        dispatcher.dispatch(Event::Connected);

        let event = tokio::time::timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap();

        assert!(matches!(event, Some(Event::Connected)));
    }

    #[tokio::test]
    async fn test_filtered_subscription_skips_other_events() {
        let dispatcher = EventDispatcher::new(16);
        let mut sub = dispatcher.subscribe(Some(EventFilter::port(3)));

        dispatcher.dispatch(Event::Connected);
        dispatcher.dispatch(Event::ActionFinished { port_id: 1 });
        dispatcher.dispatch(Event::ActionFinished { port_id: 3 });

        let event = tokio::time::timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap();
        assert_eq!(event, Some(Event::ActionFinished { port_id: 3 }));
    }

    #[test]
    fn test_event_filter() {
        let filter = EventFilter::kinds(vec![EventKind::RssiChanged, EventKind::BatteryLevelChanged]);

        assert!(filter.matches(&Event::RssiChanged(-60)));
        assert!(filter.matches(&Event::BatteryLevelChanged(80)));
        assert!(!filter.matches(&Event::Connected));
    }

    #[test]
    fn test_attached_filter() {
        let filter = EventFilter::attached("A+B");
        let attached = |name: &str| Event::DeviceAttached {
            port_id: 16,
            port_name: Some(name.into()),
            device_type: DeviceType::MoveHubMediumLinearMotor,
        };

        assert!(filter.matches(&attached("A+B")));
        assert!(!filter.matches(&attached("C+D")));
        assert!(!filter.matches(&Event::DeviceDetached {
            port_id: 16,
            port_name: Some("A+B".into()),
            device_type: DeviceType::MoveHubMediumLinearMotor,
        }));
    }

    #[tokio::test]
    async fn test_wait_for_timeout() {
        let dispatcher = EventDispatcher::new(16);
        let result = dispatcher
            .wait_for(EventFilter::kinds(vec![EventKind::Connected]), Duration::from_millis(10))
            .await;
        assert!(result.is_none());
    }
}

//! Hub session configuration.

use std::time::Duration;

/// Default delay between subscribing to the link and the first request.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Default timeout for one-shot property requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on the whole connect handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Default capacity of the notification channel fed by the link.
pub const DEFAULT_LINK_BUFFER: usize = 256;

/// Configuration for a hub session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Delay after subscribing before the handshake starts, letting the hub
    /// report its attached devices.
    pub settle_delay: Duration,
    /// Timeout for one-shot property requests.
    pub request_timeout: Duration,
    /// Bound on the whole connect handshake.
    pub connect_timeout: Duration,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Capacity of the notification channel fed by the link.
    pub link_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            link_buffer: DEFAULT_LINK_BUFFER,
        }
    }
}

impl HubConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the settle delay.
    #[must_use]
    pub const fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the property request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the event channel capacity.
    #[must_use]
    pub const fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Sets the link notification buffer.
    #[must_use]
    pub const fn link_buffer(mut self, capacity: usize) -> Self {
        self.link_buffer = capacity;
        self
    }
}

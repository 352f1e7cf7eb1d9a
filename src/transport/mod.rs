//! Radio link abstraction for LPF2 communication.
//!
//! A hub exposes one GATT characteristic that carries every frame in both
//! directions. The hub engine only needs to write to it and to receive its
//! notifications in order; scanning, pairing and GATT discovery belong to
//! the link implementation.

pub mod channel;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::error::Result;

/// Trait for radio link implementations.
pub trait RadioLink: Send + Sync {
    /// Connects to the hub.
    fn connect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Disconnects from the hub.
    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Writes one frame to the hub characteristic.
    fn write(&mut self, data: Bytes) -> BoxFuture<'_, Result<()>>;

    /// Registers the receiver of characteristic notifications.
    ///
    /// Each notification must be delivered exactly once and in order.
    /// Dropping the sender signals that the link is gone.
    fn subscribe(&mut self, sender: mpsc::Sender<Bytes>) -> Result<()>;

    /// Returns true if connected.
    fn is_connected(&self) -> bool;
}

pub use channel::{ChannelLink, LinkPeer};

//! In-memory radio link.
//!
//! [`ChannelLink`] implements [`RadioLink`] over tokio channels. The paired
//! [`LinkPeer`] plays the hub side: it pushes notifications and reads the
//! frames the engine writes. Use it in tests, or to bridge a BLE stack that
//! delivers notifications through callbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::transport::RadioLink;

/// Default capacity of the write channel.
pub const DEFAULT_WRITE_BUFFER: usize = 256;

struct Shared {
    subscriber: Mutex<Option<mpsc::Sender<Bytes>>>,
    connected: AtomicBool,
}

impl Shared {
    fn subscriber(&self) -> MutexGuard<'_, Option<mpsc::Sender<Bytes>>> {
        self.subscriber
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Engine side of an in-memory link.
pub struct ChannelLink {
    shared: Arc<Shared>,
    writes: mpsc::Sender<Bytes>,
}

/// Hub side of an in-memory link.
pub struct LinkPeer {
    shared: Arc<Shared>,
    writes: mpsc::Receiver<Bytes>,
}

impl ChannelLink {
    /// Creates a connected pair with the given write buffer.
    #[must_use]
    pub fn new(write_buffer: usize) -> (Self, LinkPeer) {
        let shared = Arc::new(Shared {
            subscriber: Mutex::new(None),
            connected: AtomicBool::new(false),
        });
        let (tx, rx) = mpsc::channel(write_buffer.max(1));
        (
            Self {
                shared: Arc::clone(&shared),
                writes: tx,
            },
            LinkPeer { shared, writes: rx },
        )
    }

    /// Creates a pair with [`DEFAULT_WRITE_BUFFER`].
    #[must_use]
    pub fn pair() -> (Self, LinkPeer) {
        Self::new(DEFAULT_WRITE_BUFFER)
    }
}

impl RadioLink for ChannelLink {
    fn connect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if !self.shared.connected.swap(true, Ordering::SeqCst) {
                info!("channel link connected");
            }
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if self.shared.connected.swap(false, Ordering::SeqCst) {
                info!("channel link disconnected");
            }
            self.shared.subscriber().take();
            Ok(())
        })
    }

    fn write(&mut self, data: Bytes) -> BoxFuture<'_, Result<()>> {
        let writes = self.writes.clone();
        let connected = self.shared.connected.load(Ordering::SeqCst);
        Box::pin(async move {
            if !connected {
                return Err(Error::NotConnected);
            }
            trace!("link write: {}", hex::encode(&data));
            writes.send(data).await.map_err(|_| Error::Transport {
                reason: "peer closed".into(),
            })
        })
    }

    fn subscribe(&mut self, sender: mpsc::Sender<Bytes>) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        *self.shared.subscriber() = Some(sender);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }
}

impl LinkPeer {
    /// Delivers a notification to the subscribed engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if nobody subscribed, or
    /// [`Error::ChannelClosed`] if the engine stopped listening.
    pub async fn notify(&self, frame: impl Into<Bytes>) -> Result<()> {
        let sender = self.shared.subscriber().clone().ok_or(Error::NotConnected)?;
        let frame = frame.into();
        trace!("link notify: {}", hex::encode(&frame));
        sender.send(frame).await.map_err(|_| Error::ChannelClosed)
    }

    /// Receives the next frame written by the engine.
    ///
    /// Returns `None` once the engine side is dropped.
    pub async fn next_write(&mut self) -> Option<Bytes> {
        self.writes.recv().await
    }

    /// Returns an already written frame without waiting.
    pub fn try_next_write(&mut self) -> Option<Bytes> {
        self.writes.try_recv().ok()
    }

    /// Simulates link loss: the engine sees its notification stream end.
    pub fn drop_link(&self) {
        debug!("channel link dropped by peer");
        self.shared.connected.store(false, Ordering::SeqCst);
        self.shared.subscriber().take();
    }

    /// Returns true if the engine side is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Returns true if an engine has subscribed to notifications.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.shared.subscriber().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_requires_connect() {
        let (mut link, _peer) = ChannelLink::pair();
        let result = link.write(Bytes::from_static(&[0x03, 0x00, 0x01])).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_write_reaches_peer() {
        let (mut link, mut peer) = ChannelLink::pair();
        link.connect().await.unwrap();
        link.write(Bytes::from_static(&[0x05, 0x00, 0x01, 0x03, 0x05]))
            .await
            .unwrap();

        let written = peer.next_write().await.unwrap();
        assert_eq!(written.as_ref(), &[0x05, 0x00, 0x01, 0x03, 0x05]);
        assert!(peer.try_next_write().is_none());
    }

    #[tokio::test]
    async fn test_notify_in_order() {
        let (mut link, peer) = ChannelLink::pair();
        link.connect().await.unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        link.subscribe(tx).unwrap();
        assert!(peer.is_subscribed());

        peer.notify(vec![0x01]).await.unwrap();
        peer.notify(vec![0x02]).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().as_ref(), &[0x01]);
        assert_eq!(rx.recv().await.unwrap().as_ref(), &[0x02]);
    }

    #[tokio::test]
    async fn test_drop_link_ends_stream() {
        let (mut link, peer) = ChannelLink::pair();
        link.connect().await.unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        link.subscribe(tx).unwrap();

        peer.drop_link();

        assert!(rx.recv().await.is_none());
        assert!(!link.is_connected());
        assert!(matches!(peer.notify(vec![0x01]).await, Err(Error::NotConnected)));
    }
}

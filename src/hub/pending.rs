//! Outstanding one-shot property requests.
//!
//! At most one request per property type is in flight. A slot is removed
//! exactly once, either by [`PendingRequests::resolve`] when a response for
//! its property arrives (decoded or not) or by [`PendingRequests::cancel`] when the waiter gives up. Both
//! run under the same lock, so a response racing a timeout is either
//! delivered or cancelled, never both.

use std::collections::HashMap;

use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::protocol::{HubPropertyType, HubPropertyValue};

/// Outcome delivered to a waiter: the decoded value or the decode error.
pub(crate) type Response = Result<HubPropertyValue>;

struct Slot {
    generation: u64,
    sender: oneshot::Sender<Response>,
}

/// Table of outstanding property requests.
#[derive(Default)]
pub(crate) struct PendingRequests {
    slots: HashMap<HubPropertyType, Slot>,
    next_generation: u64,
}

impl PendingRequests {
    /// Registers a request for `property`.
    ///
    /// Returns the slot generation and the receiver for the response.
    pub(crate) fn register(
        &mut self,
        property: HubPropertyType,
    ) -> Result<(u64, oneshot::Receiver<Response>)> {
        if self.slots.contains_key(&property) {
            return Err(Error::RequestPending { property });
        }

        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);

        let (sender, receiver) = oneshot::channel();
        self.slots.insert(property, Slot { generation, sender });
        Ok((generation, receiver))
    }

    /// Delivers a response to the waiter for `property`.
    ///
    /// Returns the response back if nobody was waiting for it.
    pub(crate) fn resolve(
        &mut self,
        property: HubPropertyType,
        response: Response,
    ) -> std::result::Result<(), Response> {
        match self.slots.remove(&property) {
            Some(slot) => {
                // A waiter that already went away is not an error
                let _ = slot.sender.send(response);
                Ok(())
            }
            None => Err(response),
        }
    }

    /// Removes the slot for `property` if it still belongs to `generation`.
    ///
    /// Returns false if the slot was already resolved.
    pub(crate) fn cancel(&mut self, property: HubPropertyType, generation: u64) -> bool {
        match self.slots.get(&property) {
            Some(slot) if slot.generation == generation => {
                self.slots.remove(&property);
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    fn is_pending(&self, property: HubPropertyType) -> bool {
        self.slots.contains_key(&property)
    }

    /// Drops every outstanding request; waiters see their channel close.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut pending = PendingRequests::default();
        let (_, mut rx) = pending.register(HubPropertyType::Rssi).unwrap();
        assert!(pending.is_pending(HubPropertyType::Rssi));

        assert!(
            pending
                .resolve(HubPropertyType::Rssi, Ok(HubPropertyValue::Rssi(-50)))
                .is_ok()
        );
        assert!(!pending.is_pending(HubPropertyType::Rssi));
        assert_eq!(rx.try_recv().unwrap().unwrap(), HubPropertyValue::Rssi(-50));
    }

    #[test]
    fn test_second_request_rejected() {
        let mut pending = PendingRequests::default();
        let _first = pending.register(HubPropertyType::FirmwareVersion).unwrap();
        let second = pending.register(HubPropertyType::FirmwareVersion);
        assert!(matches!(
            second,
            Err(Error::RequestPending {
                property: HubPropertyType::FirmwareVersion
            })
        ));
        // Other properties are independent
        assert!(pending.register(HubPropertyType::HardwareVersion).is_ok());
    }

    #[test]
    fn test_unclaimed_value_returned() {
        let mut pending = PendingRequests::default();
        let unclaimed = pending.resolve(
            HubPropertyType::BatteryVoltage,
            Ok(HubPropertyValue::BatteryVoltage(90)),
        );
        assert!(matches!(
            unclaimed,
            Err(Ok(HubPropertyValue::BatteryVoltage(90)))
        ));
    }

    #[test]
    fn test_decode_error_reaches_waiter() {
        let mut pending = PendingRequests::default();
        let (_, mut rx) = pending.register(HubPropertyType::Button).unwrap();

        let error = Error::Protocol {
            message: "unknown button state 3".into(),
        };
        assert!(pending.resolve(HubPropertyType::Button, Err(error)).is_ok());
        assert!(!pending.is_pending(HubPropertyType::Button));
        assert!(matches!(rx.try_recv().unwrap(), Err(Error::Protocol { .. })));
    }

    #[test]
    fn test_cancel_checks_generation() {
        let mut pending = PendingRequests::default();
        let (old, _rx) = pending.register(HubPropertyType::Rssi).unwrap();
        assert!(pending.cancel(HubPropertyType::Rssi, old));

        let (new, _rx) = pending.register(HubPropertyType::Rssi).unwrap();
        assert_ne!(old, new);
        assert!(!pending.cancel(HubPropertyType::Rssi, old));
        assert!(pending.is_pending(HubPropertyType::Rssi));
    }

    #[test]
    fn test_cancel_after_resolve_keeps_value() {
        let mut pending = PendingRequests::default();
        let (generation, mut rx) = pending.register(HubPropertyType::Button).unwrap();
        let value = HubPropertyValue::Button(crate::types::ButtonState::Pressed);
        assert!(pending.resolve(HubPropertyType::Button, Ok(value)).is_ok());

        assert!(!pending.cancel(HubPropertyType::Button, generation));
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_clear_closes_waiters() {
        let mut pending = PendingRequests::default();
        let (_, mut rx) = pending.register(HubPropertyType::Rssi).unwrap();
        pending.clear();
        assert!(matches!(
            rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }
}

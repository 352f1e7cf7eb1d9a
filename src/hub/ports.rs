//! Port table: names, attached devices and virtual ports.

use std::collections::HashMap;

use crate::device::Device;
use crate::types::DeviceType;

/// Number of addressable ports; every port id byte is in range.
pub const PORT_COUNT: usize = 256;

/// A port combining two physical ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualPort {
    /// First constituent port.
    pub first: u8,
    /// Second constituent port.
    pub second: u8,
    /// Name, e.g. `A+B`.
    pub name: String,
}

#[derive(Debug, Clone, Default)]
struct PortSlot {
    name: Option<String>,
    device: Option<Device>,
}

/// Port slots indexed by port id.
#[derive(Debug, Clone)]
pub(crate) struct PortTable {
    slots: Vec<PortSlot>,
    virtual_ports: HashMap<u8, VirtualPort>,
}

impl PortTable {
    /// Creates a table with pre-assigned port names.
    pub(crate) fn new(names: &[(u8, &str)]) -> Self {
        let mut slots = vec![PortSlot::default(); PORT_COUNT];
        for &(id, name) in names {
            slots[usize::from(id)].name = Some(name.to_string());
        }
        Self {
            slots,
            virtual_ports: HashMap::new(),
        }
    }

    fn slot(&self, port_id: u8) -> &PortSlot {
        &self.slots[usize::from(port_id)]
    }

    fn slot_mut(&mut self, port_id: u8) -> &mut PortSlot {
        &mut self.slots[usize::from(port_id)]
    }

    pub(crate) fn name(&self, port_id: u8) -> Option<&str> {
        self.slot(port_id).name.as_deref()
    }

    pub(crate) fn set_name(&mut self, port_id: u8, name: Option<String>) {
        self.slot_mut(port_id).name = name;
    }

    /// Returns the id of the named port, whether or not a device is attached.
    pub(crate) fn id_of(&self, name: &str) -> Option<u8> {
        (0..=u8::MAX).find(|&id| self.name(id) == Some(name))
    }

    /// Returns the id of the named port only if a device is attached.
    pub(crate) fn attached_id_of(&self, name: &str) -> Option<u8> {
        self.id_of(name).filter(|&id| self.device(id).is_some())
    }

    pub(crate) fn device(&self, port_id: u8) -> Option<&Device> {
        self.slot(port_id).device.as_ref()
    }

    pub(crate) fn device_mut(&mut self, port_id: u8) -> Option<&mut Device> {
        self.slot_mut(port_id).device.as_mut()
    }

    /// Stores a device in its port slot, returning the one it replaced.
    pub(crate) fn insert(&mut self, device: Device) -> Option<Device> {
        self.slot_mut(device.port_id()).device.replace(device)
    }

    pub(crate) fn remove(&mut self, port_id: u8) -> Option<Device> {
        self.slot_mut(port_id).device.take()
    }

    /// Devices in port order.
    pub(crate) fn devices(&self) -> impl Iterator<Item = &Device> {
        self.slots.iter().filter_map(|slot| slot.device.as_ref())
    }

    pub(crate) fn find_first(&self, device_type: DeviceType) -> Option<&Device> {
        self.devices().find(|d| d.device_type() == device_type)
    }

    pub(crate) fn find_all(&self, device_type: DeviceType) -> Vec<Device> {
        self.devices()
            .filter(|d| d.device_type() == device_type)
            .cloned()
            .collect()
    }

    /// Ids of ports with a device attached.
    pub(crate) fn ports(&self) -> Vec<u8> {
        self.devices().map(Device::port_id).collect()
    }

    /// Names of all named ports, including virtual ones.
    pub(crate) fn names(&self) -> Vec<String> {
        self.slots.iter().filter_map(|slot| slot.name.clone()).collect()
    }

    pub(crate) fn add_virtual(&mut self, port_id: u8, port: VirtualPort) {
        self.set_name(port_id, Some(port.name.clone()));
        self.virtual_ports.insert(port_id, port);
    }

    /// Removes a virtual port mapping and clears its name.
    pub(crate) fn remove_virtual(&mut self, port_id: u8) -> Option<VirtualPort> {
        let port = self.virtual_ports.remove(&port_id)?;
        self.set_name(port_id, None);
        Some(port)
    }

    pub(crate) fn virtual_port(&self, port_id: u8) -> Option<&VirtualPort> {
        self.virtual_ports.get(&port_id)
    }

    pub(crate) fn is_virtual(&self, port_id: u8) -> bool {
        self.virtual_ports.contains_key(&port_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device;
    use crate::types::HubType;

    fn table() -> PortTable {
        PortTable::new(&[(0, "A"), (1, "B"), (50, "HUB_LED")])
    }

    #[test]
    fn test_names_independent_of_devices() {
        let table = table();
        assert_eq!(table.name(0), Some("A"));
        assert_eq!(table.id_of("B"), Some(1));
        assert_eq!(table.attached_id_of("B"), None);
        assert_eq!(table.name(200), None);
        assert!(table.ports().is_empty());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut table = table();
        let motor = device::create(39, HubType::MoveHub, 1, Some("B".into())).unwrap();
        assert!(table.insert(motor).is_none());

        assert_eq!(table.attached_id_of("B"), Some(1));
        assert_eq!(table.ports(), vec![1]);
        assert!(table.find_first(DeviceType::MoveHubMediumLinearMotor).is_some());

        let removed = table.remove(1).unwrap();
        assert_eq!(removed.port_id(), 1);
        assert!(table.device(1).is_none());
        assert_eq!(table.name(1), Some("B"));
    }

    #[test]
    fn test_virtual_ports() {
        let mut table = table();
        table.add_virtual(
            16,
            VirtualPort {
                first: 0,
                second: 1,
                name: "A+B".into(),
            },
        );
        assert_eq!(table.id_of("A+B"), Some(16));
        assert!(table.is_virtual(16));
        assert!(table.names().contains(&"A+B".to_string()));

        let port = table.remove_virtual(16).unwrap();
        assert_eq!((port.first, port.second), (0, 1));
        assert_eq!(table.name(16), None);
        assert!(table.remove_virtual(16).is_none());
    }
}

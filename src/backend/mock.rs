//! Scripted backend for tests.  Records every acquire and release in a
//! shared [`EventLog`].
use super::{Context, Device, DeviceDescriptor, DeviceId, Handle};
use crate::error::{DeviceAccess, SerializableUsbError};
use crate::Error;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    ContextOpen,
    ContextClose,
    HandleOpen(DeviceId),
    HandleClose(DeviceId),
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    fn push(&self, event: Event) {
        self.0.lock().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.0.lock().iter().filter(|e| pred(*e)).count()
    }
}

pub fn usb_error(message: &str) -> Error {
    Error::Usb(SerializableUsbError::UsbError {
        message: message.to_string(),
    })
}

pub fn busy() -> Error {
    Error::DeviceAccess {
        kind: DeviceAccess::Busy,
    }
}

/// How a single mock device behaves
#[derive(Debug, Clone)]
pub struct MockDeviceSpec {
    pub id: DeviceId,
    pub descriptor: Result<DeviceDescriptor, Error>,
    pub open: Result<(), Error>,
    pub strings: HashMap<u8, Result<String, Error>>,
}

impl MockDeviceSpec {
    /// A device whose serial number string is at index 3
    pub fn with_serial(address: u8, serial: &str) -> Self {
        let mut strings = HashMap::new();
        strings.insert(3, Ok(serial.to_string()));
        Self {
            id: DeviceId::new(1, address),
            descriptor: Ok(DeviceDescriptor {
                vendor_id: 0x1209,
                product_id: 0x0001,
                serial_number_index: Some(3),
            }),
            open: Ok(()),
            strings,
        }
    }

    pub fn ids(mut self, vendor_id: u16, product_id: u16) -> Self {
        if let Ok(desc) = self.descriptor.as_mut() {
            desc.vendor_id = vendor_id;
            desc.product_id = product_id;
        }
        self
    }

    pub fn descriptor_fails(mut self, error: Error) -> Self {
        self.descriptor = Err(error);
        self
    }

    pub fn open_fails(mut self, error: Error) -> Self {
        self.open = Err(error);
        self
    }

    pub fn serial_fails(mut self, error: Error) -> Self {
        self.strings.insert(3, Err(error));
        self
    }

    pub fn no_serial_index(mut self) -> Self {
        if let Ok(desc) = self.descriptor.as_mut() {
            desc.serial_number_index = None;
        }
        self
    }
}

#[derive(Debug)]
pub struct MockContext {
    devices: Result<Vec<MockDeviceSpec>, Error>,
    log: EventLog,
}

impl MockContext {
    pub fn new(devices: Vec<MockDeviceSpec>) -> (Self, EventLog) {
        Self::with_device_list(Ok(devices))
    }

    pub fn with_device_list(devices: Result<Vec<MockDeviceSpec>, Error>) -> (Self, EventLog) {
        let log = EventLog::default();
        log.push(Event::ContextOpen);
        (
            Self {
                devices,
                log: log.clone(),
            },
            log,
        )
    }
}

impl Context for MockContext {
    type Device = MockDevice;

    fn devices(&self) -> Result<Vec<Self::Device>, Error> {
        let specs = self.devices.clone()?;
        Ok(specs
            .into_iter()
            .map(|spec| MockDevice {
                spec,
                log: self.log.clone(),
            })
            .collect())
    }
}

impl Drop for MockContext {
    fn drop(&mut self) {
        self.log.push(Event::ContextClose);
    }
}

#[derive(Debug)]
pub struct MockDevice {
    spec: MockDeviceSpec,
    log: EventLog,
}

impl Device for MockDevice {
    type Handle = MockHandle;

    fn id(&self) -> DeviceId {
        self.spec.id
    }

    fn descriptor(&self) -> Result<DeviceDescriptor, Error> {
        self.spec.descriptor.clone()
    }

    fn open(&self) -> Result<Self::Handle, Error> {
        self.spec.open.clone()?;
        self.log.push(Event::HandleOpen(self.spec.id));
        Ok(MockHandle {
            id: self.spec.id,
            strings: self.spec.strings.clone(),
            log: self.log.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MockHandle {
    id: DeviceId,
    strings: HashMap<u8, Result<String, Error>>,
    log: EventLog,
}

impl Handle for MockHandle {
    fn string_descriptor_ascii(&self, index: u8) -> Result<String, Error> {
        match self.strings.get(&index) {
            Some(result) => result.clone(),
            None => Err(usb_error("Invalid parameter")),
        }
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.log.push(Event::HandleClose(self.id));
    }
}

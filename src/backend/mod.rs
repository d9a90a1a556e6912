//! The backend module abstracts the USB library the [`crate::Enumerator`]
//! drives.
//!
//! [`usb`] provides the libusb implementation.  The traits allow the
//! backend to be mocked out for testing.
//!
//! Releasing a context or a handle is done by dropping it.  Implementations
//! must not rely on anything other than Rust ownership for this: the
//! [`crate::Enumerator`] guarantees handles are dropped before the context
//! they were derived from.

#[cfg(test)]
pub(crate) mod mock;
pub mod usb;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Error;

/// The root handle to the USB subsystem
pub trait Context: fmt::Debug {
    type Device: Device;

    /// Returns the devices currently attached, in the order the underlying
    /// library provides them
    fn devices(&self) -> Result<Vec<Self::Device>, Error>;
}

/// An enumerated, unopened device
pub trait Device: fmt::Debug {
    type Handle: Handle;

    /// Identifies the device without needing to open it
    fn id(&self) -> DeviceId;

    /// Reads the device descriptor
    fn descriptor(&self) -> Result<DeviceDescriptor, Error>;

    /// Opens a handle to the device.  The handle is closed when dropped.
    fn open(&self) -> Result<Self::Handle, Error>;
}

/// An open connection to a device
pub trait Handle: fmt::Debug {
    /// Reads the string descriptor at `index` as ASCII
    fn string_descriptor_ascii(&self, index: u8) -> Result<String, Error>;
}

/// Where a device lives on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId {
    pub bus_number: u8,
    pub address: u8,
}

impl DeviceId {
    pub fn new(bus_number: u8, address: u8) -> Self {
        Self {
            bus_number,
            address,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}-{:03}", self.bus_number, self.address)
    }
}

/// The parts of the USB device descriptor this crate uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Index of the serial number string, None if the device declares none
    pub serial_number_index: Option<u8>,
}

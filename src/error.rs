//! Error objects for the usb-sn crate
use crate::backend::DeviceId;
use libc::{EACCES, EBUSY, EINVAL, EIO, ENOENT, ENODEV};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for the usb-sn crate
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// Errors accessing the USB subsystem
    /// Note that permission problems are explicitly handled in the DeviceAccess
    #[error("USB error: {0}")]
    Usb(SerializableUsbError),

    /// The libusb context could not be created
    #[error("USB context unavailable: {message}")]
    ContextUnavailable { message: String },

    /// DeviceAccess holds a variety errors relating to accessing a device
    #[error("{kind}")]
    DeviceAccess { kind: DeviceAccess },

    /// The device descriptor has no serial number string index
    #[error("Device does not declare a serial number string")]
    NoStringIndex,

    /// A report could not be written out
    #[error("Failed to serialize report: {message}")]
    Serialize { message: String },

    /// Invalid arguments passed to the usb-sn library
    #[error("usb-sn called with invalid arguments: {message}")]
    Args { message: String },
}

/// Used to differentiate between different types of problems accessing a
/// USB device
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum DeviceAccess {
    #[error("Device has been disconnected")]
    NoDevice,

    #[error("Device is busy")]
    Busy,

    #[error("Hit USB permissions error while attempting to access device.  Are you sure you have suitable permissions?  You may need to reconfigure udev rules in /etc/udev/rules.d/.")]
    Permission,
}

#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum SerializableUsbError {
    #[error("{message}")]
    UsbError { message: String },
}

impl Error {
    pub fn to_errno(&self) -> i32 {
        match self {
            Error::Usb { .. } => EIO,
            Error::ContextUnavailable { .. } => EIO,
            Error::DeviceAccess { kind } => match kind {
                DeviceAccess::NoDevice => ENODEV,
                DeviceAccess::Busy => EBUSY,
                DeviceAccess::Permission => EACCES,
            },
            Error::NoStringIndex => ENOENT,
            Error::Serialize { .. } => EIO,
            Error::Args { .. } => EINVAL,
        }
    }
}

// Map rusb::Error to Error
impl From<rusb::Error> for Error {
    fn from(err: rusb::Error) -> Self {
        match err {
            rusb::Error::Access => Self::DeviceAccess {
                kind: DeviceAccess::Permission,
            },
            rusb::Error::NoDevice => Self::DeviceAccess {
                kind: DeviceAccess::NoDevice,
            },
            rusb::Error::Busy => Self::DeviceAccess {
                kind: DeviceAccess::Busy,
            },
            _ => Self::Usb(SerializableUsbError::UsbError {
                message: err.to_string(),
            }),
        }
    }
}

/// The step of the per-device sequence at which a [`DeviceError`] occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading the device descriptor
    Descriptor,
    /// Opening a handle to the device
    Open,
    /// Reading the serial number string descriptor
    SerialNumber,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Descriptor => "reading device descriptor",
            Stage::Open => "opening device",
            Stage::SerialNumber => "reading serial number",
        };
        write!(f, "{s}")
    }
}

/// A failure processing a single device.  Enumeration continues with the
/// next device after one of these.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[error("Device {device} failed {stage}: {cause}")]
pub struct DeviceError {
    pub device: DeviceId,
    pub stage: Stage,
    pub cause: Error,
}

impl DeviceError {
    pub fn new(device: DeviceId, stage: Stage, cause: Error) -> Self {
        Self {
            device,
            stage,
            cause,
        }
    }
}

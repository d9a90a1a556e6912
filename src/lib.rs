//! # usb-sn
//!
//! This crate enumerates the USB devices attached to the host via libusb
//! (using [`rusb`]), opens each one and reads its serial number string
//! descriptor.
//!
//! ## Overview
//!
//! - [`Enumerator`] drives a single pass over the device list and reports
//!   each device's [`Outcome`] to a [`Sink`]
//! - [`EnumeratorBuilder`] acquires the libusb context and configures the
//!   enumerator
//! - The [`backend`] traits abstract libusb, so the enumerator can be driven
//!   by a mock in tests
//!
//! ```rust,no_run
//! use usb_sn::{EnumeratorBuilder, Error, LogSink};
//!
//! fn main() -> Result<(), Error> {
//!     env_logger::init();
//!
//!     let mut enumerator = EnumeratorBuilder::new().build()?;
//!     enumerator.run(&mut LogSink)?;
//!
//!     // Handles and the libusb context are released when enumerator goes
//!     // out of scope
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! A failure to create the libusb context or to list devices is returned as
//! an [`Error`].  A failure with an individual device becomes a
//! [`DeviceError`] naming the device and the [`Stage`] that failed, and
//! enumeration continues with the next device.
//!
//! In lenient mode ([`EnumeratorBuilder::lenient`]) per-device failures are
//! instead reported as an empty serial number, and a device list failure as
//! no devices.
//!
//! ## Resource Release
//!
//! Every handle opened during [`Enumerator::run`] stays open until the
//! [`Enumerator`] is dropped.  They are then released in reverse order of
//! acquisition, followed by the libusb context.
//!
//! ## Logging
//!
//! The library uses the `log` crate.  Serial numbers are logged at info
//! level by [`LogSink`], device failures at warn, and backend calls at
//! trace.  Use `env_logger` and the `RUST_LOG` environment variable to
//! control output.

pub mod backend;
pub mod enumerator;
pub mod error;

pub use crate::backend::usb::{UsbContext, UsbContextConfig, UsbDevice, UsbHandle};
pub use crate::backend::{Context, Device, DeviceDescriptor, DeviceId, Handle};
pub use crate::enumerator::{
    Enumerator, EnumeratorBuilder, EnumeratorConfig, Filter, LogSink, Outcome, Report,
    SerialRecord, Sink,
};
pub use crate::error::{DeviceAccess, DeviceError, Error, Stage};

/// Use to create an Enumerator over libusb
pub type UsbEnumerator = Enumerator<UsbContext>;

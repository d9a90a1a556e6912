//! The [`Enumerator`] walks every device a [`Context`] reports, reads each
//! one's serial number and hands the result to a [`Sink`].
//!
//! Every handle opened during a run is kept open until the Enumerator is
//! dropped.  On drop the handles are released in reverse order of
//! acquisition, and the context is released last.
use crate::backend::usb::{UsbContext, UsbContextConfig};
use crate::backend::{Context, Device, DeviceDescriptor, DeviceId, Handle};
use crate::error::{DeviceError, Stage};
use crate::Error;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};

type HandleOf<C> = <<C as Context>::Device as Device>::Handle;

/// The serial number read from one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialRecord {
    pub device: DeviceId,
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial_number: String,
}

/// The result of processing one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Found(SerialRecord),
    Failed(DeviceError),
}

/// Every [`Outcome`] from a run, in the order the devices were enumerated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
}

impl Report {
    pub fn found(&self) -> impl Iterator<Item = &SerialRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Found(record) => Some(record),
            Outcome::Failed(_) => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = &DeviceError> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Found(_) => None,
            Outcome::Failed(error) => Some(error),
        })
    }
}

/// Receives each [`Outcome`] as soon as it is known
pub trait Sink {
    fn found(&mut self, record: &SerialRecord);
    fn failed(&mut self, error: &DeviceError);
}

/// Writes outcomes to the `log` crate
#[derive(Debug, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn found(&mut self, record: &SerialRecord) {
        info!("Found S/N: {}", record.serial_number);
    }

    fn failed(&mut self, error: &DeviceError) {
        warn!("{error}");
    }
}

/// Restricts enumeration to devices with matching IDs.  Unset fields match
/// anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filter {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
}

impl Filter {
    /// True if either ID is set
    pub fn is_active(&self) -> bool {
        self.vendor_id.is_some() || self.product_id.is_some()
    }

    pub fn matches(&self, descriptor: &DeviceDescriptor) -> bool {
        self.vendor_id.map_or(true, |vid| vid == descriptor.vendor_id)
            && self.product_id.map_or(true, |pid| pid == descriptor.product_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumeratorConfig {
    pub filter: Filter,

    /// When set, per-device failures are reported as an empty serial number
    /// and a device list failure as no devices, rather than as errors.
    pub lenient: bool,
}

/// Reads the serial number of every attached USB device.
///
/// Create using [`EnumeratorBuilder`].
///
/// ```rust,no_run
/// use usb_sn::{EnumeratorBuilder, LogSink};
///
/// let mut enumerator = EnumeratorBuilder::new().build().unwrap();
/// let report = enumerator.run(&mut LogSink).unwrap();
/// println!("{} serial number(s) read", report.found().count());
/// ```
#[derive(Debug)]
pub struct Enumerator<C: Context> {
    // Declared before context so that they drop first
    handles: Vec<HandleOf<C>>,
    context: C,
    config: EnumeratorConfig,
}

impl<C: Context> Enumerator<C> {
    pub fn new(context: C, config: EnumeratorConfig) -> Self {
        trace!("Enumerator::new config {config:?}");
        Self {
            handles: Vec::new(),
            context,
            config,
        }
    }

    /// Number of device handles currently held open
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    /// Enumerates the devices once, reporting each to `sink`.
    ///
    /// # Returns
    /// * `Ok(Report)` - Every device's outcome, in enumeration order.
    ///   Per-device failures are in here, they do not abort the run.
    /// * `Err(Error)` - The device list could not be retrieved (only when not
    ///   lenient)
    pub fn run<S: Sink>(&mut self, sink: &mut S) -> Result<Report, Error> {
        trace!("Enumerator::run");

        let devices = match self.context.devices() {
            Ok(devices) => devices,
            Err(e) if self.config.lenient => {
                warn!("Failed to retrieve USB device list: {e}");
                Vec::new()
            }
            Err(e) => {
                debug!("Failed to retrieve USB device list: {e}");
                return Err(e);
            }
        };

        let mut report = Report::default();
        for device in devices.iter() {
            let Some(outcome) = self.process(device) else {
                continue;
            };
            match &outcome {
                Outcome::Found(record) => sink.found(record),
                Outcome::Failed(error) => sink.failed(error),
            }
            report.outcomes.push(outcome);
        }

        debug!(
            "Enumeration complete, {} device(s) reported, {} handle(s) open",
            report.outcomes.len(),
            self.handles.len()
        );
        Ok(report)
    }

    /// Returns None if the device is filtered out
    fn process(&mut self, device: &C::Device) -> Option<Outcome> {
        let id = device.id();
        trace!("Enumerator::process {id}");

        let descriptor = match device.descriptor() {
            Ok(descriptor) => descriptor,
            // A lenient run can't tell whether the device matches the
            // filter, so it is left out.  A hardened run still reports it.
            Err(cause) if self.config.lenient && self.config.filter.is_active() => {
                debug!("Skipping device {id}, descriptor unreadable with filter set: {cause}");
                return None;
            }
            Err(cause) => {
                return Some(self.failure(id, DeviceDescriptor::default(), Stage::Descriptor, cause))
            }
        };

        if !self.config.filter.matches(&descriptor) {
            trace!(
                "Skipping device {id} {:04x}:{:04x}",
                descriptor.vendor_id,
                descriptor.product_id
            );
            return None;
        }

        let handle = match device.open() {
            Ok(handle) => handle,
            Err(cause) => return Some(self.failure(id, descriptor, Stage::Open, cause)),
        };

        let serial = match descriptor.serial_number_index {
            Some(index) => handle.string_descriptor_ascii(index),
            None => Err(Error::NoStringIndex),
        };
        self.handles.push(handle);

        Some(match serial {
            Ok(serial_number) => Outcome::Found(SerialRecord {
                device: id,
                vendor_id: descriptor.vendor_id,
                product_id: descriptor.product_id,
                serial_number,
            }),
            Err(cause) => self.failure(id, descriptor, Stage::SerialNumber, cause),
        })
    }

    fn failure(
        &self,
        id: DeviceId,
        descriptor: DeviceDescriptor,
        stage: Stage,
        cause: Error,
    ) -> Outcome {
        let error = DeviceError::new(id, stage, cause);
        if self.config.lenient {
            debug!("Ignoring: {error}");
            Outcome::Found(SerialRecord {
                device: id,
                vendor_id: descriptor.vendor_id,
                product_id: descriptor.product_id,
                serial_number: String::new(),
            })
        } else {
            Outcome::Failed(error)
        }
    }
}

impl<C: Context> Drop for Enumerator<C> {
    fn drop(&mut self) {
        trace!("Enumerator::drop {} handle(s)", self.handles.len());
        while let Some(handle) = self.handles.pop() {
            drop(handle);
        }
        // context is released when the fields are dropped, after this
    }
}

/// A builder pattern for creating [`Enumerator`] instances.
///
/// ```no_run
/// use usb_sn::EnumeratorBuilder;
///
/// let enumerator = EnumeratorBuilder::new()
///     .vendor_id(0x16d0)
///     .lenient(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct EnumeratorBuilder {
    usb_context: Option<rusb::Context>,
    usb_log_level: Option<rusb::LogLevel>,
    config: EnumeratorConfig,
}

impl EnumeratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom libusb context.
    ///
    /// # Note:
    /// If not set, a new [`rusb::Context`] is created by [`Self::build`]
    pub fn context(&mut self, context: rusb::Context) -> &mut Self {
        self.usb_context = Some(context);
        self
    }

    /// Sets libusb's log level for a context created by [`Self::build`].
    /// Defaults to `rusb::LogLevel::Info`.
    pub fn usb_log_level(&mut self, level: rusb::LogLevel) -> &mut Self {
        self.usb_log_level = Some(level);
        self
    }

    pub fn vendor_id(&mut self, vendor_id: u16) -> &mut Self {
        self.config.filter.vendor_id = Some(vendor_id);
        self
    }

    pub fn product_id(&mut self, product_id: u16) -> &mut Self {
        self.config.filter.product_id = Some(product_id);
        self
    }

    pub fn lenient(&mut self, lenient: bool) -> &mut Self {
        self.config.lenient = lenient;
        self
    }

    /// Acquires the libusb context and builds the [`Enumerator`].
    ///
    /// # Returns
    /// * `Ok(Enumerator)` - Ready to [`Enumerator::run`]
    /// * `Err(Error::ContextUnavailable)` - libusb could not be initialized
    pub fn build(&mut self) -> Result<Enumerator<UsbContext>, Error> {
        let mut usb_config = UsbContextConfig {
            context: self.usb_context.take(),
            ..Default::default()
        };
        if let Some(level) = self.usb_log_level.take() {
            usb_config.log_level = level;
        }
        let context = UsbContext::new(Some(usb_config))?;
        Ok(self.build_with(context))
    }

    /// Builds the [`Enumerator`] around an existing backend context
    pub fn build_with<C: Context>(&self, context: C) -> Enumerator<C> {
        Enumerator::new(context, self.config)
    }
}

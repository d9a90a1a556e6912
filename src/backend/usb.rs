//! libusb implementation of the backend traits, via [`rusb`]
use super::{Context, Device, DeviceDescriptor, DeviceId, Handle};
use crate::Error;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use rusb::UsbContext as _;

/// Configuration for creating a [`UsbContext`]
pub struct UsbContextConfig {
    /// The [`rusb::Context`] to use.  May be None to create a new one.
    pub context: Option<rusb::Context>,

    /// libusb's own log level, applied only to a context created here.
    pub log_level: rusb::LogLevel,
}

impl std::fmt::Debug for UsbContextConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let log_level = match self.log_level {
            rusb::LogLevel::None => "None",
            rusb::LogLevel::Error => "Error",
            rusb::LogLevel::Warning => "Warning",
            rusb::LogLevel::Info => "Info",
            rusb::LogLevel::Debug => "Debug",
        };
        f.debug_struct("UsbContextConfig")
            .field("context", &self.context)
            .field("log_level", &log_level)
            .finish()
    }
}

impl Default for UsbContextConfig {
    fn default() -> Self {
        UsbContextConfig {
            context: None,
            log_level: rusb::LogLevel::Info,
        }
    }
}

/// The libusb context.  Dropping it releases libusb.
#[derive(Debug)]
pub struct UsbContext {
    context: rusb::Context,
}

impl UsbContext {
    /// Creates a new UsbContext using the provided config, which can be
    /// omitted in order to create one using default configuration.
    ///
    /// # Returns
    /// * `Ok(UsbContext)` - Successfully acquired the context
    /// * `Err(Error::ContextUnavailable)` - If libusb could not be initialized
    pub fn new(config: Option<UsbContextConfig>) -> Result<Self, Error> {
        trace!("UsbContext::new");
        let config = config.unwrap_or_default();
        trace!("UsbContext::new config {config:?}");

        let context = match config.context {
            Some(ctx) => ctx,
            None => {
                let mut ctx = rusb::Context::new().map_err(|e| {
                    warn!("Failed to create libusb context: {e}");
                    Error::ContextUnavailable {
                        message: e.to_string(),
                    }
                })?;
                ctx.set_log_level(config.log_level);
                ctx
            }
        };

        Ok(Self { context })
    }
}

impl Context for UsbContext {
    type Device = UsbDevice;

    fn devices(&self) -> Result<Vec<Self::Device>, Error> {
        trace!("UsbContext::devices");
        let devices: Vec<UsbDevice> = self
            .context
            .devices()?
            .iter()
            .map(|device| UsbDevice { device })
            .collect();
        debug!("libusb returned {} device(s)", devices.len());
        Ok(devices)
    }
}

impl Drop for UsbContext {
    fn drop(&mut self) {
        trace!("UsbContext::drop");
    }
}

/// A device from libusb's device list
#[derive(Debug)]
pub struct UsbDevice {
    device: rusb::Device<rusb::Context>,
}

impl Device for UsbDevice {
    type Handle = UsbHandle;

    fn id(&self) -> DeviceId {
        DeviceId::new(self.device.bus_number(), self.device.address())
    }

    fn descriptor(&self) -> Result<DeviceDescriptor, Error> {
        trace!("UsbDevice::descriptor {}", self.id());
        let desc = self.device.device_descriptor()?;
        trace!(
            "Found USB device {:04x}:{:04x}",
            desc.vendor_id(),
            desc.product_id()
        );
        Ok(DeviceDescriptor {
            vendor_id: desc.vendor_id(),
            product_id: desc.product_id(),
            serial_number_index: desc.serial_number_string_index(),
        })
    }

    fn open(&self) -> Result<Self::Handle, Error> {
        let id = self.id();
        trace!("UsbDevice::open {id}");
        let handle = self.device.open()?;
        Ok(UsbHandle { handle, id })
    }
}

/// An open libusb device handle.  Dropping it closes the handle.
#[derive(Debug)]
pub struct UsbHandle {
    handle: rusb::DeviceHandle<rusb::Context>,
    id: DeviceId,
}

impl Handle for UsbHandle {
    fn string_descriptor_ascii(&self, index: u8) -> Result<String, Error> {
        trace!("UsbHandle::string_descriptor_ascii {} index {index}", self.id);
        self.handle
            .read_string_descriptor_ascii(index)
            .map_err(|e| e.into())
    }
}

impl Drop for UsbHandle {
    fn drop(&mut self) {
        trace!("UsbHandle::drop {}", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UsbContextConfig::default();
        assert!(config.context.is_none());
        assert_eq!(
            format!("{config:?}"),
            "UsbContextConfig { context: None, log_level: \"Info\" }"
        );
    }
}

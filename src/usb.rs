//! libusb-backed transport and device discovery.
//!
//! Requires the `usb` feature. Discovery scans the bus for the Ocean
//! Optics vendor ID, matches product IDs against the profile registry and
//! hands back a ready [`Spectrometer`]. The core protocol code never
//! calls into this module; it only sees the [`Transport`] impl.

use std::time::Duration;

use rusb::{Context, Device, DeviceHandle, UsbContext};
use tracing::{debug, warn};

use crate::error::{Result, SpectroError, TransportError};
use crate::profile::{self, DeviceProfile, OCEAN_OPTICS_VENDOR_ID};
use crate::spectrometer::Spectrometer;
use crate::transport::Transport;

/// Default timeout for bulk transfers.
const USB_TIMEOUT: Duration = Duration::from_secs(2);

impl From<rusb::Error> for TransportError {
    fn from(err: rusb::Error) -> Self {
        match err {
            rusb::Error::Timeout => TransportError::Timeout,
            rusb::Error::Pipe => TransportError::Stall,
            rusb::Error::NoDevice | rusb::Error::NotFound => TransportError::Disconnected,
            other => TransportError::Io(other.to_string()),
        }
    }
}

/// Bulk transport over a claimed libusb device handle.
pub struct UsbTransport {
    handle: DeviceHandle<Context>,
    timeout: Duration,
}

impl UsbTransport {
    /// Wrap an already-claimed handle with the default timeout.
    pub fn new(handle: DeviceHandle<Context>) -> Self {
        Self {
            handle,
            timeout: USB_TIMEOUT,
        }
    }

    /// Override the transfer timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Transport for UsbTransport {
    fn send(&mut self, endpoint: u8, bytes: &[u8]) -> std::result::Result<(), TransportError> {
        let written = self.handle.write_bulk(endpoint, bytes, self.timeout)?;
        if written != bytes.len() {
            return Err(TransportError::Io(format!(
                "short bulk write: {written} of {} bytes",
                bytes.len()
            )));
        }
        Ok(())
    }

    fn receive(
        &mut self,
        endpoint: u8,
        max_len: usize,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; max_len];
        let read = self.handle.read_bulk(endpoint, &mut buf, self.timeout)?;
        buf.truncate(read);
        Ok(buf)
    }
}

/// Open the first supported spectrometer on the bus.
///
/// Fails with [`SpectroError::DeviceNotFound`] when no vendor device with
/// a registered product ID is attached.
pub fn open_first() -> Result<Spectrometer<UsbTransport>> {
    let context = Context::new().map_err(TransportError::from)?;
    let devices = context.devices().map_err(TransportError::from)?;

    for device in devices.iter() {
        let Ok(descriptor) = device.device_descriptor() else {
            continue;
        };
        if descriptor.vendor_id() != OCEAN_OPTICS_VENDOR_ID {
            continue;
        }

        let product_id = descriptor.product_id();
        match profile::lookup(product_id) {
            Ok(profile) => {
                debug!(
                    model = profile.model_name,
                    product_id = format_args!("0x{product_id:04X}"),
                    "found supported spectrometer"
                );
                let handle = open_device(&device)?;
                return Ok(Spectrometer::new(UsbTransport::new(handle), profile));
            }
            Err(_) => {
                warn!(
                    product_id = format_args!("0x{product_id:04X}"),
                    "vendor device with unregistered product id, skipping"
                );
            }
        }
    }

    Err(SpectroError::DeviceNotFound)
}

/// List attached vendor devices, one line per device.
///
/// Unregistered product IDs are listed too, marked as unknown.
pub fn list_devices() -> Result<Vec<String>> {
    let context = Context::new().map_err(TransportError::from)?;
    let devices = context.devices().map_err(TransportError::from)?;
    let mut lines = Vec::new();

    for device in devices.iter() {
        let Ok(descriptor) = device.device_descriptor() else {
            continue;
        };
        if descriptor.vendor_id() != OCEAN_OPTICS_VENDOR_ID {
            continue;
        }

        let product_id = descriptor.product_id();
        let model = profile::lookup(product_id)
            .map(|profile: &DeviceProfile| profile.model_name)
            .unwrap_or("(unknown model)");
        lines.push(format!(
            "Bus {:03} Device {:03}: 0x{product_id:04X} {model}",
            device.bus_number(),
            device.address(),
        ));
    }

    Ok(lines)
}

/// Open, configure and claim a device.
fn open_device(device: &Device<Context>) -> Result<DeviceHandle<Context>> {
    let handle = device.open().map_err(TransportError::from)?;

    #[cfg(target_os = "linux")]
    {
        if handle.kernel_driver_active(0).unwrap_or(false) {
            debug!("detaching kernel driver from interface 0");
            if let Err(e) = handle.detach_kernel_driver(0) {
                warn!("failed to detach kernel driver: {e}");
            }
        }
    }

    // Some devices are already configured; that is not a failure.
    if let Err(e) = handle.set_active_configuration(1) {
        debug!("set_active_configuration: {e}");
    }

    handle.claim_interface(0).map_err(TransportError::from)?;

    Ok(handle)
}

//! Protocol driver for Ocean Optics USB bench spectrometers.
//!
//! This crate speaks the small binary command/response protocol these
//! instruments expose over USB bulk endpoints: profile lookup for the
//! supported models, command encoding and response decoding, calibration
//! readout and the spectrum-acquisition framing.
//!
//! The protocol layer is transport-agnostic: it drives anything
//! implementing [`transport::Transport`]. The `usb` feature (default)
//! provides a libusb-backed transport plus device discovery.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use ocean_spectro::{usb, Acquisition};
//!
//! fn main() -> ocean_spectro::Result<()> {
//!     let mut spectrometer = usb::open_first()?;
//!     spectrometer.init()?;
//!     spectrometer.set_integration_time(Duration::from_millis(100))?;
//!
//!     loop {
//!         match spectrometer.request_spectrum()? {
//!             Acquisition::Spectrum(pixels) => {
//!                 println!("peak: {}", pixels.iter().max().unwrap_or(&0));
//!                 break;
//!             }
//!             // Transient rejects are normal; just ask again.
//!             Acquisition::Rejected(_) => continue,
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod calibration;
pub mod error;
pub mod profile;
pub mod protocol;
pub mod spectrometer;
pub mod transport;
#[cfg(feature = "usb")]
pub mod usb;

pub use calibration::{Calibration, InfoValue};
pub use error::{Result, SpectroError, TransportError};
pub use profile::{DeviceProfile, OCEAN_OPTICS_VENDOR_ID};
pub use protocol::{Acquisition, RejectReason, StatusSnapshot};
pub use spectrometer::Spectrometer;
pub use transport::{MockTransport, Transport};

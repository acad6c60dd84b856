//! The spectrometer driver: sequences command/response round trips.
//!
//! One [`Spectrometer`] owns one transport and the profile of the attached
//! model. Every operation is a single blocking send (plus at most one
//! read) on the endpoints the profile names. The driver never retries:
//! transport failures propagate unchanged, and a rejected spectrum packet
//! comes back as a value the caller can act on.

use std::time::Duration;

use tracing::debug;

use crate::error::{Result, SpectroError};
use crate::profile::DeviceProfile;
use crate::protocol::{self, Acquisition, StatusSnapshot, INFO_REPLY_LEN};
use crate::transport::Transport;

/// Driver for one attached spectrometer.
pub struct Spectrometer<T: Transport> {
    transport: T,
    profile: &'static DeviceProfile,
}

impl<T: Transport> Spectrometer<T> {
    /// Wrap a transport for the device described by `profile`.
    pub fn new(transport: T, profile: &'static DeviceProfile) -> Self {
        Self { transport, profile }
    }

    /// Profile of the attached model.
    pub fn profile(&self) -> &'static DeviceProfile {
        self.profile
    }

    /// Shared access to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Exclusive access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn command(&mut self, frame: &[u8]) -> Result<()> {
        self.transport
            .send(self.profile.command_out_endpoint, frame)?;
        Ok(())
    }

    fn query(&mut self, frame: &[u8], max_len: usize) -> Result<Vec<u8>> {
        self.command(frame)?;
        let reply = self.transport.receive(self.profile.data_in_endpoint, max_len)?;
        Ok(reply)
    }

    /// Initialize the device. No reply is expected.
    pub fn init(&mut self) -> Result<()> {
        debug!(model = self.profile.model_name, "initializing spectrometer");
        self.command(&protocol::init_frame())
    }

    /// Set the integration time.
    ///
    /// The wire format carries microseconds in 32 bits; a longer duration
    /// fails with [`SpectroError::IntegrationTimeOutOfRange`] before
    /// anything is sent.
    pub fn set_integration_time(&mut self, integration: Duration) -> Result<()> {
        let micros = integration.as_micros();
        let micros = u32::try_from(micros)
            .map_err(|_| SpectroError::IntegrationTimeOutOfRange(micros))?;
        debug!(micros, "setting integration time");
        self.command(&protocol::set_integration_time_frame(micros))
    }

    /// Write a device register. No reply is expected.
    pub fn write_register(&mut self, register: u8, value: u16) -> Result<()> {
        debug!(register, value, "writing register");
        self.command(&protocol::write_register_frame(register, value))
    }

    /// Query the device status snapshot.
    pub fn query_status(&mut self) -> Result<StatusSnapshot> {
        let reply = self.query(&protocol::query_status_frame(), INFO_REPLY_LEN)?;
        protocol::decode_status(&reply)
    }

    /// Query one information field, returning its validated byte run.
    ///
    /// See [`crate::calibration::info_address`] for the documented address
    /// catalogue, and [`Spectrometer::read_calibration`] for the full
    /// record.
    pub fn query_information(&mut self, address: u8) -> Result<Vec<u8>> {
        let reply = self.query(&protocol::query_information_frame(address), INFO_REPLY_LEN)?;
        protocol::decode_information(address, &reply)
    }

    /// Request and read one spectrum packet.
    ///
    /// Blocks for exactly one transport round trip: the request frame on
    /// the command endpoint, then a read of the profile's packet size from
    /// the spectrum endpoint. Packet validation failures come back as
    /// [`Acquisition::Rejected`]; re-requesting is the caller's decision.
    /// Each call is independent, so a live-preview loop just calls this
    /// repeatedly.
    pub fn request_spectrum(&mut self) -> Result<Acquisition> {
        self.command(&protocol::request_spectra_frame())?;
        let packet = self.transport.receive(
            self.profile.spectrum_in_endpoint,
            self.profile.spectrum_packet_size,
        )?;
        let outcome = protocol::decode_spectrum(&packet, self.profile.spectrum_packet_size);
        if let Acquisition::Rejected(reason) = &outcome {
            debug!(?reason, "spectrum packet rejected");
        }
        Ok(outcome)
    }
}

//! Calibration and configuration record assembled from information queries.
//!
//! The device stores its calibration as numbered information fields, each
//! an opaque byte run terminated by a zero byte on the wire. The protocol
//! layer's job ends at producing the trimmed run ([`InfoValue`]); how a
//! given field is read — UTF-8 text or a numeric string — is up to the
//! consumer, with [`InfoValue::as_text`] and [`InfoValue::as_f64`] doing
//! the common interpretations.

use std::time::Duration;

use tracing::debug;

use crate::error::{Result, SpectroError};
use crate::spectrometer::Spectrometer;
use crate::transport::Transport;

/// Documented information-field addresses.
pub mod info_address {
    /// Device serial number (text).
    pub const SERIAL_NUMBER: u8 = 0;
    /// First of four wavelength calibration coefficients (addresses 1..=4).
    pub const WAVELENGTH_COEFF_FIRST: u8 = 1;
    /// Stray light constant.
    pub const STRAY_LIGHT: u8 = 5;
    /// First of eight non-linearity coefficients (addresses 6..=13).
    pub const NONLINEARITY_COEFF_FIRST: u8 = 6;
    /// Polynomial order of the non-linearity correction.
    pub const POLYNOMIAL_ORDER: u8 = 14;
    /// Grating ID, filter wavelength and slit size (space-separated text).
    pub const GRATING_FILTER_SLIT: u8 = 15;
    /// Array coating/range, lens flag and CPLD version (text).
    pub const DETECTOR_INFO: u8 = 16;
}

/// One information field's validated byte run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoValue {
    raw: Vec<u8>,
}

impl InfoValue {
    fn new(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    /// The untouched bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Read the field as UTF-8 text.
    pub fn as_text(&self) -> Result<&str> {
        std::str::from_utf8(&self.raw)
            .map_err(|e| SpectroError::Malformed(format!("information field is not UTF-8: {e}")))
    }

    /// Read the field as a decimal number rendered as text.
    pub fn as_f64(&self) -> Result<f64> {
        let text = self.as_text()?;
        text.trim()
            .parse()
            .map_err(|_| SpectroError::Malformed(format!("not a numeric field: {text:?}")))
    }
}

/// Full calibration record, one [`InfoValue`] per documented field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calibration {
    /// Serial number.
    pub serial_number: InfoValue,
    /// Wavelength calibration polynomial coefficients.
    pub wavelength_coefficients: [InfoValue; 4],
    /// Stray light constant.
    pub stray_light_constant: InfoValue,
    /// Non-linearity correction coefficients.
    pub nonlinearity_coefficients: [InfoValue; 8],
    /// Polynomial order of the non-linearity correction.
    pub polynomial_order: InfoValue,
    /// Grating/filter/slit description.
    pub grating_filter_slit: InfoValue,
    /// Array coating, range, lens and CPLD description.
    pub detector_info: InfoValue,
}

/// Calibration and status readbacks built on the query operations.
impl<T: Transport> Spectrometer<T> {
    fn info_value(&mut self, address: u8) -> Result<InfoValue> {
        Ok(InfoValue::new(self.query_information(address)?))
    }

    fn info_block<const N: usize>(&mut self, first: u8) -> Result<[InfoValue; N]> {
        let mut values = Vec::with_capacity(N);
        for offset in 0..N as u8 {
            values.push(self.info_value(first + offset)?);
        }
        values
            .try_into()
            .map_err(|_| SpectroError::Malformed("information block size".into()))
    }

    /// Read the full calibration record from the device.
    ///
    /// Issues the fixed documented query sequence (addresses 0 through 16)
    /// and packages every field untouched. Nothing is cached: each call
    /// re-reads every field.
    pub fn read_calibration(&mut self) -> Result<Calibration> {
        debug!("reading calibration record");
        Ok(Calibration {
            serial_number: self.info_value(info_address::SERIAL_NUMBER)?,
            wavelength_coefficients: self.info_block(info_address::WAVELENGTH_COEFF_FIRST)?,
            stray_light_constant: self.info_value(info_address::STRAY_LIGHT)?,
            nonlinearity_coefficients: self.info_block(info_address::NONLINEARITY_COEFF_FIRST)?,
            polynomial_order: self.info_value(info_address::POLYNOMIAL_ORDER)?,
            grating_filter_slit: self.info_value(info_address::GRATING_FILTER_SLIT)?,
            detector_info: self.info_value(info_address::DETECTOR_INFO)?,
        })
    }

    /// Current integration time, read back from the status snapshot.
    pub fn integration_time(&mut self) -> Result<Duration> {
        let status = self.query_status()?;
        Ok(Duration::from_micros(u64::from(status.integration_time_us)))
    }
}
